//! HTTP API for reading the best stories snapshot.
//!
//! Framework-agnostic: accepts `ApiRequest`, returns `ApiResponse`.
//! The entry point in `src/main.rs` adapts axum types to/from these and
//! calls `handle`.

mod handlers;

use crate::snapshot::SnapshotCache;
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// Request / Response types
// ============================================================================

pub struct ApiRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Debug)]
pub enum ApiResponse {
    Json { status: u16, body: String },
    Text { status: u16, body: String },
}

impl ApiResponse {
    pub fn status(&self) -> u16 {
        match self {
            Self::Json { status, .. } | Self::Text { status, .. } => *status,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json { .. } => "application/json; charset=utf-8",
            Self::Text { .. } => "text/plain; charset=utf-8",
        }
    }

    pub fn into_body(self) -> String {
        match self {
            Self::Json { body, .. } | Self::Text { body, .. } => body,
        }
    }
}

// ============================================================================
// Application state
// ============================================================================

pub struct AppState {
    pub(crate) cache: SnapshotCache,
}

impl AppState {
    pub fn new(cache: SnapshotCache) -> Self {
        Self { cache }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

pub async fn handle(request: &ApiRequest, state: &Arc<AppState>) -> ApiResponse {
    let limit = request.query.get("limit").map(|s| s.as_str());

    match (
        request.method.as_str(),
        request.path.to_ascii_lowercase().trim_end_matches('/'),
    ) {
        ("GET", "/beststories") => handlers::best_stories_get(&state.cache, limit).await,
        _ => ApiResponse::Text {
            status: 404,
            body: "Not Found".to_string(),
        },
    }
}
