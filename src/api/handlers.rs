use super::ApiResponse;
use crate::snapshot::SnapshotCache;
use tracing::{error, info, warn};

fn json(status: u16, body: &str) -> ApiResponse {
    ApiResponse::Json {
        status,
        body: body.to_string(),
    }
}

/// GET /beststories?limit=...
///
/// Serves the current snapshot, truncated to `limit` when it is positive.
pub(super) async fn best_stories_get(cache: &SnapshotCache, limit: Option<&str>) -> ApiResponse {
    let limit = match limit.map(|raw| raw.trim().parse::<i64>()).transpose() {
        Ok(limit) => limit,
        Err(e) => {
            warn!(error = %e, "Invalid limit parameter");
            return json(400, r#"{"error": "limit must be an integer"}"#);
        }
    };

    let snapshot = match cache.current().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "No snapshot available");
            return json(500, r#"{"error": "Internal server error"}"#);
        }
    };

    let stories = snapshot.take(limit);
    match serde_json::to_string(stories) {
        Ok(body) => {
            info!(count = stories.len(), ?limit, "Serving best stories");
            json(200, &body)
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize stories");
            json(500, r#"{"error": "Internal server error"}"#)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
