//! Best stories service.
//!
//! Keeps an in-memory snapshot of Hacker News best stories, refreshed in the
//! background, and serves it over HTTP. HTTP concerns (axum extraction,
//! response building, shutdown) live here; routing and handlers are in the
//! `api` module.

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use hnbest::api::{self, ApiRequest, ApiResponse, AppState};
use hnbest::config::Config;
use hnbest::refresher::Refresher;
use hnbest::story_fetcher::HackerNewsFetcher;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    info!(
        api_base_url = %config.api_base_url,
        refresh_interval_secs = config.refresh_interval.as_secs(),
        bind_addr = %config.bind_addr,
        "Starting best stories service"
    );

    let fetcher = HackerNewsFetcher::new(config.api_base_url.clone());
    let refresher = Refresher::new(fetcher, config.refresh_interval).spawn();
    let cache = refresher.cache();

    info!("Waiting for the first snapshot...");
    cache.wait_until_ready().await?;
    info!("Snapshot ready");

    let state = Arc::new(AppState::new(cache));
    let app = Router::new().fallback(dispatch).with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    refresher.shutdown().await;
    served.context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    info!(method = %method, path = %uri.path(), "Handling request");

    let request = ApiRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
    };
    into_http(api::handle(&request, &state).await)
}

fn into_http(resp: ApiResponse) -> Response {
    let status = StatusCode::from_u16(resp.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = resp.content_type();
    (status, [(header::CONTENT_TYPE, content_type)], resp.into_body()).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
