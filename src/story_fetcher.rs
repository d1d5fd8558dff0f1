use crate::types::{HnItem, StoryDetails, StoryId};
use anyhow::{Context, Result};
use reqwest::Client;
use std::future::Future;

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

// ============================================================================
// StoryFetcher trait
// ============================================================================

pub trait StoryFetcher: Send + Sync {
    /// Fetch the ranked ids from the "best stories" endpoint.
    fn best_story_ids(&self) -> impl Future<Output = Result<Vec<StoryId>>> + Send;

    /// Fetch a single story. `Ok(None)` means the API answered `null`.
    fn story(&self, id: StoryId) -> impl Future<Output = Result<Option<StoryDetails>>> + Send;
}

// ============================================================================
// HackerNewsFetcher — HN Firebase API implementation
// ============================================================================

pub struct HackerNewsFetcher {
    client: Client,
    base_url: String,
}

impl Default for HackerNewsFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl HackerNewsFetcher {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn best_stories_url(&self) -> String {
        format!("{}/beststories.json", self.base_url)
    }

    fn item_url(&self, id: StoryId) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }
}

impl StoryFetcher for HackerNewsFetcher {
    async fn best_story_ids(&self) -> Result<Vec<StoryId>> {
        let ids = self
            .client
            .get(self.best_stories_url())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<StoryId>>()
            .await
            .context("Failed to decode best stories")?;

        Ok(ids)
    }

    async fn story(&self, id: StoryId) -> Result<Option<StoryDetails>> {
        let item = self
            .client
            .get(self.item_url(id))
            .send()
            .await?
            .error_for_status()?
            .json::<Option<HnItem>>()
            .await
            .with_context(|| format!("Failed to decode item {}", id))?;

        Ok(item.and_then(StoryDetails::from_item))
    }
}

// ============================================================================
// Test utilities
// ============================================================================


// ============================================================================
// Tests — against an in-process stub of the HN API
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;

    async fn serve_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/v0", addr)
    }

    fn stub_router() -> Router {
        Router::new()
            .route("/v0/beststories.json", get(|| async { "[0,1,2]" }))
            .route(
                "/v0/item/0.json",
                get(|| async { r#"{"id":0,"by":"ismaildonmez","score":1716,"time":1175714200,"descendants":588}"# }),
            )
            .route(
                "/v0/item/1.json",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/v0/item/2.json", get(|| async { "{not json" }))
            .route("/v0/item/3.json", get(|| async { "null" }))
    }

    #[tokio::test]
    async fn fetches_best_story_ids() {
        let fetcher = HackerNewsFetcher::new(serve_stub(stub_router()).await);
        assert_eq!(fetcher.best_story_ids().await.unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn best_story_ids_non_success_is_error() {
        let router = Router::new().route(
            "/v0/beststories.json",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let fetcher = HackerNewsFetcher::new(serve_stub(router).await);
        assert!(fetcher.best_story_ids().await.is_err());
    }

    #[tokio::test]
    async fn fetches_story_details() {
        let fetcher = HackerNewsFetcher::new(serve_stub(stub_router()).await);
        let story = fetcher.story(0).await.unwrap().unwrap();
        assert_eq!(story.score, 1716);
        assert_eq!(story.author, "ismaildonmez");
        assert_eq!(story.comment_count, 588);
        assert_eq!(story.posted_at.timestamp(), 1175714200);
    }

    #[tokio::test]
    async fn story_failures_are_errors_and_null_is_none() {
        let fetcher = HackerNewsFetcher::new(serve_stub(stub_router()).await);
        assert!(fetcher.story(1).await.is_err());
        assert!(fetcher.story(2).await.is_err());
        assert!(fetcher.story(3).await.unwrap().is_none());
        assert!(fetcher.story(4).await.is_err());
    }

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        let fetcher = HackerNewsFetcher::new("http://localhost/v0/");
        assert_eq!(fetcher.item_url(7), "http://localhost/v0/item/7.json");
        assert_eq!(
            fetcher.best_stories_url(),
            "http://localhost/v0/beststories.json"
        );
    }
}
