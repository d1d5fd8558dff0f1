use crate::snapshot::{self, Snapshot};
use crate::story_fetcher::StoryFetcher;
use crate::types::{StoryDetails, StoryId};
use futures::future::join_all;
use tracing::{error, info, warn};

/// Runs one refresh cycle against a [`StoryFetcher`]. Upstream errors are
/// logged and absorbed here; a cycle always yields a snapshot.
pub struct Snapshotter<F> {
    fetcher: F,
}

impl<F: StoryFetcher> Snapshotter<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    pub async fn refresh(&self) -> Snapshot {
        info!("Refreshing cache");

        let ids = self.best_story_ids().await;
        info!(count = ids.len(), "Got best stories");

        let results = self.story_details(&ids).await;
        info!("Story details requests completed");

        let snapshot = snapshot::assemble(results);
        info!(
            stories = snapshot.len(),
            missing = ids.len() - snapshot.len(),
            refreshed_at = %snapshot.refreshed_at(),
            "All story details updated"
        );
        snapshot
    }

    /// Ranked ids, or an empty list if the upstream call failed.
    pub async fn best_story_ids(&self) -> Vec<StoryId> {
        match self.fetcher.best_story_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "Error when getting best stories");
                Vec::new()
            }
        }
    }

    /// Fetch every id concurrently. Each slot is `None` if that story could
    /// not be resolved; one failure never affects the others.
    pub async fn story_details(&self, ids: &[StoryId]) -> Vec<Option<StoryDetails>> {
        if ids.is_empty() {
            return Vec::new();
        }

        join_all(ids.iter().map(|&id| self.story(id))).await
    }

    async fn story(&self, id: StoryId) -> Option<StoryDetails> {
        match self.fetcher.story(id).await {
            Ok(Some(story)) => Some(story),
            Ok(None) => {
                warn!(id, "Story has no details");
                None
            }
            Err(e) => {
                error!(error = %e, id, "Error when processing story");
                None
            }
        }
    }
}
