//! The published "best stories" snapshot and the cache that serves it.
//!
//! A single [`SnapshotPublisher`] (owned by the refresher task) replaces the
//! current snapshot wholesale; any number of [`SnapshotCache`] clones read it.
//! Readers hold an `Arc<Snapshot>`, so a publish never touches data a reader
//! is still looking at.

use crate::types::StoryDetails;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    stories: Vec<StoryDetails>,
    refreshed_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Self {
            stories: Vec::new(),
            refreshed_at: Utc::now(),
        }
    }

    /// Stories sorted by score, highest first.
    pub fn stories(&self) -> &[StoryDetails] {
        &self.stories
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// The first `limit` stories. Absent or non-positive limits return everything.
    pub fn take(&self, limit: Option<i64>) -> &[StoryDetails] {
        match limit {
            Some(n) if n > 0 => {
                let n = usize::try_from(n).unwrap_or(usize::MAX);
                &self.stories[..n.min(self.stories.len())]
            }
            _ => &self.stories,
        }
    }
}

/// Drop missing stories and order the rest by score descending.
///
/// The sort is stable, so ties keep their upstream rank order.
pub fn assemble(results: Vec<Option<StoryDetails>>) -> Snapshot {
    let mut stories: Vec<StoryDetails> = results.into_iter().flatten().collect();
    stories.sort_by(|a, b| b.score.cmp(&a.score));

    Snapshot {
        stories,
        refreshed_at: Utc::now(),
    }
}

// ============================================================================
// Publisher / cache
// ============================================================================

/// Create the single-writer publisher and its first reader handle.
pub fn channel() -> (SnapshotPublisher, SnapshotCache) {
    let (tx, rx) = watch::channel(None);
    (SnapshotPublisher { tx }, SnapshotCache { rx })
}

#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<Arc<Snapshot>>>,
}

impl SnapshotPublisher {
    /// Replace the current snapshot and wake every waiter.
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(Some(Arc::new(snapshot)));
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    rx: watch::Receiver<Option<Arc<Snapshot>>>,
}

impl SnapshotCache {
    /// The latest snapshot, or `None` before the first refresh completed.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().clone()
    }

    /// Resolves once the first snapshot has been published, immediately
    /// thereafter. Fails if the publisher went away without publishing.
    pub async fn wait_until_ready(&self) -> Result<()> {
        self.current().await.map(|_| ())
    }

    /// The latest snapshot, waiting for the first one if necessary.
    pub async fn current(&self) -> Result<Arc<Snapshot>> {
        let mut rx = self.rx.clone();
        let snapshot = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| anyhow!("Snapshot publisher closed before the first refresh"))?
            .clone();

        snapshot.ok_or_else(|| anyhow!("Snapshot missing after readiness"))
    }

    /// A receiver that is notified on every publish after this call.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        let mut rx = self.rx.clone();
        rx.mark_unchanged();
        rx
    }
}
