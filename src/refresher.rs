//! Background refresh loop.
//!
//! One tokio task ticks immediately and then every `period`, running a full
//! refresh cycle per tick and publishing the result. It is the only writer of
//! the snapshot cache; readers never trigger upstream calls.

use crate::snapshot::{self, SnapshotCache, SnapshotPublisher};
use crate::snapshotter::Snapshotter;
use crate::story_fetcher::StoryFetcher;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);

pub struct Refresher<F> {
    snapshotter: Snapshotter<F>,
    period: Duration,
}

impl<F: StoryFetcher + 'static> Refresher<F> {
    pub fn new(fetcher: F, period: Duration) -> Self {
        Self {
            snapshotter: Snapshotter::new(fetcher),
            period,
        }
    }

    /// Start the refresh task. The first cycle begins right away.
    pub fn spawn(self) -> RefreshHandle {
        let (publisher, cache) = snapshot::channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(publisher, cancel.clone()));

        RefreshHandle {
            cache,
            cancel,
            task,
        }
    }

    async fn run(self, publisher: SnapshotPublisher, cancel: CancellationToken) {
        info!(period_secs = self.period.as_secs(), "Refresher started");

        // Ticks keep a fixed cadence. A cycle that overruns the period is
        // followed by exactly one catch-up cycle; the remaining missed ticks
        // are dropped.
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cycle: u64 = 0;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            cycle += 1;
            let span = info_span!("refresh", cycle);
            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(cycle, "Abandoning in-flight refresh");
                    break;
                }
                snapshot = self.snapshotter.refresh().instrument(span) => snapshot,
            };

            publisher.publish(snapshot);
        }

        info!("Refresher stopped");
    }
}

/// Owner of the background refresh task.
pub struct RefreshHandle {
    cache: SnapshotCache,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn cache(&self) -> SnapshotCache {
        self.cache.clone()
    }

    /// Stop ticking, abandon any in-flight cycle and wait for the task to
    /// exit. The fetcher and its connection pool are dropped with the task.
    /// The last published snapshot stays readable through existing caches.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Refresher task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story_fetcher::test_utils::FakeFetcher;

    const PERIOD: Duration = DEFAULT_REFRESH_INTERVAL;

    #[tokio::test(start_paused = true)]
    async fn must_wait_until_ready() {
        let fetcher = FakeFetcher::with_scores(&[1716, 1600, 1500]);
        let handle = Refresher::new(fetcher.clone(), PERIOD).spawn();
        let cache = handle.cache();

        assert!(cache.latest().is_none());
        cache.wait_until_ready().await.unwrap();

        let snapshot = cache.latest().unwrap();
        let scores: Vec<i64> = snapshot.stories().iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![1716, 1600, 1500]);
        assert_eq!(fetcher.list_calls(), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ready_even_when_best_stories_fails() {
        let fetcher = FakeFetcher::failing_list();
        let handle = Refresher::new(fetcher.clone(), PERIOD).spawn();
        let cache = handle.cache();

        cache.wait_until_ready().await.unwrap();

        assert!(cache.current().await.unwrap().is_empty());
        assert_eq!(fetcher.item_calls(), 0);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn reads_between_ticks_do_not_refetch() {
        let fetcher = FakeFetcher::with_scores(&[1716, 1600, 1500]);
        let handle = Refresher::new(fetcher.clone(), PERIOD).spawn();
        let cache = handle.cache();
        cache.wait_until_ready().await.unwrap();

        let first = cache.current().await.unwrap();
        time::advance(PERIOD / 2).await;
        let second = cache.current().await.unwrap();

        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.list_calls(), 1);
        assert_eq!(fetcher.item_calls(), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn must_refresh_after_period() {
        let fetcher = FakeFetcher::with_scores(&[1716, 1600, 1500]);
        let handle = Refresher::new(fetcher.clone(), PERIOD).spawn();
        let cache = handle.cache();
        cache.wait_until_ready().await.unwrap();
        let first = cache.current().await.unwrap();

        let mut updates = cache.subscribe();
        updates.changed().await.unwrap();

        assert_eq!(fetcher.list_calls(), 2);
        assert_eq!(fetcher.item_calls(), 6);
        let second = cache.current().await.unwrap();
        assert!(!std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 3);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_cycle_does_not_replay_missed_ticks() {
        let start = time::Instant::now();
        let fetcher = FakeFetcher::with_scores(&[1716]).slow_first_list(PERIOD * 5 / 2);
        let handle = Refresher::new(fetcher.clone(), PERIOD).spawn();
        let cache = handle.cache();

        // The first cycle finishes at 2.5 periods and is followed by one
        // catch-up cycle, not one per missed tick.
        time::sleep_until(start + PERIOD * 5 / 2 + Duration::from_secs(1)).await;
        assert!(cache.latest().is_some());
        assert_eq!(fetcher.list_calls(), 2);

        // The next one waits for the 3-period tick.
        time::sleep_until(start + PERIOD * 3 - Duration::from_secs(1)).await;
        assert_eq!(fetcher.list_calls(), 2);
        time::sleep_until(start + PERIOD * 3 + Duration::from_secs(1)).await;
        assert_eq!(fetcher.list_calls(), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_future_refreshes() {
        let fetcher = FakeFetcher::with_scores(&[1]);
        let handle = Refresher::new(fetcher.clone(), PERIOD).spawn();
        let cache = handle.cache();
        cache.wait_until_ready().await.unwrap();

        handle.shutdown().await;
        time::advance(PERIOD * 3).await;

        assert_eq!(fetcher.list_calls(), 1);
        assert_eq!(cache.current().await.unwrap().len(), 1);
    }
}
