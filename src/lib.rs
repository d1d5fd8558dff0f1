pub mod api;
pub mod config;
pub mod refresher;
pub mod snapshot;
pub mod snapshotter;
pub mod story_fetcher;
pub mod types;
