use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type StoryId = u64;

/// An item as returned by `/v0/item/{id}.json`.
///
/// Every field may be missing (e.g. Ask HN posts carry no `url`); absent
/// fields decode to empty values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HnItem {
    #[serde(default)]
    pub id: StoryId,
    #[serde(default)]
    pub by: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub descendants: i64,
}

/// A resolved story as served to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryDetails {
    pub title: String,
    #[serde(rename = "uri")]
    pub url: String,
    #[serde(rename = "postedBy")]
    pub author: String,
    #[serde(rename = "time")]
    pub posted_at: DateTime<Utc>,
    pub score: i64,
    #[serde(rename = "commentCount")]
    pub comment_count: i64,
}

impl StoryDetails {
    /// Returns `None` if the item's epoch seconds are out of range.
    pub fn from_item(item: HnItem) -> Option<Self> {
        let posted_at = DateTime::from_timestamp(item.time, 0)?;
        Some(Self {
            title: item.title,
            url: item.url,
            author: item.by,
            posted_at,
            score: item.score,
            comment_count: item.descendants,
        })
    }
}
