pub mod aggregator;
pub mod bluesky;
pub mod hackernews;
pub mod mastodon;
pub mod reddit;

pub use aggregator::SocialAggregator;
pub use bluesky::{BlueskyApiAdapter, BlueskyLinksAdapter};
pub use hackernews::HackerNewsAdapter;
pub use mastodon::MastodonAdapter;
pub use reddit::RedditAdapter;

use crate::types::{FetchError, FetchResult, LiveItem, MediaRef, SocialSourceConfig};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const TITLE_SHORT_CHARS: usize = 120;
pub const TITLE_LONG_CHARS: usize = 180;
pub const TEXT_CHARS: usize = 320;

/// Decode the platform-specific part of a social source definition.
pub(crate) fn decode_options<T: DeserializeOwned>(source: &SocialSourceConfig) -> FetchResult<T> {
    serde_json::from_value(Value::Object(source.options.clone())).map_err(|e| FetchError::Options {
        source_id: source.source_id.clone(),
        reason: e.to_string(),
    })
}

/// Trimmed, non-empty entries of a configured list, at most `max` of them.
pub(crate) fn take_configured(values: &[String], max: usize) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .take(max)
        .map(str::to_string)
        .collect()
}

/// One normalized post before it is stamped with its source.
pub(crate) struct Post {
    pub raw_id: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub text: String,
    pub author: String,
    pub url: String,
    pub image: Option<String>,
}

impl Post {
    pub fn into_live_item(self, source: &SocialSourceConfig) -> LiveItem {
        LiveItem {
            id: format!("{}:{}", source.source_id, self.raw_id),
            source: source.source_id.clone(),
            topic: source.topic.clone(),
            timestamp: self.timestamp,
            raw_id: self.raw_id,
            title: self.title,
            text: self.text,
            author: self.author,
            url: self.url,
            media: self.image.into_iter().map(MediaRef::image).collect(),
        }
    }
}
