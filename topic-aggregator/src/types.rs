use std::time::Duration;

// Use the interfaces crate for the data model shared with the request layer
pub use interfaces::defs::{ContentItem, PlaybackMode, SourceConfig, TopicConfig, TopicItemsResult, TopicSummary};
pub use interfaces::defs::{LiveFeed, LiveItem, MediaRef, SocialConfig, SocialSourceConfig, SourcePayload};
pub use interfaces::defs::{ConfigProvider, ItemLookup, LookupError};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "topic-aggregator/0.1".to_string(),
            timeout_seconds: 12,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Failure of a single source. Never crosses the fan-out boundary: the
/// aggregators log it and carry on with the other sources.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Feed size exceeds limit: {size_mb}MB from {url}")]
    TooLarge { url: String, size_mb: usize },

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid options for source {source_id}: {reason}")]
    Options { source_id: String, reason: String },

    #[error("Source {source_id} timed out after {after:?}")]
    Timeout { source_id: String, after: Duration },
}

/// Request-level failures, surfaced to the caller unmodified.
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("Topic not found: {topic_id}")]
    TopicNotFound { topic_id: String },

    #[error("Item {item_id} not found in topic {topic_id}")]
    ItemNotFound { topic_id: String, item_id: String },

    #[error("Unsupported source: {source_id}")]
    UnsupportedSource { source_id: String },
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

pub type Result<T> = std::result::Result<T, AggregatorError>;
