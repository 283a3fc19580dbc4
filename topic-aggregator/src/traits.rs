use crate::types::{ContentItem, FetchResult, LiveItem, SocialSourceConfig, SourceConfig};
use async_trait::async_trait;

/// Trait for pulling topic content from one kind of source (RSS feeds, APIs, etc.)
///
/// Implementations are stateless: the same instance serves every source of
/// its type, concurrently. Zero entries is a successful, empty fetch.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Registry tag this adapter is normally registered under
    fn adapter_name(&self) -> &'static str;

    /// Fetch up to `max_items` items from `source` for `topic_id`
    async fn fetch(
        &self,
        topic_id: &str,
        source: &SourceConfig,
        max_items: usize,
    ) -> FetchResult<Vec<ContentItem>>;
}

/// Trait for pulling posts from a social platform
#[async_trait]
pub trait SocialAdapter: Send + Sync {
    fn adapter_name(&self) -> &'static str;

    /// Fetch the latest posts for one configured social source. Platform
    /// options come from `source.options`.
    async fn fetch(&self, source: &SocialSourceConfig) -> FetchResult<Vec<LiveItem>>;
}
