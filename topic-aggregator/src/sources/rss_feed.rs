use crate::fetcher::Fetcher;
use crate::parser::FeedParser;
use crate::traits::SourceAdapter;
use crate::types::{ContentItem, FetchResult, SourceConfig};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Generic RSS/Atom feed adapter
pub struct RssFeedAdapter {
    fetcher: Arc<Fetcher>,
}

impl RssFeedAdapter {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SourceAdapter for RssFeedAdapter {
    fn adapter_name(&self) -> &'static str {
        "rss"
    }

    async fn fetch(
        &self,
        topic_id: &str,
        source: &SourceConfig,
        max_items: usize,
    ) -> FetchResult<Vec<ContentItem>> {
        debug!(topic_id, source_id = %source.source_id, url = %source.url, "Pulling feed");

        let content = self.fetcher.fetch_text(&source.url).await?;
        let items = FeedParser::parse_items(&content, topic_id, source, max_items)?;

        info!(
            "Successfully pulled {} items from feed {} ({})",
            items.len(),
            source.source_id,
            source.url
        );
        Ok(items)
    }
}
