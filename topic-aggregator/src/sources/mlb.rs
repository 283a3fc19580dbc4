use crate::fetcher::Fetcher;
use crate::sources::RssFeedAdapter;
use crate::traits::SourceAdapter;
use crate::types::{ContentItem, FetchResult, PlaybackMode, SourceConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// MLB team/league news feeds
pub struct MlbAdapter {
    inner: RssFeedAdapter,
}

impl MlbAdapter {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self {
            inner: RssFeedAdapter::new(fetcher),
        }
    }
}

#[async_trait]
impl SourceAdapter for MlbAdapter {
    fn adapter_name(&self) -> &'static str {
        "mlb"
    }

    async fn fetch(
        &self,
        topic_id: &str,
        source: &SourceConfig,
        max_items: usize,
    ) -> FetchResult<Vec<ContentItem>> {
        // Delegate to the inner RSS adapter
        let items = self.inner.fetch(topic_id, source, max_items).await?;

        Ok(items
            .into_iter()
            .map(|item| ContentItem {
                supported_playback_modes: vec![PlaybackMode::FullPage, PlaybackMode::Summary],
                ..item
            })
            .collect())
    }
}
