use crate::cache::TtlCache;
use crate::registry::SocialRegistry;
use crate::types::{
    AggregatorError, ConfigProvider, FetchError, LiveFeed, LiveItem, Result, SocialSourceConfig, SourcePayload,
};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_SOCIAL_TIMEOUT: Duration = Duration::from_secs(8);

/// Live social feed: one cached payload per social source, plus an
/// interleaved view over all of them.
pub struct SocialAggregator {
    config: Arc<dyn ConfigProvider>,
    registry: Arc<SocialRegistry>,
    cache: TtlCache<String, SourcePayload>,
    source_timeout: Duration,
}

impl SocialAggregator {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        registry: Arc<SocialRegistry>,
        cache: TtlCache<String, SourcePayload>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            config,
            registry,
            cache,
            source_timeout,
        }
    }

    /// Ids of the enabled social sources, in configuration order
    pub fn supported_sources(&self) -> Vec<String> {
        self.enabled_sources().into_iter().map(|s| s.source_id).collect()
    }

    pub async fn fetch_source(&self, source_id: &str, force: bool) -> Result<SourcePayload> {
        let source = self
            .enabled_sources()
            .into_iter()
            .find(|s| s.source_id == source_id)
            .ok_or_else(|| AggregatorError::UnsupportedSource {
                source_id: source_id.to_string(),
            })?;
        Ok(self.refresh_source(&source, force).await)
    }

    pub async fn fetch_all(&self, force: bool) -> LiveFeed {
        let social = self.config.social();
        let updated_at = Utc::now();
        let sources: Vec<SocialSourceConfig> = social.sources.into_iter().filter(|s| s.enabled).collect();

        let payloads = join_all(sources.iter().map(|source| self.refresh_source(source, force))).await;

        let mut items: Vec<LiveItem> = payloads.iter().flat_map(|p| p.items.iter().cloned()).collect();
        sort_newest_first(&mut items);
        items.truncate(social.interleaved_limit);

        info!(sources = payloads.len(), items = items.len(), "Live feed assembled");
        LiveFeed {
            updated_at,
            refresh_interval_seconds: social.refresh_interval_seconds,
            items,
            sources: payloads,
        }
    }

    async fn refresh_source(&self, source: &SocialSourceConfig, force: bool) -> SourcePayload {
        if let Some(cached) = self.cache.get(&source.source_id, force).await {
            debug!(source_id = %source.source_id, "Social cache hit");
            return cached;
        }

        let updated_at = Utc::now();
        let (items, error) = match self.fetch_items(source).await {
            Ok(items) => (items, None),
            Err(e) => {
                warn!(source_id = %source.source_id, error = %e, "Live source fetch failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        let mut items = dedupe_last_wins(items);
        sort_newest_first(&mut items);
        items.truncate(source.max_items);

        let payload = SourcePayload {
            source_id: source.source_id.clone(),
            name: source.display_name(),
            icon: source.display_icon(),
            updated_at,
            items,
            error,
        };
        self.cache.put(source.source_id.clone(), payload.clone()).await;
        payload
    }

    async fn fetch_items(&self, source: &SocialSourceConfig) -> std::result::Result<Vec<LiveItem>, FetchError> {
        let tag = source.adapter.to_lowercase();
        let Some(adapter) = self.registry.get_adapter(&tag) else {
            debug!(source_id = %source.source_id, adapter = %source.adapter, "Unknown social source type");
            return Ok(Vec::new());
        };

        tokio::time::timeout(self.source_timeout, adapter.fetch(source))
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout {
                    source_id: source.source_id.clone(),
                    after: self.source_timeout,
                })
            })
    }

    fn enabled_sources(&self) -> Vec<SocialSourceConfig> {
        self.config.social().sources.into_iter().filter(|s| s.enabled).collect()
    }
}

/// One item per `source:raw_id`. A later duplicate replaces the earlier one
/// in place.
pub fn dedupe_last_wins(items: Vec<LiveItem>) -> Vec<LiveItem> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<LiveItem> = Vec::with_capacity(items.len());
    for item in items {
        let key = format!("{}:{}", item.source, item.raw_id);
        match positions.get(&key) {
            Some(&idx) => out[idx] = item,
            None => {
                positions.insert(key, out.len());
                out.push(item);
            }
        }
    }
    out
}

pub fn sort_newest_first(items: &mut [LiveItem]) {
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
