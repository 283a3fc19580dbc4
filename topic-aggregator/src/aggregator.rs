use crate::cache::TtlCache;
use crate::registry::AdapterRegistry;
use crate::rss_utils::time;
use crate::traits::SourceAdapter;
use crate::types::{
    AggregatorError, ConfigProvider, ContentItem, FetchError, FetchResult, ItemLookup, LookupError, Result,
    SourceConfig, TopicConfig, TopicItemsResult, TopicSummary,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-topic aggregator: cache probe, concurrent fan-out to the topic's
/// sources, then merge, dedupe, sort, cap and cache the result.
pub struct TopicAggregator {
    config: Arc<dyn ConfigProvider>,
    registry: Arc<AdapterRegistry>,
    cache: TtlCache<String, TopicItemsResult>,
    source_timeout: Duration,
}

impl TopicAggregator {
    pub fn new(
        config: Arc<dyn ConfigProvider>,
        registry: Arc<AdapterRegistry>,
        cache: TtlCache<String, TopicItemsResult>,
        source_timeout: Duration,
    ) -> Self {
        Self {
            config,
            registry,
            cache,
            source_timeout,
        }
    }

    pub fn list_topics(&self) -> Vec<TopicSummary> {
        self.config.topics().iter().map(TopicSummary::from).collect()
    }

    pub async fn get_items(&self, topic_id: &str, force: bool) -> Result<TopicItemsResult> {
        let topic = self.find_topic(topic_id)?;
        Ok(self.fetch_topic(&topic, force).await)
    }

    /// Look an item up in the current item set of its topic, refreshing the
    /// set only if the cached one has expired.
    pub async fn get_item(&self, topic_id: &str, item_id: &str) -> Result<ContentItem> {
        let payload = self.get_items(topic_id, false).await?;
        payload
            .items
            .into_iter()
            .find(|item| item.item_id == item_id)
            .ok_or_else(|| AggregatorError::ItemNotFound {
                topic_id: topic_id.to_string(),
                item_id: item_id.to_string(),
            })
    }

    pub async fn fetch_topic(&self, topic: &TopicConfig, force: bool) -> TopicItemsResult {
        if let Some(cached) = self.cache.get(&topic.topic_id, force).await {
            debug!(topic_id = %topic.topic_id, items = cached.items.len(), "Topic cache hit");
            return cached;
        }

        let updated_at = Utc::now();
        let start_time = Instant::now();

        let sources = self.resolve_sources(topic);
        let source_count = sources.len();

        let handles: Vec<_> = sources
            .into_iter()
            .map(|(adapter, source)| {
                let source_id = source.source_id.clone();
                let handle = spawn_fetch(
                    adapter,
                    topic.topic_id.clone(),
                    source,
                    topic.max_items,
                    self.source_timeout,
                );
                (source_id, handle)
            })
            .collect();

        let (source_ids, handles): (Vec<String>, Vec<_>) = handles.into_iter().unzip();
        let results = join_all(handles).await;

        let mut rows = Vec::new();
        let mut failed = 0usize;
        for (source_id, joined) in source_ids.iter().zip(results) {
            match joined {
                Ok(Ok(items)) => {
                    debug!(topic_id = %topic.topic_id, source_id = %source_id, items = items.len(), "Source fetched");
                    rows.extend(items);
                }
                Ok(Err(e)) => {
                    failed += 1;
                    warn!(topic_id = %topic.topic_id, source_id = %source_id, error = %e, "Source fetch failed");
                }
                Err(e) => {
                    failed += 1;
                    warn!(topic_id = %topic.topic_id, source_id = %source_id, error = %e, "Source task aborted");
                }
            }
        }

        let payload = TopicItemsResult {
            topic_id: topic.topic_id.clone(),
            topic_name: topic.name.clone(),
            updated_at,
            items: merge_items(rows, topic.max_items),
        };
        self.cache.put(topic.topic_id.clone(), payload.clone()).await;

        info!(
            topic_id = %topic.topic_id,
            sources = source_count,
            failed,
            items = payload.items.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Topic refreshed"
        );
        payload
    }

    fn find_topic(&self, topic_id: &str) -> Result<TopicConfig> {
        self.config
            .topics()
            .into_iter()
            .find(|topic| topic.topic_id == topic_id)
            .ok_or_else(|| AggregatorError::TopicNotFound {
                topic_id: topic_id.to_string(),
            })
    }

    /// Enabled sources whose adapter tag is registered. Anything else is
    /// dropped as if it were disabled.
    fn resolve_sources(&self, topic: &TopicConfig) -> Vec<(Arc<dyn SourceAdapter>, SourceConfig)> {
        topic
            .sources
            .iter()
            .filter(|source| source.enabled)
            .filter_map(|source| match self.registry.get_adapter(&source.adapter) {
                Some(adapter) => Some((adapter, source.clone())),
                None => {
                    debug!(
                        topic_id = %topic.topic_id,
                        source_id = %source.source_id,
                        adapter = %source.adapter,
                        "No adapter registered, skipping source"
                    );
                    None
                }
            })
            .collect()
    }
}

/// One fan-out unit. The timeout wraps the fetch inside the task, so a slow
/// source is dropped at its deadline without holding up the join.
fn spawn_fetch(
    adapter: Arc<dyn SourceAdapter>,
    topic_id: String,
    source: SourceConfig,
    max_items: usize,
    timeout: Duration,
) -> tokio::task::JoinHandle<FetchResult<Vec<ContentItem>>> {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, adapter.fetch(&topic_id, &source, max_items)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                source_id: source.source_id.clone(),
                after: timeout,
            }),
        }
    })
}

/// Keep the first item per `(source_id, url)`.
pub fn dedupe_items(items: Vec<ContentItem>) -> Vec<ContentItem> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let before = items.len();

    let unique: Vec<ContentItem> = items
        .into_iter()
        .filter(|item| {
            let (source_id, url) = item.dedup_key();
            seen.insert((source_id.to_string(), url.to_string()))
        })
        .collect();

    let removed = before - unique.len();
    if removed > 0 {
        debug!("Removed {} duplicate items", removed);
    }
    unique
}

/// Newest first; undated items sort as the epoch, i.e. last. Stable.
pub fn sort_by_freshness(items: &mut [ContentItem]) {
    items.sort_by(|a, b| time::sort_key(b.published_at).cmp(&time::sort_key(a.published_at)));
}

pub fn merge_items(items: Vec<ContentItem>, max_items: usize) -> Vec<ContentItem> {
    let mut items = dedupe_items(items);
    sort_by_freshness(&mut items);
    items.truncate(max_items);
    items
}

#[async_trait]
impl ItemLookup for TopicAggregator {
    async fn lookup_item(&self, topic_id: &str, item_id: &str) -> std::result::Result<ContentItem, LookupError> {
        self.get_item(topic_id, item_id).await.map_err(|e| match e {
            AggregatorError::ItemNotFound { topic_id, item_id } => LookupError::ItemNotFound { topic_id, item_id },
            AggregatorError::TopicNotFound { topic_id } | AggregatorError::UnsupportedSource { source_id: topic_id } => {
                LookupError::TopicNotFound { topic_id }
            }
        })
    }
}
