use crate::fetcher::Fetcher;
use crate::parser::SUMMARY_MAX_CHARS;
use crate::rss_utils::{ids, text, time};
use crate::sources::RssFeedAdapter;
use crate::traits::SourceAdapter;
use crate::types::{ContentItem, FetchResult, PlaybackMode, SourceConfig};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

pub const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";
pub const DEFAULT_CATEGORY: &str = "cs.CV";

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    id: Option<String>,
    summary: Option<String>,
    published: Option<String>,
}

/// arXiv preprints. Reads the category RSS feed first and falls back to the
/// export API when the feed is empty (it is over weekends). Every link is
/// rewritten to the HTML reader view, and item ids are derived from that link.
pub struct ArxivAdapter {
    inner: RssFeedAdapter,
    fetcher: Arc<Fetcher>,
    api_url: String,
}

impl ArxivAdapter {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self {
            inner: RssFeedAdapter::new(fetcher.clone()),
            fetcher,
            api_url: ARXIV_API_URL.to_string(),
        }
    }

    /// Point the API fallback somewhere else (mirrors, tests).
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn fetch_from_api(
        &self,
        topic_id: &str,
        source: &SourceConfig,
        max_items: usize,
    ) -> FetchResult<Vec<ContentItem>> {
        let category = resolve_category(source);
        let query_url = format!(
            "{}?search_query=cat:{}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            self.api_url, category, max_items
        );
        debug!(source_id = %source.source_id, category = %category, "Querying arXiv API");

        let xml = self.fetcher.fetch_text(&query_url).await?;
        parse_api_entries(&xml, topic_id, source)
    }

    fn canonicalize(item: ContentItem) -> ContentItem {
        let url = to_html_url(&item.url);
        ContentItem {
            item_id: ids::item_id(&item.topic_id, &item.source_id, &url),
            url,
            supported_playback_modes: vec![PlaybackMode::Summary, PlaybackMode::FullPage],
            ..item
        }
    }
}

#[async_trait]
impl SourceAdapter for ArxivAdapter {
    fn adapter_name(&self) -> &'static str {
        "arxiv"
    }

    async fn fetch(
        &self,
        topic_id: &str,
        source: &SourceConfig,
        max_items: usize,
    ) -> FetchResult<Vec<ContentItem>> {
        let mut items = self.inner.fetch(topic_id, source, max_items).await?;
        if items.is_empty() {
            info!(source_id = %source.source_id, "arXiv feed empty, falling back to export API");
            items = self.fetch_from_api(topic_id, source, max_items).await?;
        }

        Ok(items.into_iter().map(Self::canonicalize).collect())
    }
}

fn parse_api_entries(xml: &str, topic_id: &str, source: &SourceConfig) -> FetchResult<Vec<ContentItem>> {
    let feed: AtomFeed = quick_xml::de::from_str(xml)?;

    let mut out = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let (Some(title), Some(id)) = (entry.title, entry.id) else {
            continue;
        };
        let title = text::collapse_whitespace(&title);
        let link = to_html_url(id.trim());
        if title.is_empty() || link.is_empty() {
            continue;
        }

        let summary = entry
            .summary
            .map(|s| text::cap_chars(s.trim(), SUMMARY_MAX_CHARS))
            .filter(|s| !s.is_empty());

        out.push(ContentItem {
            item_id: ids::item_id(topic_id, &source.source_id, &link),
            topic_id: topic_id.to_string(),
            source_id: source.source_id.clone(),
            source_name: source.name.clone(),
            title,
            url: link,
            published_at: entry.published.as_deref().and_then(time::parse_iso_datetime),
            summary,
            image_url: None,
            supported_playback_modes: vec![PlaybackMode::Summary, PlaybackMode::FullPage],
        });
    }
    Ok(out)
}

/// `metadata.category`, else the path segment after `/rss/` in the feed URL,
/// else `cs.CV`.
pub fn resolve_category(source: &SourceConfig) -> String {
    source
        .metadata
        .get("category")
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .or_else(|| category_from_feed_url(&source.url))
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
}

pub fn category_from_feed_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/rss/")?;
    let category = rest.trim().trim_matches('/');
    if category.is_empty() {
        None
    } else {
        Some(category.to_string())
    }
}

/// Rewrite abstract and PDF links to the HTML reader view.
pub fn to_html_url(url: &str) -> String {
    let txt = url.trim();
    if txt.is_empty() || txt.contains("/html/") {
        return txt.to_string();
    }
    if txt.contains("/abs/") {
        return txt.replace("/abs/", "/html/");
    }
    if txt.contains("/pdf/") {
        let last = txt.rsplit('/').next().unwrap_or_default();
        let paper_id = last.replace(".pdf", "");
        return format!("https://arxiv.org/html/{}", paper_id);
    }
    txt.to_string()
}
