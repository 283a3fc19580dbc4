use crate::rss_utils::{ids, text};
use crate::types::{ContentItem, FetchError, FetchResult, SourceConfig};
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use interfaces::defs::default_playback_modes;
use tracing::debug;

pub const SUMMARY_MAX_CHARS: usize = 1000;

/// Maps RSS/Atom documents onto `ContentItem`s.
pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &str) -> FetchResult<Feed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        parser::parse(content.as_bytes())
            .map_err(|e| FetchError::Parse(format!("Failed to parse feed: {}", e)))
    }

    /// Parse `content` and convert the first `max_items` entries. Entries
    /// without a title or a link are skipped, so fewer items may come back.
    pub fn parse_items(
        content: &str,
        topic_id: &str,
        source: &SourceConfig,
        max_items: usize,
    ) -> FetchResult<Vec<ContentItem>> {
        let feed = Self::parse_feed(content)?;
        let total = feed.entries.len();

        let items: Vec<ContentItem> = feed
            .entries
            .into_iter()
            .take(max_items)
            .filter_map(|entry| Self::entry_to_item(entry, topic_id, source))
            .collect();

        debug!(
            source_id = %source.source_id,
            entries = total,
            items = items.len(),
            "parsed feed"
        );
        Ok(items)
    }

    pub fn entry_to_item(entry: Entry, topic_id: &str, source: &SourceConfig) -> Option<ContentItem> {
        let title = entry
            .title
            .as_ref()
            .map(|t| text::clean_text(&t.content))
            .unwrap_or_default();
        let url = primary_link(&entry)?;
        if title.is_empty() {
            debug!(source_id = %source.source_id, url = %url, "Skipping entry without title");
            return None;
        }

        let summary_raw = entry
            .summary
            .as_ref()
            .map(|s| s.content.clone())
            .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
            .unwrap_or_default();
        let summary = text::cap_chars(&text::clean_text(&summary_raw), SUMMARY_MAX_CHARS);

        // `published` first, `updated` as fallback
        let published_at = entry.published.or(entry.updated);
        let image_url = lead_image(&entry);

        Some(ContentItem {
            item_id: ids::item_id(topic_id, &source.source_id, &url),
            topic_id: topic_id.to_string(),
            source_id: source.source_id.clone(),
            source_name: source.name.clone(),
            title,
            url,
            published_at,
            summary: if summary.is_empty() { None } else { Some(summary) },
            image_url,
            supported_playback_modes: default_playback_modes(),
        })
    }
}

fn primary_link(entry: &Entry) -> Option<String> {
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())?;

    let href = link.href.trim();
    if href.is_empty() {
        None
    } else {
        Some(href.to_string())
    }
}

/// Best-effort lead image: media content, then media thumbnail, then an
/// image-typed link (enclosure).
fn lead_image(entry: &Entry) -> Option<String> {
    let from_content = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()));
    if from_content.is_some() {
        return from_content;
    }

    let from_thumbnail = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .find(|uri| !uri.is_empty());
    if from_thumbnail.is_some() {
        return from_thumbnail;
    }

    entry
        .links
        .iter()
        .find(|l| {
            l.media_type
                .as_deref()
                .is_some_and(|t| t.starts_with("image/"))
        })
        .map(|l| l.href.clone())
}
