use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    FullPage,
    Summary,
}

pub fn default_playback_modes() -> Vec<PlaybackMode> {
    vec![PlaybackMode::FullPage, PlaybackMode::Summary]
}

fn default_playback_mode() -> PlaybackMode {
    PlaybackMode::FullPage
}

fn default_true() -> bool {
    true
}

fn default_max_items() -> usize {
    40
}

/// One fetched unit of content, normalized across every source type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub item_id: String,
    pub topic_id: String,
    pub source_id: String,
    pub source_name: String,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_playback_modes")]
    pub supported_playback_modes: Vec<PlaybackMode>,
}

impl ContentItem {
    /// Primary dedup key: the same link from two different sources is two items.
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.source_id, &self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub source_id: String,
    pub name: String,
    pub adapter: String,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Adapter-specific overrides, e.g. `category` for the arXiv adapter.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub topic_id: String,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_playback_mode")]
    pub default_playback_mode: PlaybackMode,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source_id: String,
    pub name: String,
    pub adapter: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub topic_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub default_playback_mode: PlaybackMode,
    pub sources: Vec<SourceSummary>,
}

impl From<&TopicConfig> for TopicSummary {
    fn from(topic: &TopicConfig) -> Self {
        Self {
            topic_id: topic.topic_id.clone(),
            name: topic.name.clone(),
            icon: topic.icon.clone(),
            default_playback_mode: topic.default_playback_mode,
            sources: topic
                .sources
                .iter()
                .filter(|src| src.enabled)
                .map(|src| SourceSummary {
                    source_id: src.source_id.clone(),
                    name: src.name.clone(),
                    adapter: src.adapter.clone(),
                    url: src.url.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicItemsResult {
    pub topic_id: String,
    pub topic_name: String,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<ContentItem>,
}

fn default_refresh_interval() -> u64 {
    30
}

fn default_interleaved_limit() -> usize {
    24
}

fn default_social_topic() -> String {
    "ai".to_string()
}

fn default_social_max_items() -> usize {
    6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_interleaved_limit")]
    pub interleaved_limit: usize,
    #[serde(default)]
    pub sources: Vec<SocialSourceConfig>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval(),
            interleaved_limit: default_interleaved_limit(),
            sources: Vec::new(),
        }
    }
}

/// A social source definition. Everything the platform adapter needs beyond
/// the common fields lives in `options` and is decoded by the adapter itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialSourceConfig {
    pub source_id: String,
    #[serde(rename = "type", default)]
    pub adapter: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_social_topic")]
    pub topic: String,
    #[serde(default = "default_social_max_items")]
    pub max_items: usize,
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl SocialSourceConfig {
    pub fn display_name(&self) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => title_case(&self.source_id),
        }
    }

    pub fn display_icon(&self) -> String {
        match self.icon.as_deref() {
            Some(icon) if !icon.is_empty() => icon.to_string(),
            _ => "•".to_string(),
        }
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

impl MediaRef {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: "image".to_string(),
            url: url.into(),
        }
    }
}

/// A post from a social platform. `id` is always `"{source}:{raw_id}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveItem {
    pub id: String,
    pub source: String,
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub raw_id: String,
    pub title: String,
    pub text: String,
    pub author: String,
    pub url: String,
    pub media: Vec<MediaRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePayload {
    pub source_id: String,
    pub name: String,
    pub icon: String,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<LiveItem>,
    /// Set when the last refresh of this source failed; `items` is then empty.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveFeed {
    pub updated_at: DateTime<Utc>,
    pub refresh_interval_seconds: u64,
    pub items: Vec<LiveItem>,
    pub sources: Vec<SourcePayload>,
}

// Object style note:
// The aggregator reads its configuration through `ConfigProvider` on every
// request instead of holding a copy, so a provider that reloads from disk is
// picked up without rebuilding the aggregator.

pub trait ConfigProvider: Send + Sync {
    /// Enabled topics only.
    fn topics(&self) -> Vec<TopicConfig>;
    fn social(&self) -> SocialConfig;
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("topic not found: {topic_id}")]
    TopicNotFound { topic_id: String },

    #[error("item {item_id} not found in topic {topic_id}")]
    ItemNotFound { topic_id: String, item_id: String },
}

/// What the audio worker needs from the aggregator: resolve an item it was
/// handed by id to something with a fetchable `url`.
#[async_trait]
pub trait ItemLookup: Send + Sync {
    async fn lookup_item(&self, topic_id: &str, item_id: &str) -> Result<ContentItem, LookupError>;
}
