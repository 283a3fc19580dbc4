#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;
use std::time::Duration;
use topic_aggregator::rss_utils::ids;
use topic_aggregator::{
    ContentItem, FetchConfig, FetchError, FetchResult, PlaybackMode, SourceAdapter, SourceConfig, TopicConfig,
};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        user_agent: "Aggregator-Test/1.0".to_string(),
        timeout_seconds: 5,
        ..FetchConfig::default()
    }
}

pub fn source(source_id: &str, adapter: &str, url: &str) -> SourceConfig {
    SourceConfig {
        source_id: source_id.to_string(),
        name: format!("Source {}", source_id),
        adapter: adapter.to_string(),
        url: url.to_string(),
        enabled: true,
        metadata: HashMap::new(),
    }
}

pub fn topic(topic_id: &str, max_items: usize, sources: Vec<SourceConfig>) -> TopicConfig {
    TopicConfig {
        topic_id: topic_id.to_string(),
        name: format!("Topic {}", topic_id),
        icon: None,
        enabled: true,
        default_playback_mode: PlaybackMode::FullPage,
        max_items,
        sources,
    }
}

/// An item published `published` seconds after the epoch, or undated.
pub fn item(topic_id: &str, source_id: &str, url: &str, published: Option<i64>) -> ContentItem {
    ContentItem {
        item_id: ids::item_id(topic_id, source_id, url),
        topic_id: topic_id.to_string(),
        source_id: source_id.to_string(),
        source_name: format!("Source {}", source_id),
        title: format!("Title for {}", url),
        url: url.to_string(),
        published_at: published.and_then(|s| Utc.timestamp_opt(s, 0).single()),
        summary: None,
        image_url: None,
        supported_playback_modes: vec![PlaybackMode::FullPage, PlaybackMode::Summary],
    }
}

enum Behavior {
    Items(Vec<ContentItem>),
    Fail,
    Hang(Duration),
}

/// Scripted adapter that counts how often it was asked to fetch.
pub struct ScriptedAdapter {
    behavior: Behavior,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn returning(items: Vec<ContentItem>) -> Self {
        Self {
            behavior: Behavior::Items(items),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn hanging(delay: Duration) -> Self {
        Self {
            behavior: Behavior::Hang(delay),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn adapter_name(&self) -> &'static str {
        "scripted"
    }

    async fn fetch(&self, _topic_id: &str, _source: &SourceConfig, max_items: usize) -> FetchResult<Vec<ContentItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Items(items) => Ok(items.iter().take(max_items).cloned().collect()),
            Behavior::Fail => Err(FetchError::Parse("scripted failure".to_string())),
            Behavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
        }
    }
}

pub const RSS_TWO_DATED_ONE_UNDATED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>AI Weekly</title>
    <link>https://ai.example.com</link>
    <description>News about models</description>
    <item>
      <title>Old &amp; dated</title>
      <link>https://ai.example.com/posts/old</link>
      <description>&lt;p&gt;First   post&lt;/p&gt;</description>
      <pubDate>Wed, 01 Jan 2020 00:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No date at all</title>
      <link>https://ai.example.com/posts/undated</link>
      <description>Undated post</description>
    </item>
    <item>
      <title>Missing link</title>
      <description>This entry has nowhere to go</description>
      <pubDate>Thu, 02 Jan 2020 00:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

pub const RSS_EMPTY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>cs.AI updates on arXiv.org</title>
    <link>https://arxiv.org</link>
    <description>Nothing announced today</description>
  </channel>
</rss>"#;

pub const ARXIV_API_TWO_ENTRIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <id>http://arxiv.org/api/query</id>
  <updated>2024-05-03T00:00:00-04:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2405.00001v1</id>
    <updated>2024-05-02T17:59:59Z</updated>
    <published>2024-05-02T17:59:59Z</published>
    <title>Scaling Laws for
      Tiny Models</title>
    <summary>  We study scaling.  </summary>
    <author><name>A. Author</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2405.00002v1</id>
    <updated>2024-05-01T10:00:00Z</updated>
    <published>2024-05-01T10:00:00Z</published>
    <title>Agents All the Way Down</title>
    <summary>We study agents.</summary>
    <author><name>B. Author</name></author>
  </entry>
</feed>"#;
