mod common;

use common::*;
use std::sync::Arc;
use topic_aggregator::rss_utils::ids;
use topic_aggregator::sources::arxiv::{category_from_feed_url, resolve_category, to_html_url};
use topic_aggregator::sources::{ArxivAdapter, MlbAdapter, RssFeedAdapter};
use topic_aggregator::{FetchError, Fetcher, PlaybackMode, SourceAdapter};
use tracing::info;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>cs.CV updates on arXiv.org</title>
    <link>http://rss.arxiv.org/rss/cs.CV</link>
    <description>cs.CV updates</description>
    <item>
      <title>Seeing Further</title>
      <link>https://arxiv.org/abs/2406.12345</link>
      <description>arXiv:2406.12345v1 Announce Type: new Abstract: We see further.</description>
      <pubDate>Mon, 03 Jun 2024 00:00:00 -0400</pubDate>
    </item>
    <item>
      <title>Pixels as Tokens</title>
      <link>https://arxiv.org/pdf/2406.54321.pdf</link>
      <pubDate>Mon, 03 Jun 2024 00:00:00 -0400</pubDate>
    </item>
  </channel>
</rss>"#;

const RSS_WITH_MEDIA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Media Weekly</title>
    <link>https://media.example.com</link>
    <description>Posts with pictures</description>
    <item>
      <title>Thumb</title>
      <link>https://media.example.com/thumb</link>
      <pubDate>Thu, 01 Feb 2024 10:00:00 GMT</pubDate>
      <media:thumbnail url="https://media.example.com/thumb.jpg" width="320" height="180"/>
    </item>
    <item>
      <title>Enclosure</title>
      <link>https://media.example.com/enclosure</link>
      <pubDate>Thu, 01 Feb 2024 09:00:00 GMT</pubDate>
      <enclosure url="https://media.example.com/enc.jpg" type="image/jpeg" length="2048"/>
    </item>
    <item>
      <title>Content</title>
      <link>https://media.example.com/content</link>
      <pubDate>Thu, 01 Feb 2024 08:00:00 GMT</pubDate>
      <media:content url="https://media.example.com/content.jpg" medium="image" type="image/jpeg"/>
    </item>
  </channel>
</rss>"#;

const ATOM_UPDATED_ONLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Notes</title>
  <id>urn:example:atom-notes</id>
  <updated>2024-02-02T00:00:00Z</updated>
  <entry>
    <title>Only updated</title>
    <id>urn:example:atom-notes:1</id>
    <updated>2024-02-02T00:00:00Z</updated>
    <link rel="alternate" href="https://atom.example.com/post"/>
    <link rel="enclosure" type="image/png" href="https://atom.example.com/atom.png"/>
  </entry>
</feed>"#;

fn fetcher() -> Arc<Fetcher> {
    Arc::new(Fetcher::new(test_fetch_config()).unwrap())
}

async fn serve(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_rss_adapter_normalizes_entries() {
    init_tracing();

    let server = MockServer::start().await;
    serve(&server, "/feed.xml", RSS_TWO_DATED_ONE_UNDATED).await;

    let adapter = RssFeedAdapter::new(fetcher());
    let feed = source("weekly", "rss", &format!("{}/feed.xml", server.uri()));
    let items = adapter.fetch("ai", &feed, 40).await.unwrap();

    info!("RSS adapter produced {} items", items.len());
    assert_eq!(items.len(), 2, "the entry without a link is dropped");

    let first = &items[0];
    assert_eq!(first.title, "Old & dated");
    assert_eq!(first.url, "https://ai.example.com/posts/old");
    assert_eq!(first.summary.as_deref(), Some("First post"));
    assert_eq!(first.item_id, ids::item_id("ai", "weekly", "https://ai.example.com/posts/old"));
    assert_eq!(first.published_at.map(|t| t.to_rfc3339()).as_deref(), Some("2020-01-01T00:00:00+00:00"));
    assert_eq!(first.source_name, "Source weekly");
    assert!(items[1].published_at.is_none());
}

#[tokio::test]
async fn test_rss_adapter_extracts_lead_images() {
    init_tracing();

    let server = MockServer::start().await;
    serve(&server, "/media.xml", RSS_WITH_MEDIA).await;

    let adapter = RssFeedAdapter::new(fetcher());
    let feed = source("media", "rss", &format!("{}/media.xml", server.uri()));
    let items = adapter.fetch("photos", &feed, 10).await.unwrap();

    let seen: Vec<(&str, Option<&str>, Option<String>)> = items
        .iter()
        .map(|i| (i.title.as_str(), i.image_url.as_deref(), i.published_at.map(|t| t.to_rfc3339())))
        .collect();
    assert_eq!(
        seen,
        vec![
            (
                "Thumb",
                Some("https://media.example.com/thumb.jpg"),
                Some("2024-02-01T10:00:00+00:00".to_string())
            ),
            (
                "Enclosure",
                Some("https://media.example.com/enc.jpg"),
                Some("2024-02-01T09:00:00+00:00".to_string())
            ),
            (
                "Content",
                Some("https://media.example.com/content.jpg"),
                Some("2024-02-01T08:00:00+00:00".to_string())
            ),
        ]
    );
}

#[tokio::test]
async fn test_atom_entry_falls_back_to_updated() {
    init_tracing();

    let server = MockServer::start().await;
    serve(&server, "/atom.xml", ATOM_UPDATED_ONLY).await;

    let adapter = RssFeedAdapter::new(fetcher());
    let feed = source("notes", "rss", &format!("{}/atom.xml", server.uri()));
    let items = adapter.fetch("notes", &feed, 10).await.unwrap();

    assert_eq!(items.len(), 1);
    let entry = &items[0];
    assert_eq!(entry.url, "https://atom.example.com/post");
    assert_eq!(entry.image_url.as_deref(), Some("https://atom.example.com/atom.png"));
    assert_eq!(entry.published_at.map(|t| t.to_rfc3339()).as_deref(), Some("2024-02-02T00:00:00+00:00"));
}

#[tokio::test]
async fn test_rss_adapter_honors_max_items() {
    init_tracing();

    let server = MockServer::start().await;
    serve(&server, "/feed.xml", RSS_TWO_DATED_ONE_UNDATED).await;

    let adapter = RssFeedAdapter::new(fetcher());
    let feed = source("weekly", "rss", &format!("{}/feed.xml", server.uri()));
    let items = adapter.fetch("ai", &feed, 1).await.unwrap();

    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_rss_adapter_reports_http_and_parse_failures() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down.xml"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    serve(&server, "/garbage.xml", "this is not a feed").await;

    let adapter = RssFeedAdapter::new(fetcher());

    let down = source("down", "rss", &format!("{}/down.xml", server.uri()));
    match adapter.fetch("ai", &down, 10).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected status error, got {:?}", other),
    }

    let garbage = source("garbage", "rss", &format!("{}/garbage.xml", server.uri()));
    assert!(matches!(adapter.fetch("ai", &garbage, 10).await, Err(FetchError::Parse(_))));
}

#[tokio::test]
async fn test_mlb_adapter_marks_playback_modes() {
    init_tracing();

    let server = MockServer::start().await;
    serve(&server, "/mlb.xml", RSS_TWO_DATED_ONE_UNDATED).await;

    let adapter = MlbAdapter::new(fetcher());
    let feed = source("mlb-news", "mlb", &format!("{}/mlb.xml", server.uri()));
    let items = adapter.fetch("baseball", &feed, 10).await.unwrap();

    assert_eq!(items.len(), 2);
    for item in items {
        assert_eq!(item.supported_playback_modes, vec![PlaybackMode::FullPage, PlaybackMode::Summary]);
        assert_eq!(item.topic_id, "baseball");
    }
}

#[tokio::test]
async fn test_arxiv_feed_links_are_canonicalized() {
    init_tracing();

    let server = MockServer::start().await;
    serve(&server, "/rss/cs.CV", ARXIV_FEED).await;
    // Never called: the feed is not empty.
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARXIV_API_TWO_ENTRIES))
        .expect(0)
        .mount(&server)
        .await;

    let adapter = ArxivAdapter::new(fetcher()).with_api_url(format!("{}/api/query", server.uri()));
    let feed = source("arxiv-cv", "arxiv", &format!("{}/rss/cs.CV", server.uri()));
    let items = adapter.fetch("vision", &feed, 10).await.unwrap();

    let urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(urls, vec!["https://arxiv.org/html/2406.12345", "https://arxiv.org/html/2406.54321"]);
    for item in &items {
        assert_eq!(item.item_id, ids::item_id("vision", "arxiv-cv", &item.url));
        assert_eq!(item.supported_playback_modes, vec![PlaybackMode::Summary, PlaybackMode::FullPage]);
    }
}

#[tokio::test]
async fn test_arxiv_empty_feed_falls_back_to_api() {
    init_tracing();

    let server = MockServer::start().await;
    serve(&server, "/rss/cs.CV", RSS_EMPTY).await;
    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "cat:cs.LG"))
        .and(query_param("max_results", "7"))
        .and(query_param("sortBy", "submittedDate"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ARXIV_API_TWO_ENTRIES))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = ArxivAdapter::new(fetcher()).with_api_url(format!("{}/api/query", server.uri()));
    let mut feed = source("arxiv-ml", "arxiv", &format!("{}/rss/cs.CV", server.uri()));
    feed.metadata.insert("category".to_string(), "cs.LG".to_string());
    let items = adapter.fetch("ml", &feed, 7).await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Scaling Laws for Tiny Models");
    assert_eq!(items[0].summary.as_deref(), Some("We study scaling."));
    assert_eq!(items[0].url, "http://arxiv.org/html/2405.00001v1");
    assert!(items[0].published_at.is_some());
}

#[tokio::test]
async fn test_arxiv_feed_failure_propagates() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/cs.CV"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = ArxivAdapter::new(fetcher()).with_api_url(format!("{}/api/query", server.uri()));
    let feed = source("arxiv-cv", "arxiv", &format!("{}/rss/cs.CV", server.uri()));

    assert!(adapter.fetch("vision", &feed, 10).await.is_err());
}

#[test]
fn test_arxiv_link_rewrites() {
    assert_eq!(to_html_url("https://arxiv.org/abs/2401.00001v2"), "https://arxiv.org/html/2401.00001v2");
    assert_eq!(to_html_url("https://arxiv.org/pdf/2401.00001v2.pdf"), "https://arxiv.org/html/2401.00001v2");
    assert_eq!(to_html_url(" https://arxiv.org/html/2401.00001 "), "https://arxiv.org/html/2401.00001");
    assert_eq!(to_html_url("https://example.com/paper"), "https://example.com/paper");
    assert_eq!(to_html_url(""), "");
}

#[test]
fn test_arxiv_category_resolution() {
    assert_eq!(category_from_feed_url("https://rss.arxiv.org/rss/cs.AI"), Some("cs.AI".to_string()));
    assert_eq!(category_from_feed_url("https://rss.arxiv.org/rss/"), None);
    assert_eq!(category_from_feed_url("https://example.com/feed"), None);

    let mut src = source("arxiv", "arxiv", "https://example.com/feed");
    assert_eq!(resolve_category(&src), "cs.CV");

    src.url = "https://rss.arxiv.org/rss/stat.ML".to_string();
    assert_eq!(resolve_category(&src), "stat.ML");

    src.metadata.insert("category".to_string(), " cs.RO ".to_string());
    assert_eq!(resolve_category(&src), "cs.RO");
}

#[test]
fn test_item_id_is_deterministic() {
    let a = ids::item_id("ai", "weekly", "https://ai.example.com/1");
    let b = ids::item_id("ai", "weekly", "https://ai.example.com/1");
    let c = ids::item_id("ai", "weekly", "https://ai.example.com/2");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(a.len(), 64);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
}
