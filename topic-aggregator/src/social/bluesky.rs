use super::{decode_options, take_configured, Post, TEXT_CHARS, TITLE_SHORT_CHARS};
use crate::fetcher::Fetcher;
use crate::rss_utils::{text, time};
use crate::traits::SocialAdapter;
use crate::types::{FetchError, FetchResult, LiveItem, SocialSourceConfig};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct BlueskyApiOptions {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    handles: Vec<String>,
    #[serde(default = "default_max_handles")]
    max_handles: usize,
    #[serde(default)]
    queries: Vec<String>,
    #[serde(default = "default_max_queries")]
    max_queries: usize,
    #[serde(default)]
    enable_search: bool,
    #[serde(default = "default_limit")]
    limit_per_request: usize,
}

fn default_base_url() -> String {
    "https://public.api.bsky.app".to_string()
}

fn default_max_handles() -> usize {
    3
}

fn default_max_queries() -> usize {
    2
}

fn default_limit() -> usize {
    10
}

#[derive(Debug, Deserialize)]
struct ResolvedHandle {
    did: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorFeed {
    #[serde(default)]
    feed: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    post: Option<BskyPost>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    posts: Vec<BskyPost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BskyPost {
    uri: Option<String>,
    #[serde(default)]
    author: BskyAuthor,
    #[serde(default)]
    record: BskyRecord,
    text: Option<String>,
    indexed_at: Option<String>,
    created_at: Option<String>,
    embed: Option<BskyEmbed>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BskyAuthor {
    handle: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BskyRecord {
    text: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BskyEmbed {
    #[serde(default)]
    images: Vec<BskyImage>,
}

#[derive(Debug, Deserialize)]
struct BskyImage {
    fullsize: Option<String>,
    thumb: Option<String>,
}

/// Author feeds (and optionally post search) through the public AppView API.
///
/// A failing handle or query is logged and skipped; the source as a whole
/// only fails when its options are unusable.
pub struct BlueskyApiAdapter {
    fetcher: Arc<Fetcher>,
}

impl BlueskyApiAdapter {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }

    async fn resolve_handle(&self, base_url: &str, handle: &str) -> FetchResult<Option<String>> {
        let url = format!("{}/xrpc/com.atproto.identity.resolveHandle", base_url);
        match self
            .fetcher
            .fetch_json::<ResolvedHandle>(&url, &[("handle", handle.to_string())], &[])
            .await
        {
            Ok(resolved) => Ok(resolved.did.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())),
            Err(FetchError::Status { status, .. }) => {
                debug!(handle, status, "Handle did not resolve");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn author_posts(&self, base_url: &str, handle: &str, limit: usize) -> FetchResult<Vec<BskyPost>> {
        let Some(did) = self.resolve_handle(base_url, handle).await? else {
            return Ok(Vec::new());
        };

        let url = format!("{}/xrpc/app.bsky.feed.getAuthorFeed", base_url);
        let feed: AuthorFeed = self
            .fetcher
            .fetch_json(&url, &[("actor", did), ("limit", limit.to_string())], &[])
            .await?;
        Ok(feed.feed.into_iter().filter_map(|entry| entry.post).collect())
    }

    async fn search_posts(&self, base_url: &str, query: &str, limit: usize) -> FetchResult<Vec<BskyPost>> {
        let url = format!("{}/xrpc/app.bsky.feed.searchPosts", base_url);
        let results: SearchResults = self
            .fetcher
            .fetch_json(&url, &[("q", query.to_string()), ("limit", limit.to_string())], &[])
            .await?;
        Ok(results.posts)
    }
}

#[async_trait]
impl SocialAdapter for BlueskyApiAdapter {
    fn adapter_name(&self) -> &'static str {
        "bluesky_api"
    }

    async fn fetch(&self, source: &SocialSourceConfig) -> FetchResult<Vec<LiveItem>> {
        let options: BlueskyApiOptions = decode_options(source)?;
        let base_url = options.base_url.trim_end_matches('/');
        let limit = options.limit_per_request;

        let mut out = Vec::new();
        for handle in take_configured(&options.handles, options.max_handles) {
            match self.author_posts(base_url, &handle, limit).await {
                Ok(posts) => out.extend(posts.into_iter().filter_map(post_to_post).map(|p| p.into_live_item(source))),
                Err(e) => warn!(source_id = %source.source_id, handle = %handle, error = %e, "Bluesky handle fetch failed"),
            }
        }

        if options.enable_search {
            for query in take_configured(&options.queries, options.max_queries) {
                match self.search_posts(base_url, &query, limit).await {
                    Ok(posts) => {
                        out.extend(posts.into_iter().filter_map(post_to_post).map(|p| p.into_live_item(source)))
                    }
                    Err(e) => warn!(source_id = %source.source_id, query = %query, error = %e, "Bluesky query fetch failed"),
                }
            }
        }

        Ok(out)
    }
}

fn post_to_post(post: BskyPost) -> Option<Post> {
    let body = post
        .record
        .text
        .as_deref()
        .or(post.text.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string();
    if body.is_empty() {
        return None;
    }

    let timestamp = [&post.record.created_at, &post.indexed_at, &post.created_at]
        .into_iter()
        .find_map(|value| value.as_deref().and_then(time::parse_iso_datetime))?;

    let raw_uri = post.uri.unwrap_or_default();
    let handle = post.author.handle.as_deref().unwrap_or_default().trim().to_string();
    let url = open_url(&raw_uri, &handle)?;

    let image = post.embed.into_iter().flat_map(|e| e.images).find_map(|img| {
        let fullsize = img.fullsize.unwrap_or_default().trim().to_string();
        let thumb = img.thumb.unwrap_or_default().trim().to_string();
        [fullsize, thumb].into_iter().find(|u| !u.is_empty())
    });

    let author = post
        .author
        .display_name
        .filter(|n| !n.is_empty())
        .or(Some(handle).filter(|h| !h.is_empty()))
        .unwrap_or_else(|| "Bluesky".to_string());

    Some(Post {
        raw_id: if raw_uri.is_empty() { url.clone() } else { raw_uri },
        timestamp,
        title: text::trim_with_ellipsis(&body, TITLE_SHORT_CHARS),
        text: text::trim_with_ellipsis(&body, TEXT_CHARS),
        author,
        url,
        image,
    })
}

/// `at://{did}/app.bsky.feed.post/{rkey}` to the public post page.
pub fn open_url(uri: &str, handle: &str) -> Option<String> {
    if !uri.starts_with("at://") || !uri.contains("/app.bsky.feed.post/") || handle.is_empty() {
        return None;
    }
    let rkey = uri.rsplit('/').next().filter(|k| !k.is_empty())?;
    Some(format!("https://bsky.app/profile/{}/post/{}", handle, rkey))
}

#[derive(Debug, Deserialize)]
struct BlueskyLinksOptions {
    #[serde(default)]
    profile_urls: Vec<String>,
    #[serde(default = "default_max_links")]
    max_links: usize,
    link_title: Option<String>,
    link_text: Option<String>,
}

fn default_max_links() -> usize {
    3
}

/// Static "open Bluesky" links. No network access.
pub struct BlueskyLinksAdapter;

#[async_trait]
impl SocialAdapter for BlueskyLinksAdapter {
    fn adapter_name(&self) -> &'static str {
        "bluesky_links"
    }

    async fn fetch(&self, source: &SocialSourceConfig) -> FetchResult<Vec<LiveItem>> {
        let options: BlueskyLinksOptions = decode_options(source)?;
        let now = Utc::now();
        let title = options
            .link_title
            .unwrap_or_else(|| format!("Open Bluesky ({})", source.topic));
        let body = options
            .link_text
            .unwrap_or_else(|| "Browse latest Bluesky posts.".to_string());

        Ok(take_configured(&options.profile_urls, options.max_links)
            .into_iter()
            .enumerate()
            .map(|(idx, url)| {
                Post {
                    raw_id: format!("link-{}", idx),
                    timestamp: now,
                    title: title.clone(),
                    text: body.clone(),
                    author: "Bluesky".to_string(),
                    url,
                    image: None,
                }
                .into_live_item(source)
            })
            .collect())
    }
}
