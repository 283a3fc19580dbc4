use super::{decode_options, take_configured, Post, TEXT_CHARS, TITLE_LONG_CHARS};
use crate::fetcher::Fetcher;
use crate::rss_utils::{text, time};
use crate::traits::SocialAdapter;
use crate::types::{FetchResult, LiveItem, SocialSourceConfig};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

const REDDIT_USER_AGENT: &str = "topic-aggregator/0.1 (live social feed)";

#[derive(Debug, Deserialize)]
struct RedditOptions {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    subreddits: Vec<String>,
    #[serde(default = "default_sort")]
    sort: String,
    #[serde(default = "default_limit")]
    limit_per_subreddit: usize,
    #[serde(default = "default_max_subreddits")]
    max_subreddits: usize,
}

fn default_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_sort() -> String {
    "new".to_string()
}

fn default_limit() -> usize {
    10
}

fn default_max_subreddits() -> usize {
    3
}

#[derive(Debug, Default, Deserialize)]
struct Listing {
    #[serde(default)]
    data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    #[serde(default)]
    data: Link,
}

#[derive(Debug, Default, Deserialize)]
struct Link {
    id: Option<String>,
    created_utc: Option<f64>,
    permalink: Option<String>,
    url: Option<String>,
    title: Option<String>,
    selftext: Option<String>,
    author: Option<String>,
    preview: Option<Preview>,
}

#[derive(Debug, Deserialize)]
struct Preview {
    #[serde(default)]
    images: Vec<PreviewImage>,
}

#[derive(Debug, Deserialize)]
struct PreviewImage {
    source: Option<ImageSource>,
}

#[derive(Debug, Deserialize)]
struct ImageSource {
    url: Option<String>,
}

/// Subreddit listings through the public `.json` endpoints.
pub struct RedditAdapter {
    fetcher: Arc<Fetcher>,
}

impl RedditAdapter {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SocialAdapter for RedditAdapter {
    fn adapter_name(&self) -> &'static str {
        "reddit"
    }

    async fn fetch(&self, source: &SocialSourceConfig) -> FetchResult<Vec<LiveItem>> {
        let options: RedditOptions = decode_options(source)?;
        let base_url = options.base_url.trim_end_matches('/');

        let mut out = Vec::new();
        for subreddit in take_configured(&options.subreddits, options.max_subreddits) {
            let url = format!("{}/r/{}/{}.json", base_url, subreddit, options.sort);
            let listing: Listing = self
                .fetcher
                .fetch_json(
                    &url,
                    &[("limit", options.limit_per_subreddit.to_string())],
                    &[("User-Agent", REDDIT_USER_AGENT)],
                )
                .await?;

            let before = out.len();
            out.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .filter_map(|child| link_to_post(child.data, base_url))
                    .map(|p| p.into_live_item(source)),
            );
            debug!(source_id = %source.source_id, subreddit = %subreddit, posts = out.len() - before, "Subreddit fetched");
        }
        Ok(out)
    }
}

fn link_to_post(link: Link, base_url: &str) -> Option<Post> {
    let timestamp = time::from_unix(link.created_utc? as i64)?;

    let permalink = link.permalink.unwrap_or_default();
    let url = if permalink.is_empty() {
        link.url.unwrap_or_default()
    } else {
        format!("{}{}", base_url, permalink)
    };

    let image = link
        .preview
        .and_then(|p| p.images.into_iter().next())
        .and_then(|img| img.source)
        .and_then(|src| src.url)
        .filter(|u| !u.is_empty())
        .map(|u| html_escape::decode_html_entities(&u).into_owned());

    let raw_id = match link.id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None if !permalink.is_empty() => permalink,
        None => url.clone(),
    };

    Some(Post {
        raw_id,
        timestamp,
        title: text::trim_with_ellipsis(link.title.as_deref().unwrap_or("Reddit post"), TITLE_LONG_CHARS),
        text: text::trim_with_ellipsis(link.selftext.as_deref().unwrap_or_default(), TEXT_CHARS),
        author: link.author.unwrap_or_default(),
        url,
        image,
    })
}
