use super::{decode_options, take_configured, Post, TEXT_CHARS, TITLE_LONG_CHARS};
use crate::fetcher::Fetcher;
use crate::rss_utils::{text, time};
use crate::traits::SocialAdapter;
use crate::types::{FetchResult, LiveItem, SocialSourceConfig};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct HackerNewsOptions {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default)]
    queries: Vec<String>,
    #[serde(default = "default_hits_per_query")]
    hits_per_query: usize,
    #[serde(default = "default_max_queries")]
    max_queries: usize,
}

fn default_base_url() -> String {
    "https://hn.algolia.com".to_string()
}

fn default_hits_per_query() -> usize {
    10
}

fn default_max_queries() -> usize {
    4
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    created_at_i: Option<i64>,
    #[serde(rename = "objectID")]
    object_id: Option<String>,
    url: Option<String>,
    title: Option<String>,
    story_text: Option<String>,
    author: Option<String>,
}

/// Recent stories per search query from the Algolia HN API.
pub struct HackerNewsAdapter {
    fetcher: Arc<Fetcher>,
}

impl HackerNewsAdapter {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SocialAdapter for HackerNewsAdapter {
    fn adapter_name(&self) -> &'static str {
        "hackernews"
    }

    async fn fetch(&self, source: &SocialSourceConfig) -> FetchResult<Vec<LiveItem>> {
        let options: HackerNewsOptions = decode_options(source)?;
        let url = format!("{}/api/v1/search_by_date", options.base_url.trim_end_matches('/'));

        let mut out = Vec::new();
        for query in take_configured(&options.queries, options.max_queries) {
            let params = [
                ("query", query.clone()),
                ("tags", "story".to_string()),
                ("hitsPerPage", options.hits_per_query.to_string()),
            ];
            let response: SearchResponse = self.fetcher.fetch_json(&url, &params, &[]).await?;

            let before = out.len();
            out.extend(response.hits.into_iter().filter_map(hit_to_post).map(|p| p.into_live_item(source)));
            debug!(source_id = %source.source_id, query = %query, posts = out.len() - before, "HN query fetched");
        }
        Ok(out)
    }
}

fn hit_to_post(hit: Hit) -> Option<Post> {
    let timestamp = time::from_unix(hit.created_at_i?)?;
    let object_id = hit.object_id.unwrap_or_default();
    let url = match hit.url.filter(|u| !u.is_empty()) {
        Some(url) => url,
        None => format!("https://news.ycombinator.com/item?id={}", object_id),
    };

    Some(Post {
        raw_id: object_id,
        timestamp,
        title: text::trim_with_ellipsis(hit.title.as_deref().unwrap_or("HN story"), TITLE_LONG_CHARS),
        text: text::trim_with_ellipsis(hit.story_text.as_deref().unwrap_or_default(), TEXT_CHARS),
        author: hit.author.unwrap_or_default(),
        url,
        image: None,
    })
}
