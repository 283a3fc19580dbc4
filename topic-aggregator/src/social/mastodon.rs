use super::{decode_options, take_configured, Post, TEXT_CHARS, TITLE_SHORT_CHARS};
use crate::fetcher::Fetcher;
use crate::rss_utils::{text, time};
use crate::traits::SocialAdapter;
use crate::types::{FetchResult, LiveItem, SocialSourceConfig};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct MastodonOptions {
    #[serde(default = "default_instance")]
    instance_base_url: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default = "default_max_tags")]
    max_tags: usize,
    #[serde(default = "default_limit_per_tag")]
    limit_per_tag: usize,
}

fn default_instance() -> String {
    "https://mastodon.social".to_string()
}

fn default_max_tags() -> usize {
    3
}

fn default_limit_per_tag() -> usize {
    8
}

#[derive(Debug, Deserialize)]
struct Status {
    id: Option<String>,
    uri: Option<String>,
    url: Option<String>,
    content: Option<String>,
    language: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    account: Account,
    #[serde(default)]
    media_attachments: Vec<Attachment>,
}

#[derive(Debug, Default, Deserialize)]
struct Account {
    display_name: Option<String>,
    acct: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Attachment {
    preview_url: Option<String>,
}

/// Hashtag timelines of one Mastodon instance, English posts only.
pub struct MastodonAdapter {
    fetcher: Arc<Fetcher>,
}

impl MastodonAdapter {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl SocialAdapter for MastodonAdapter {
    fn adapter_name(&self) -> &'static str {
        "mastodon"
    }

    async fn fetch(&self, source: &SocialSourceConfig) -> FetchResult<Vec<LiveItem>> {
        let options: MastodonOptions = decode_options(source)?;
        let base_url = options.instance_base_url.trim_end_matches('/');
        let tags: Vec<String> = take_configured(&options.tags, options.max_tags)
            .into_iter()
            .map(|tag| tag.trim_start_matches('#').to_string())
            .collect();

        let mut out = Vec::new();
        for tag in tags {
            let url = format!("{}/api/v1/timelines/tag/{}", base_url, tag);
            let statuses: Vec<Status> = self
                .fetcher
                .fetch_json(&url, &[("limit", options.limit_per_tag.to_string())], &[])
                .await?;

            let before = out.len();
            out.extend(statuses.into_iter().filter_map(status_to_post).map(|p| p.into_live_item(source)));
            debug!(source_id = %source.source_id, tag = %tag, posts = out.len() - before, "Mastodon tag fetched");
        }
        Ok(out)
    }
}

fn status_to_post(status: Status) -> Option<Post> {
    let content = text::clean_text(status.content.as_deref().unwrap_or_default());

    let language = status.language.as_deref().unwrap_or_default().to_lowercase();
    if !language.is_empty() && language != "en" {
        return None;
    }
    if language.is_empty() && !text::looks_english(&content) {
        return None;
    }

    let timestamp = time::parse_iso_datetime(status.created_at.as_deref()?)?;

    let title = match text::trim_with_ellipsis(&content, TITLE_SHORT_CHARS) {
        t if t.is_empty() => "Mastodon post".to_string(),
        t => t,
    };
    let author = status
        .account
        .display_name
        .filter(|n| !n.is_empty())
        .or(status.account.acct)
        .unwrap_or_default();
    let image = status.media_attachments.into_iter().find_map(|a| a.preview_url.filter(|u| !u.is_empty()));
    let url = status.url.clone().unwrap_or_default();

    Some(Post {
        raw_id: status.id.or(status.uri).or(status.url).unwrap_or_default(),
        timestamp,
        title,
        text: text::trim_with_ellipsis(&content, TEXT_CHARS),
        author,
        url,
        image,
    })
}
