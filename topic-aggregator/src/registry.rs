use crate::fetcher::Fetcher;
use crate::social::{BlueskyApiAdapter, BlueskyLinksAdapter, HackerNewsAdapter, MastodonAdapter, RedditAdapter};
use crate::sources::{ArxivAdapter, MlbAdapter, RssFeedAdapter};
use crate::traits::{SocialAdapter, SourceAdapter};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Maps a source-type tag from configuration to the adapter that serves it.
/// Lookup is the only extension point: a tag nobody registered resolves to
/// `None` and the source is skipped.
pub struct Registry<A: ?Sized> {
    adapters: HashMap<String, Arc<A>>,
}

pub type AdapterRegistry = Registry<dyn SourceAdapter>;
pub type SocialRegistry = Registry<dyn SocialAdapter>;

impl<A: ?Sized> Registry<A> {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register an adapter under `tag`, replacing any previous one
    pub fn register_adapter(&mut self, tag: impl Into<String>, adapter: Arc<A>) {
        let tag = tag.into();
        debug!("Registering adapter: {}", tag);
        self.adapters.insert(tag, adapter);
    }

    /// Get an adapter by tag
    pub fn get_adapter(&self, tag: &str) -> Option<Arc<A>> {
        self.adapters.get(tag).cloned()
    }

    /// Registered tags, sorted
    pub fn list_adapters(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.adapters.keys().cloned().collect();
        tags.sort();
        tags
    }
}

impl<A: ?Sized> Default for Registry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry<dyn SourceAdapter> {
    /// `rss`, `arxiv` and `mlb`, all sharing one HTTP client
    pub fn with_defaults(fetcher: Arc<Fetcher>) -> Self {
        let mut registry = Self::new();
        registry.register_adapter("rss", Arc::new(RssFeedAdapter::new(fetcher.clone())));
        registry.register_adapter("arxiv", Arc::new(ArxivAdapter::new(fetcher.clone())));
        registry.register_adapter("mlb", Arc::new(MlbAdapter::new(fetcher)));
        registry
    }
}

impl Registry<dyn SocialAdapter> {
    /// `mastodon`, `reddit`, `hackernews`, `bluesky_api` and `bluesky_links`
    pub fn with_defaults(fetcher: Arc<Fetcher>) -> Self {
        let mut registry = Self::new();
        registry.register_adapter("mastodon", Arc::new(MastodonAdapter::new(fetcher.clone())));
        registry.register_adapter("reddit", Arc::new(RedditAdapter::new(fetcher.clone())));
        registry.register_adapter("hackernews", Arc::new(HackerNewsAdapter::new(fetcher.clone())));
        registry.register_adapter("bluesky_api", Arc::new(BlueskyApiAdapter::new(fetcher)));
        registry.register_adapter("bluesky_links", Arc::new(BlueskyLinksAdapter));
        registry
    }
}
