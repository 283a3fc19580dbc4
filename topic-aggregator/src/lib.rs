pub mod types;
pub mod traits;
pub mod fetcher;
pub mod parser;
pub mod rss_utils;
pub mod sources;
pub mod registry;
pub mod cache;
pub mod aggregator;
pub mod social;
pub mod config;

pub use types::*;
pub use traits::{SocialAdapter, SourceAdapter};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use registry::{AdapterRegistry, Registry, SocialRegistry};
pub use cache::TtlCache;
pub use aggregator::TopicAggregator;
pub use social::SocialAggregator;
pub use config::{AppConfig, ConfigError, FileConfigProvider, Settings};
