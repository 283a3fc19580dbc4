pub mod arxiv;
pub mod mlb;
pub mod rss_feed;

pub use arxiv::ArxivAdapter;
pub use mlb::MlbAdapter;
pub use rss_feed::RssFeedAdapter;
