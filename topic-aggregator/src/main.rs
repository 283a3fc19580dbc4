use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use topic_aggregator::{
    AdapterRegistry, ConfigProvider, Fetcher, FileConfigProvider, Settings, SocialAggregator, SocialRegistry,
    TopicAggregator, TtlCache,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "topic-aggregator", about = "Topic feeds and live social posts, aggregated and cached")]
struct Cli {
    /// Overrides AGGREGATOR_CONFIG_PATH
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List enabled topics
    Topics,
    /// Aggregated items of one topic
    Items {
        topic_id: String,
        #[arg(long)]
        force: bool,
    },
    /// One item of a topic by id
    Item { topic_id: String, item_id: String },
    /// Interleaved live social feed
    Social {
        #[arg(long)]
        force: bool,
    },
    /// Latest posts of one social source
    SocialSource {
        source_id: String,
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(path) = cli.config {
        settings.config_path = path;
    }
    info!(config = %settings.config_path.display(), "Starting topic aggregator");

    let provider: Arc<dyn ConfigProvider> = Arc::new(FileConfigProvider::new(settings.config_path.clone()));
    let fetcher = Arc::new(Fetcher::new(settings.fetch_config()).context("failed to build HTTP client")?);

    let topics = TopicAggregator::new(
        provider.clone(),
        Arc::new(AdapterRegistry::with_defaults(fetcher.clone())),
        TtlCache::new(settings.topic_cache_ttl),
        settings.source_timeout,
    );
    let social = SocialAggregator::new(
        provider,
        Arc::new(SocialRegistry::with_defaults(fetcher)),
        TtlCache::new(settings.social_cache_ttl),
        settings.social_source_timeout,
    );

    match cli.command {
        Command::Topics => print_json(&topics.list_topics()),
        Command::Items { topic_id, force } => print_json(&topics.get_items(&topic_id, force).await?),
        Command::Item { topic_id, item_id } => print_json(&topics.get_item(&topic_id, &item_id).await?),
        Command::Social { force } => print_json(&social.fetch_all(force).await),
        Command::SocialSource { source_id, force } => print_json(&social.fetch_source(&source_id, force).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
