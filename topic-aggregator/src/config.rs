use crate::rss_utils::url::is_valid_feed_url;
use crate::types::{ConfigProvider, FetchConfig, SocialConfig, SocialSourceConfig, TopicConfig};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

const ENV_PREFIX: &str = "AGGREGATOR_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid {section} entry #{index}: {reason}")]
    InvalidEntry {
        section: &'static str,
        index: usize,
        reason: String,
    },
}

/// Process settings from `AGGREGATOR_*` environment variables.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub topic_cache_ttl: Duration,
    pub source_timeout: Duration,
    pub social_cache_ttl: Duration,
    pub social_source_timeout: Duration,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config/topics.yaml"),
            topic_cache_ttl: Duration::from_secs(30),
            source_timeout: Duration::from_secs(20),
            social_cache_ttl: Duration::from_secs(15),
            social_source_timeout: Duration::from_secs(8),
            http_timeout: Duration::from_secs(12),
            user_agent: FetchConfig::default().user_agent,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source. Keys are looked up
    /// with the `AGGREGATOR_` prefix.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty());

        Self {
            config_path: get("CONFIG_PATH").map(PathBuf::from).unwrap_or(defaults.config_path),
            topic_cache_ttl: seconds(&get, "TOPIC_CACHE_TTL_SECONDS", defaults.topic_cache_ttl),
            source_timeout: seconds(&get, "SOURCE_TIMEOUT_SECONDS", defaults.source_timeout),
            social_cache_ttl: seconds(&get, "SOCIAL_CACHE_TTL_SECONDS", defaults.social_cache_ttl),
            social_source_timeout: seconds(&get, "SOCIAL_SOURCE_TIMEOUT_SECONDS", defaults.social_source_timeout),
            http_timeout: seconds(&get, "HTTP_TIMEOUT_SECONDS", defaults.http_timeout),
            user_agent: get("USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout_seconds: self.http_timeout.as_secs(),
            ..FetchConfig::default()
        }
    }
}

fn seconds<G>(get: &G, name: &str, default: Duration) -> Duration
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get(name), name, default.as_secs()).map_or(default, Duration::from_secs)
}

fn parse_or<T: FromStr + Copy>(raw: Option<String>, name: &str, default: T) -> Option<T> {
    let raw = raw?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = %format!("{}{}", ENV_PREFIX, name), value = %raw, "Unparseable setting, using default");
            Some(default)
        }
    }
}

/// Topics and live-social sources loaded from one YAML file.
///
/// Holds every parsed topic, disabled ones included; the `ConfigProvider`
/// view only exposes enabled topics.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub topics: Vec<TopicConfig>,
    pub social: SocialConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SocialSection {
    refresh_interval_seconds: u64,
    interleaved_limit: usize,
    sources: Vec<Value>,
}

impl Default for SocialSection {
    fn default() -> Self {
        let defaults = SocialConfig::default();
        Self {
            refresh_interval_seconds: defaults.refresh_interval_seconds,
            interleaved_limit: defaults.interleaved_limit,
            sources: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read `path`. A missing file is an empty configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, starting with no topics");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        info!(
            path = %path.display(),
            topics = config.topics.len(),
            social_sources = config.social.sources.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse a whole document. Malformed entries are logged and skipped; only
    /// a document that is not YAML at all is an error.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_yaml::from_str(content)?;
        if root.is_null() {
            return Ok(Self::default());
        }

        let topics = parse_rows(root.get("topics"), "topics", parse_topic);

        let social = match root.get("live_social") {
            Some(section) if section.is_mapping() => parse_social(section.clone()),
            Some(section) if !section.is_null() => {
                warn!("live_social is not a mapping, ignoring it");
                SocialConfig::default()
            }
            _ => SocialConfig::default(),
        };

        Ok(Self { topics, social })
    }
}

impl ConfigProvider for AppConfig {
    fn topics(&self) -> Vec<TopicConfig> {
        self.topics.iter().filter(|t| t.enabled).cloned().collect()
    }

    fn social(&self) -> SocialConfig {
        self.social.clone()
    }
}

/// Re-reads the YAML file on every call, so edits show up without a restart.
/// A file that fails to load reads as empty.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> AppConfig {
        AppConfig::load(&self.path).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "Failed to load config");
            AppConfig::default()
        })
    }
}

impl ConfigProvider for FileConfigProvider {
    fn topics(&self) -> Vec<TopicConfig> {
        self.load().topics()
    }

    fn social(&self) -> SocialConfig {
        self.load().social
    }
}

fn parse_rows<T>(
    rows: Option<&Value>,
    section: &'static str,
    parse: impl Fn(Value) -> Result<T, String>,
) -> Vec<T> {
    let Some(rows) = rows.and_then(Value::as_sequence) else {
        return Vec::new();
    };

    rows.iter()
        .enumerate()
        .filter_map(|(index, row)| match parse(row.clone()) {
            Ok(parsed) => Some(parsed),
            Err(reason) => {
                let err = ConfigError::InvalidEntry { section, index, reason };
                warn!(error = %err, "Skipping config entry");
                None
            }
        })
        .collect()
}

fn parse_topic(row: Value) -> Result<TopicConfig, String> {
    let mut topic: TopicConfig = serde_yaml::from_value(row).map_err(|e| e.to_string())?;
    if topic.topic_id.trim().is_empty() {
        return Err("topic_id is empty".to_string());
    }

    topic.sources.retain(|source| {
        let valid = is_valid_feed_url(&source.url);
        if !valid {
            warn!(topic_id = %topic.topic_id, source_id = %source.source_id, url = %source.url, "Dropping source with invalid URL");
        }
        valid
    });
    Ok(topic)
}

fn parse_social_source(row: Value) -> Result<SocialSourceConfig, String> {
    let mut source: SocialSourceConfig = serde_yaml::from_value(row).map_err(|e| e.to_string())?;
    source.source_id = source.source_id.trim().to_string();
    if source.source_id.is_empty() {
        return Err("source_id is empty".to_string());
    }
    Ok(source)
}

fn parse_social(section: Value) -> SocialConfig {
    let section: SocialSection = match serde_yaml::from_value(section) {
        Ok(section) => section,
        Err(e) => {
            warn!(error = %e, "Invalid live_social section, using defaults");
            return SocialConfig::default();
        }
    };

    let rows = Value::Sequence(section.sources);
    SocialConfig {
        refresh_interval_seconds: section.refresh_interval_seconds,
        interleaved_limit: section.interleaved_limit,
        sources: parse_rows(Some(&rows), "live_social.sources", parse_social_source),
    }
}
