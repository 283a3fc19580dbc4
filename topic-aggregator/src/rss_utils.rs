/// Shared helpers for the feed and social adapters

/// Text normalization for titles and summaries
pub mod text {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").unwrap());
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    static RE_URLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
    static RE_TAGS_AND_MENTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#@]\w+").unwrap());
    static RE_WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z]+").unwrap());

    const COMMON_EN: &[&str] = &[
        "the", "and", "for", "with", "this", "that", "from", "you", "your", "have",
        "will", "new", "today", "about", "news", "ai", "model", "openai",
    ];

    /// Strip markup, decode entities and collapse whitespace.
    pub fn clean_text(value: &str) -> String {
        let without_tags = RE_TAGS.replace_all(value, " ");
        let decoded = html_escape::decode_html_entities(&without_tags);
        RE_WS.replace_all(&decoded, " ").trim().to_string()
    }

    /// Collapse runs of whitespace without touching markup.
    pub fn collapse_whitespace(value: &str) -> String {
        RE_WS.replace_all(value, " ").trim().to_string()
    }

    /// Hard cap on length, counted in characters.
    pub fn cap_chars(value: &str, max_chars: usize) -> String {
        value.chars().take(max_chars).collect()
    }

    /// Trim to at most `max_chars` characters, marking the cut with an ellipsis.
    pub fn trim_with_ellipsis(value: &str, max_chars: usize) -> String {
        let txt = value.trim();
        if txt.chars().count() <= max_chars {
            return txt.to_string();
        }
        let head: String = txt.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", head.trim_end())
    }

    /// Cheap guess at whether an untagged post is English.
    pub fn looks_english(value: &str) -> bool {
        let lowered = value.trim().to_lowercase();
        let stripped = RE_URLS.replace_all(&lowered, " ");
        let stripped = RE_TAGS_AND_MENTIONS.replace_all(&stripped, " ");
        let text = collapse_whitespace(&stripped);
        if text.is_empty() {
            return false;
        }

        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            return false;
        }
        let ascii = letters.iter().filter(|c| c.is_ascii_lowercase()).count();
        let ascii_ratio = ascii as f64 / letters.len() as f64;
        if ascii_ratio < 0.85 {
            return false;
        }

        let tokens: Vec<&str> = RE_WORDS.find_iter(&text).map(|m| m.as_str()).collect();
        if tokens.len() < 3 {
            return ascii_ratio >= 0.95;
        }
        tokens.iter().any(|t| COMMON_EN.contains(t))
    }
}

/// Stable identifiers
pub mod ids {
    use sha2::{Digest, Sha256};

    /// Content id of an item: sha256 over `topic|source|url`, hex encoded.
    pub fn item_id(topic_id: &str, source_id: &str, url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}|{}|{}", topic_id, source_id, url).as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// URL utilities for configured sources
pub mod url {
    use url::Url;

    /// Only http(s) sources can be fetched
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => url.scheme() == "http" || url.scheme() == "https",
            Err(_) => false,
        }
    }
}

/// Timestamp parsing and ordering
pub mod time {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

    /// ISO-8601 / RFC 3339, with `Z` accepted; a missing offset is taken as UTC.
    pub fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn from_unix(seconds: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(seconds, 0).single()
    }

    /// Ordering key for freshness sort: undated items count as the epoch.
    pub fn sort_key(value: Option<DateTime<Utc>>) -> DateTime<Utc> {
        value.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}
