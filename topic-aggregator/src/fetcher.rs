use crate::types::{FetchConfig, FetchError, FetchResult};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

/// Shared HTTP client for every adapter. Holds no per-source state, so one
/// instance is safe to use from all fan-out tasks at once.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> FetchResult<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// GET `url` and return the body as text (feeds, Atom API responses).
    pub async fn fetch_text(&self, url: &str) -> FetchResult<String> {
        let response = self.send(self.client.get(url), url).await?;
        let content = response.text().await?;
        debug!(url, bytes = content.len(), "fetched text body");
        Ok(content)
    }

    /// GET `url` with query parameters and extra headers, decoding a JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> FetchResult<T> {
        let mut request = self.client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = self.send(request, url).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> FetchResult<Response> {
        let start_time = Instant::now();
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(FetchError::TooLarge {
                    url: url.to_string(),
                    size_mb,
                });
            }
        }

        debug!(
            url,
            status = status.as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "response received"
        );
        Ok(response)
    }
}
