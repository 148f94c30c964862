use crate::types::{AggregatorError, FetchConfig, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};
use url::Url;

/// Shared HTTP client for every adapter: retries, per-host pacing and a size cap.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    rate_limiter: Arc<Mutex<HashMap<String, Instant>>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            rate_limiter: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET `url` and return the body as text.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.get_text_with_headers(url, &[]).await
    }

    /// GET `url` with extra request headers and return the body as text.
    pub async fn get_text_with_headers(&self, url: &str, headers: &[(&str, &str)]) -> Result<String> {
        self.apply_rate_limit(url).await?;

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 16),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.timeout_seconds * 2)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.send(url, headers).await {
                Ok(response) => {
                    let status = response.status();

                    if !status.is_success() {
                        last_error = Some(AggregatorError::General(format!(
                            "HTTP {}: {}",
                            status,
                            status.canonical_reason().unwrap_or("Unknown")
                        )));

                        // client errors will not improve on retry, except rate limiting
                        if status.is_client_error() && status != reqwest::StatusCode::TOO_MANY_REQUESTS {
                            break;
                        }
                    } else {
                        if let Some(content_length) = response.content_length() {
                            let size_mb = content_length as usize / (1024 * 1024);
                            if size_mb > self.config.max_feed_size_mb {
                                return Err(AggregatorError::TooLarge { size_mb });
                            }
                        }

                        match response.text().await {
                            Ok(body) => {
                                debug!("Fetched {} ({} bytes)", url, body.len());
                                return Ok(body);
                            }
                            Err(e) => last_error = Some(AggregatorError::Http(e)),
                        }
                    }
                }
                Err(e) => last_error = Some(e),
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                    tokio::time::sleep(delay).await;
                    continue;
                }
            }
            break;
        }

        let err = last_error.unwrap_or_else(|| AggregatorError::General("Unknown error".to_string()));
        error!("Failed to fetch {}: {}", url, err);
        Err(err)
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_headers(url, &[]).await
    }

    pub async fn get_json_with_headers<T: DeserializeOwned>(&self, url: &str, headers: &[(&str, &str)]) -> Result<T> {
        let body = self.get_text_with_headers(url, headers).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(&self, url: &str, headers: &[(&str, &str)]) -> Result<Response> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        Ok(request.send().await?)
    }

    async fn apply_rate_limit(&self, url: &str) -> Result<()> {
        let host = Url::parse(url)?.host_str().unwrap_or("").to_string();
        let min_interval = Duration::from_millis(self.config.min_host_interval_ms);

        let wait = {
            let mut limiter = self.rate_limiter.lock().await;
            let now = Instant::now();
            // reserve the next slot for this host before sleeping so concurrent callers queue up
            let slot = match limiter.get(&host) {
                Some(last) if *last + min_interval > now => *last + min_interval,
                _ => now,
            };
            limiter.insert(host.clone(), slot);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            debug!("Rate limiting {}: waiting {:?}", host, wait);
            tokio::time::sleep(wait).await;
        }

        Ok(())
    }
}
