use crate::config::HttpConfig;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio_retry::Retry;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};
use url::Url;

/// Failure modes of a single fetch attempt. Both are retryable: upstream APIs
/// occasionally return truncated or non-JSON bodies under load.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("bad URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reusable retrying JSON client. Every fetcher in the crate goes through
/// this; retry count, timeout and backoff come from `HttpConfig`.
pub struct RetryingClient {
    inner: reqwest::Client,
    config: HttpConfig,
}

impl RetryingClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// GET a URL and decode the JSON body, retrying with exponential backoff.
    ///
    /// Up to `max_retries` attempts; the last error is propagated once the
    /// backoff schedule is exhausted. No jitter, no rate limiting.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let attempts = self.config.max_retries.max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(self.config.backoff_base_ms.max(2) / 2)
            .take(attempts as usize - 1);

        let attempt = AtomicU32::new(0);
        Retry::spawn(strategy, || async {
            let n = attempt.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("GET {} (attempt {}/{})", url, n, attempts);

            match self.get_json_once(url).await {
                Ok(v) => Ok(v),
                Err(e) => {
                    warn!("GET {} attempt {}/{} failed: {}", url, n, attempts, e);
                    Err(e)
                }
            }
        })
        .await
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        let body = self
            .inner
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Build a URL from a base endpoint and query parameters.
pub fn url_with_params<I, K, V>(base: &str, params: I) -> Result<Url, url::ParseError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Url::parse_with_params(base, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_with_params() {
        let url = url_with_params(
            "https://gamma-api.polymarket.com/markets",
            [("limit", "200"), ("offset", "400")],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://gamma-api.polymarket.com/markets?limit=200&offset=400"
        );
    }

    #[test]
    fn test_backoff_schedule_is_bounded() {
        let strategy = ExponentialBackoff::from_millis(2).factor(500).take(3);
        let delays: Vec<Duration> = strategy.collect();
        assert_eq!(delays.len(), 3);
        assert_eq!(delays[0], Duration::from_millis(1000));
        assert!(delays[1] > delays[0]);
        assert!(delays[2] > delays[1]);
    }
}
