use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Url;

/// Chat-completions endpoint of the local inference server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/v1/chat/completions";

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub endpoint: Url,
    /// `None` waits on the server indefinitely.
    pub request_timeout: Option<Duration>,
    pub headers: HeaderMap,
}

impl BenchmarkConfig {
    pub fn try_new(endpoint: impl AsRef<str>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref())
            .with_context(|| format!("invalid endpoint URL: {}", endpoint.as_ref()))?;

        match endpoint.scheme() {
            "http" | "https" => {}
            other => return Err(anyhow!("unsupported endpoint scheme: {}", other)),
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            endpoint,
            request_timeout: None,
            headers,
        })
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        if !request_timeout.is_zero() {
            self.request_timeout = Some(request_timeout);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_local_server() {
        let config = BenchmarkConfig::try_new(DEFAULT_ENDPOINT).unwrap();
        assert_eq!(config.endpoint.host_str(), Some("localhost"));
        assert_eq!(config.endpoint.port(), Some(11434));
        assert_eq!(config.endpoint.path(), "/v1/chat/completions");
        assert!(config.request_timeout.is_none());
        assert_eq!(
            config.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!(BenchmarkConfig::try_new("not a url").is_err());
        assert!(BenchmarkConfig::try_new("ftp://localhost/v1/chat/completions").is_err());
    }

    #[test]
    fn zero_timeout_leaves_timeout_unset() {
        let config = BenchmarkConfig::try_new(DEFAULT_ENDPOINT)
            .unwrap()
            .with_request_timeout(Duration::ZERO);
        assert!(config.request_timeout.is_none());

        let config = config.with_request_timeout(Duration::from_secs(30));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
    }
}
