//! Authenticated HTTP transport
//!
//! The retry policy lives here and nowhere else: datasources and the
//! repository see either a decoded response or a definite error.

use crate::{EnvironmentConfig, Error, Result};
use async_trait::async_trait;
use http::Method;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry configuration for network operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum retry attempts
    pub max_attempts: u32,
    /// Initial backoff duration
    pub initial_backoff: Duration,
    /// Maximum backoff duration
    pub max_backoff: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// A logical API request
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base URL
    pub path: String,
    /// Optional JSON body
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    /// POST request with a JSON body
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: Some(body),
        }
    }

    /// PUT request with a JSON body
    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::PUT,
            path: path.into(),
            body: Some(body),
        }
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            body: None,
        }
    }
}

/// Authenticated transport executing logical requests
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Execute a request and return the decoded JSON body
    async fn execute(&self, request: ApiRequest) -> Result<serde_json::Value>;
}

/// reqwest-backed transport with session authentication and backoff
pub struct HttpTransport {
    client: reqwest::Client,
    config: EnvironmentConfig,
    retry: RetryConfig,
}

impl HttpTransport {
    /// Build a transport for one session
    pub fn new(config: EnvironmentConfig) -> Result<Self> {
        Self::with_retry(config, RetryConfig::default())
    }

    /// Build with an explicit retry policy
    pub fn with_retry(config: EnvironmentConfig, retry: RetryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(Error::Transport)?;
        Ok(Self {
            client,
            config,
            retry,
        })
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute_once(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url_for(&request.path))
            .header("X-App-Version", &self.config.app_version)
            .header("X-Session-Id", &self.config.session_id)
            .bearer_auth(&self.config.access_token);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<serde_json::Value> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                "{} {} (attempt {}/{})",
                request.method, request.path, attempt, self.retry.max_attempts
            );

            let outcome = self.execute_once(&request).await;
            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json().await?);
                    }
                    let message = response.text().await.unwrap_or_default();
                    if is_retryable_status(status) && attempt < self.retry.max_attempts {
                        warn!(
                            "{} {} returned {}, retrying in {:?}",
                            request.method, request.path, status, backoff
                        );
                    } else {
                        return Err(Error::Api {
                            status: status.as_u16(),
                            message,
                        });
                    }
                }
                Err(Error::Transport(e))
                    if (e.is_connect() || e.is_timeout()) && attempt < self.retry.max_attempts =>
                {
                    warn!(
                        "{} {} failed ({}), retrying in {:?}",
                        request.method, request.path, e, backoff
                    );
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(backoff).await;
            backoff = std::cmp::min(
                backoff.mul_f64(self.retry.backoff_multiplier),
                self.retry.max_backoff,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining_tolerates_slashes() {
        let config =
            EnvironmentConfig::new("https://api.test/", "1.0.0", "u1", "s1", "token");
        let transport = HttpTransport::new(config).unwrap();
        assert_eq!(
            transport.url_for("/pass/v1/share"),
            "https://api.test/pass/v1/share"
        );
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(reqwest::StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(reqwest::StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(reqwest::StatusCode::NOT_FOUND));
    }
}
