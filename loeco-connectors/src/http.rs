//! Blocking HTTP client for upstream APIs
//!
//! Thin wrapper over a `ureq` agent that adds what every source needs:
//! bearer authentication, connect/read timeouts, and retries.
//!
//! ## Retry Policy
//!
//! ```text
//! 5xx, 429, transport failure → retry, delay = min(base * 2^(attempt-1), max)
//! other 4xx                   → fail immediately
//! ```
//!
//! Only the request itself is retried. Once a streaming body has started,
//! a read failure surfaces as an `io::Error` from the returned reader.
//!
//! ## Example Usage
//!
//! ```no_run
//! use loeco_connectors::http::{HttpClient, HttpConfig};
//!
//! let client = HttpClient::new(
//!     HttpConfig::new()
//!         .bearer_token("NNSXS.example")
//!         .read_timeout_secs(120),
//! )?;
//! let body = client.get_json("https://api.example.com/v3/status", &[("mac", "AA:BB")])?;
//! # Ok::<(), loeco_connectors::http::HttpError>(())
//! ```

use std::io::Read;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Transport(String),

    /// Server returned error status
    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not the expected JSON
    #[error("Invalid response body: {0}")]
    Body(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl HttpError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Body(_) | Self::Config(_) => false,
        }
    }
}

/// Authentication methods
#[derive(Clone, Debug, Default, PartialEq)]
pub enum AuthMethod {
    /// No authentication
    #[default]
    None,
    /// Bearer token
    Bearer(String),
}

/// Exponential backoff between attempts
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Attempts after the first
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// HTTP configuration
#[derive(Clone, Debug)]
pub struct HttpConfig {
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Timeout for each read; bounds how long a silent stream can stall
    pub read_timeout: Duration,
    /// Authentication method
    pub auth: AuthMethod,
    /// Extra headers sent with every request
    pub headers: Vec<(String, String)>,
    /// Retry configuration
    pub retry: RetryPolicy,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(60),
            auth: AuthMethod::None,
            headers: Vec::new(),
            retry: RetryPolicy::default(),
            user_agent: format!("LoEco/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bearer token authentication
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthMethod::Bearer(token.into());
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout = Duration::from_secs(secs);
        self
    }

    pub fn read_timeout_secs(mut self, secs: u64) -> Self {
        self.read_timeout = Duration::from_secs(secs);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Body reader of a streaming response
pub type BodyReader = Box<dyn Read + Send + Sync + 'static>;

/// Blocking client using a shared `ureq` agent
#[derive(Clone)]
pub struct HttpClient {
    config: HttpConfig,
    agent: ureq::Agent,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        if config.read_timeout.is_zero() || config.connect_timeout.is_zero() {
            return Err(HttpError::Config("timeouts must be positive".into()));
        }

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout_read(config.read_timeout)
            .user_agent(&config.user_agent)
            .build();

        Ok(Self { config, agent })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// GET `url` and parse the body as JSON
    pub fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, HttpError> {
        let response = self.get_with_retry(url, query, "application/json")?;
        let text = response
            .into_string()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| HttpError::Body(e.to_string()))
    }

    /// GET `url` and hand back the body as a reader, for long streams
    pub fn get_stream(&self, url: &str, query: &[(&str, &str)], accept: &str) -> Result<BodyReader, HttpError> {
        let response = self.get_with_retry(url, query, accept)?;
        Ok(response.into_reader())
    }

    fn build_request(&self, url: &str, query: &[(&str, &str)], accept: &str) -> ureq::Request {
        let mut request = self.agent.get(url).set("Accept", accept);
        if let AuthMethod::Bearer(token) = &self.config.auth {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }
        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }
        for (name, value) in query {
            request = request.query(name, value);
        }
        request
    }

    fn get_with_retry(&self, url: &str, query: &[(&str, &str)], accept: &str) -> Result<ureq::Response, HttpError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(HttpError::Config(format!("URL must start with http:// or https://: {url}")));
        }

        let request = self.build_request(url, query, accept);
        let retry = self.config.retry;
        let mut attempt = 0;

        loop {
            let error = match request.clone().call() {
                Ok(response) => return Ok(response),
                Err(ureq::Error::Status(status, response)) => HttpError::Status {
                    status,
                    message: response.into_string().unwrap_or_default(),
                },
                Err(ureq::Error::Transport(e)) => HttpError::Transport(e.to_string()),
            };

            if !error.is_retryable() || attempt >= retry.max_retries {
                log::warn!("GET {} failed after {} attempt(s): {}", url, attempt + 1, error);
                return Err(error);
            }

            attempt += 1;
            let delay = retry.delay(attempt);
            log::info!("GET {} failed ({}), retry {} in {:?}", url, error, attempt, delay);
            thread::sleep(delay);
        }
    }
}
