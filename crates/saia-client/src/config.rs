//! Client and polling configuration.

use std::time::Duration;

use url::Url;

use crate::error::{ApiError, ApiResult};

/// Poll interval used when none (or zero) is given.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

// =============================================================================
// Polling
// =============================================================================

/// How a task set is polled.
///
/// The timeout and attempt ceiling are off by default, so polling runs until
/// the service reports a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay before each status query.
    pub interval: Duration,
    /// Give up after this much time.
    pub timeout: Option<Duration>,
    /// Give up after this many status queries.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            max_attempts: None,
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let interval_ms: u64 = std::env::var("SAIA_POLL_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL.as_millis() as u64);

        Self {
            interval: Duration::from_millis(interval_ms),
            timeout: std::env::var("SAIA_POLL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            max_attempts: std::env::var("SAIA_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
        .normalized()
    }

    /// Replace the interval; zero falls back to the default.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self.normalized()
    }

    /// Set the polling deadline; zero disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self.normalized()
    }

    /// Set the attempt ceiling; zero disables it.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self.normalized()
    }

    fn normalized(mut self) -> Self {
        if self.interval.is_zero() {
            self.interval = DEFAULT_POLL_INTERVAL;
        }
        self.timeout = self.timeout.filter(|timeout| !timeout.is_zero());
        self.max_attempts = self.max_attempts.filter(|max| *max > 0);
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// SAIA API client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// API base url, always ending with `/`.
    pub api_host: String,
    /// API key sent as `Authorization: APIKey {key}`.
    pub api_key: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Polling behaviour
    pub poll: PollConfig,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_host", &self.api_host)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("poll", &self.poll)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config with default timeouts.
    pub fn new(api_host: impl Into<String>, api_key: impl Into<String>) -> ApiResult<Self> {
        let api_host = normalize_host(&api_host.into())?;
        let api_key = api_key.into();

        if api_key.trim().is_empty() {
            return Err(ApiError::config("You need to specify API key"));
        }

        Ok(Self {
            api_host,
            api_key,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            poll: PollConfig::default(),
        })
    }

    /// Create config from environment variables.
    pub fn from_env() -> ApiResult<Self> {
        let api_host = std::env::var("SAIA_API_HOST")
            .map_err(|_| ApiError::config("SAIA_API_HOST must be set"))?;
        let api_key = std::env::var("SAIA_API_KEY")
            .map_err(|_| ApiError::config("SAIA_API_KEY must be set"))?;

        let timeout_secs: u64 = std::env::var("SAIA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("SAIA_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            poll: PollConfig::from_env(),
            ..Self::new(api_host, api_key)?
        })
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Parsed base url.
    pub fn base_url(&self) -> ApiResult<Url> {
        Url::parse(&self.api_host).map_err(|e| ApiError::config(format!("Invalid API host: {}", e)))
    }
}

fn normalize_host(host: &str) -> ApiResult<String> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ApiError::config("You need to specify API host URL"));
    }

    let url = Url::parse(host).map_err(|e| ApiError::config(format!("Invalid API host: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::config(format!(
            "Unsupported API host scheme: {}",
            url.scheme()
        )));
    }

    let mut normalized = url.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}

// =============================================================================
// Tests
// =============================================================================
