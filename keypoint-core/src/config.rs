//! Client configuration
//!
//! The service address and request timeout are read once from the
//! environment and then passed explicitly to the gateway and the session
//! controller.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the extraction service base address.
pub const API_URL_ENV: &str = "KEYPOINT_API_URL";

/// Environment variable holding the request timeout in seconds.
pub const API_TIMEOUT_ENV: &str = "KEYPOINT_API_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:5001";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base address every API path and output image path is resolved against.
    pub base_url: Url,
    /// Upper bound for a single request, including the extraction call.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("keypoint-lab/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional: `KEYPOINT_API_URL` (default `http://localhost:5001`),
    /// `KEYPOINT_API_TIMEOUT_SECS` (default 30).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with a substitutable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.base_url = parse_base_url(&url)?;
        }

        if let Some(secs) = lookup(API_TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            config.timeout = parse_timeout_secs(&secs)?;
        }

        tracing::debug!(
            base_url = %config.base_url,
            timeout_secs = config.timeout.as_secs(),
            "Loaded client configuration"
        );

        Ok(config)
    }

    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(url)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Join an API or output path onto the base address.
    ///
    /// The path is appended to the base (including any path prefix the base
    /// carries) with exactly one `/` at the seam. Absolute URLs are returned
    /// unchanged.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        if let Ok(absolute) = Url::parse(path) {
            return Ok(absolute);
        }

        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|e| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl {
            value: value.to_string(),
            reason: "URL cannot be used as a base".into(),
        });
    }

    Ok(url)
}

fn parse_timeout_secs(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidTimeout(value.to_string())),
    }
}
