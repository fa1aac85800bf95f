//! Connection settings for a [`DeviceClient`](super::DeviceClient).

use std::time::Duration;

use url::Url;

use super::DeviceError;
use super::retry::{DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES};
use crate::user_agent;

/// Default address of the card when it runs its own access point.
pub const DEFAULT_BASE_URL: &str = "http://192.168.4.1";

/// Total per-request timeout, body transfer included (3 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

/// TCP connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Immutable client configuration built with consuming `with_*` methods.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ezshare_sync::ClientConfig;
///
/// # fn main() -> Result<(), ezshare_sync::DeviceError> {
/// let config = ClientConfig::new("192.168.4.1")?
///     .with_timeout(Duration::from_secs(60))
///     .with_max_retries(5);
/// assert_eq!(config.base_url().as_str(), "http://192.168.4.1/");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    socks5_proxy: Option<String>,
    timeout: Duration,
    max_retries: u32,
    user_agent: String,
    backoff_base: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the card at `base_url`.
    ///
    /// A URL without a scheme gets `http://` prepended.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::InvalidUrl`] if the URL cannot be parsed or has no host.
    pub fn new(base_url: &str) -> Result<Self, DeviceError> {
        let trimmed = base_url.trim();
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{trimmed}")
        };

        let parsed = Url::parse(&candidate).map_err(|_| DeviceError::invalid_url(base_url))?;
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(DeviceError::invalid_url(base_url));
        }

        Ok(Self {
            base_url: parsed,
            socks5_proxy: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: user_agent::default_user_agent(),
            backoff_base: DEFAULT_BACKOFF_BASE,
        })
    }

    /// Routes all traffic through a SOCKS5 proxy at `host:port`.
    #[must_use]
    pub fn with_socks5_proxy(mut self, address: impl Into<String>) -> Self {
        self.socks5_proxy = Some(address.into());
        self
    }

    /// Sets the total per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times a transient failure is retried.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Overrides the User-Agent header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the delay before the first retry; later retries double it.
    #[must_use]
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Base URL of the card.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// SOCKS5 proxy address, if traffic is tunnelled.
    #[must_use]
    pub fn socks5_proxy(&self) -> Option<&str> {
        self.socks5_proxy.as_deref()
    }

    /// Per-request timeout, body transfer included.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retries after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// User-Agent sent with every request.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Delay before the first retry.
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        self.backoff_base
    }
}
