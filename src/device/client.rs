//! HTTP client wrapper for the card's embedded web server.
//!
//! [`DeviceClient`] owns one pooled `reqwest::Client` and the retry policy
//! derived from its [`ClientConfig`]. Listing, download, and version requests
//! are implemented in sibling modules as further `impl DeviceClient` blocks.

use reqwest::{Client, Proxy, RequestBuilder, Response};
use tracing::{debug, instrument};
use url::Url;

use super::config::CONNECT_TIMEOUT;
use super::{ClientConfig, DeviceError, RetryPolicy};

/// HTTP client for one EZ-Share card.
///
/// Create once per run and reuse; requests are issued strictly sequentially.
///
/// # Example
///
/// ```no_run
/// use ezshare_sync::{ClientConfig, DeviceClient};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DeviceClient::new(ClientConfig::new("http://192.168.4.1")?)?;
/// let entries = client.list_directory("/", &CancellationToken::new()).await?;
/// for entry in entries {
///     println!("{} {}", entry.name, entry.size);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeviceClient {
    pub(super) http: Client,
    pub(super) config: ClientConfig,
    pub(super) retry: RetryPolicy,
}

impl DeviceClient {
    /// Creates a client from `config`.
    ///
    /// Without a SOCKS5 proxy, system and environment proxies are ignored:
    /// the card is always on the local network.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::ClientBuild`] if the proxy address is invalid or
    /// the HTTP client cannot be built.
    #[instrument(level = "debug", skip(config), fields(base_url = %config.base_url()))]
    pub fn new(config: ClientConfig) -> Result<Self, DeviceError> {
        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.timeout())
            .gzip(true)
            .user_agent(config.user_agent())
            .pool_max_idle_per_host(1);

        builder = match config.socks5_proxy() {
            Some(address) => {
                let proxy_url = if address.contains("://") {
                    address.to_string()
                } else {
                    format!("socks5://{address}")
                };
                debug!(proxy = %proxy_url, "routing device traffic through SOCKS5 proxy");
                let proxy = Proxy::all(proxy_url.as_str())
                    .map_err(|source| DeviceError::ClientBuild { source })?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        let http = builder
            .build()
            .map_err(|source| DeviceError::ClientBuild { source })?;
        let retry = RetryPolicy::new(config.max_retries(), config.backoff_base());

        Ok(Self {
            http,
            config,
            retry,
        })
    }

    /// Returns the configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the retry policy applied to every request.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Builds `<base><path>?<param>=<value>` with the value query-encoded.
    pub(super) fn build_url(&self, path: &str, param: &str, value: &str) -> Url {
        let mut url = self.config.base_url().clone();
        url.set_path(path);
        url.set_query(None);
        url.query_pairs_mut().append_pair(param, value);
        url
    }

    /// Resolves an entry locator: absolute URLs are used as-is, anything else
    /// is joined onto the base URL.
    pub(super) fn resolve_url(&self, locator: &str) -> Result<Url, DeviceError> {
        match Url::parse(locator) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .config
                .base_url()
                .join(locator)
                .map_err(|_| DeviceError::invalid_url(locator)),
            Err(_) => Err(DeviceError::invalid_url(locator)),
        }
    }

    /// Sends `request`, mapping transport failures and 5xx answers.
    ///
    /// A 5xx response is dropped here so its connection is released before
    /// the retry loop issues the next attempt.
    pub(super) async fn send(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<Response, DeviceError> {
        let response = request
            .send()
            .await
            .map_err(|e| DeviceError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(DeviceError::server_error(url.as_str(), status.as_u16()));
        }

        debug!(status = status.as_u16(), url = %url, "device responded");
        Ok(response)
    }
}
