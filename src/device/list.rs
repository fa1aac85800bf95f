//! Directory listing requests.

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::{DeviceClient, DeviceError, to_device_path};
use crate::listing::{Entry, parse_directory_listing};

impl DeviceClient {
    /// Lists one directory on the card (`GET /dir?dir=<device path>`).
    ///
    /// `path` is slash-separated and relative to the card root (`/` for the root).
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotFound`] if the card answers 404
    /// - [`DeviceError::UnexpectedStatus`] for any other non-200 answer
    /// - [`DeviceError::InvalidListing`] if the index page cannot be parsed
    /// - transport errors once retries are exhausted, or [`DeviceError::Cancelled`]
    #[instrument(skip(self, cancel))]
    pub async fn list_directory(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Entry>, DeviceError> {
        let url = self.build_url("/dir", "dir", &to_device_path(path));
        self.retry
            .run(cancel, || self.list_directory_once(path, &url))
            .await
    }

    async fn list_directory_once(&self, path: &str, url: &Url) -> Result<Vec<Entry>, DeviceError> {
        let response = self.send(self.http.get(url.clone()), url).await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(DeviceError::not_found(path)),
            status => return Err(DeviceError::unexpected_status(url.as_str(), status.as_u16())),
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DeviceError::from_reqwest(url.as_str(), e))?;

        // Pages are served as gb2312; names are ASCII in practice.
        let html = String::from_utf8_lossy(&body);
        let entries =
            parse_directory_listing(&html).map_err(|e| DeviceError::invalid_listing(path, e))?;

        debug!(count = entries.len(), "listed directory");
        Ok(entries)
    }
}
