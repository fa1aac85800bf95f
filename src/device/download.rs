//! File downloads with HTTP range resume.
//!
//! Large files are resumed from an existing partial copy with a
//! `Range: bytes=N-` request. The card's range support is unreliable, so every
//! answer is checked:
//!
//! - `206` must start exactly at the requested offset (checked via `Content-Range`)
//! - `200` means the range was ignored, and the file is rewritten from zero
//! - `416` means the partial copy is longer than the remote file; restart in full
//!
//! Each retry attempt re-checks the partial file, so a transfer that times out
//! halfway resumes from where it stopped on the next attempt.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::{Response, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{DeviceClient, DeviceError, to_device_path};
use crate::listing::Entry;

/// Files smaller than this are always downloaded in full (100 KiB).
pub const MIN_RESUMABLE_SIZE: u64 = 100 * 1024;

/// Returns the resume offset for a partial file at `path`, if it can be resumed.
///
/// A partial file is resumable only if it exists, is non-empty, and is
/// strictly smaller than `expected_size`.
pub async fn validate_partial_file(path: &Path, expected_size: u64) -> Option<u64> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let len = metadata.len();
    (metadata.is_file() && len > 0 && len < expected_size).then_some(len)
}

impl DeviceClient {
    /// Downloads `entry` to `dest`, resuming a partial copy when worthwhile.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotFound`] if the card answers 404
    /// - [`DeviceError::RangeMismatch`] / [`DeviceError::MissingContentRange`]
    ///   if a `206` answer does not continue at the local length
    /// - [`DeviceError::Io`] if the local file cannot be written
    /// - transport errors once retries are exhausted, or [`DeviceError::Cancelled`]
    #[instrument(skip(self, entry, cancel), fields(name = %entry.name, size = entry.size, dest = %dest.display()))]
    pub async fn download_file(
        &self,
        entry: &Entry,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), DeviceError> {
        let url = self.resolve_url(&entry.url)?;
        self.retry
            .run(cancel, || self.download_attempt(&url, entry.size, dest))
            .await
    }

    /// Downloads the file at slash-separated `file_path` (`GET /download?file=…`).
    ///
    /// The size is not known up front, so the file is always downloaded in full.
    ///
    /// # Errors
    ///
    /// Same as [`download_file`](Self::download_file), minus the range errors.
    #[instrument(skip(self, cancel), fields(dest = %dest.display()))]
    pub async fn download_file_by_path(
        &self,
        file_path: &str,
        dest: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), DeviceError> {
        let url = self.build_url("/download", "file", &to_device_path(file_path));
        self.retry
            .run(cancel, || self.download_full(&url, dest))
            .await
    }

    /// Opens `entry` for streaming and returns the successful (200) response.
    ///
    /// The caller owns the body and must consume or drop it.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::NotFound`] if the card answers 404
    /// - [`DeviceError::UnexpectedStatus`] for any other non-200 answer
    /// - transport errors once retries are exhausted, or [`DeviceError::Cancelled`]
    #[instrument(skip(self, entry, cancel), fields(name = %entry.name))]
    pub async fn open_file(
        &self,
        entry: &Entry,
        cancel: &CancellationToken,
    ) -> Result<Response, DeviceError> {
        let url = self.resolve_url(&entry.url)?;
        let url = &url;
        self.retry
            .run(cancel, || async move {
                let response = self.send(self.http.get(url.clone()), url).await?;
                check_full_status(&response, url)?;
                Ok(response)
            })
            .await
    }

    async fn download_attempt(
        &self,
        url: &Url,
        expected_size: u64,
        dest: &Path,
    ) -> Result<(), DeviceError> {
        if expected_size >= MIN_RESUMABLE_SIZE
            && let Some(offset) = validate_partial_file(dest, expected_size).await
        {
            match self.download_resume(url, dest, offset).await {
                Err(DeviceError::RangeNotSatisfiable { .. }) => {
                    info!(offset, "partial file is past the remote end; downloading in full");
                }
                result => return result,
            }
        }

        self.download_full(url, dest).await
    }

    /// Plain GET into a freshly created (truncated) file.
    async fn download_full(&self, url: &Url, dest: &Path) -> Result<(), DeviceError> {
        let response = self.send(self.http.get(url.clone()), url).await?;
        check_full_status(&response, url)?;

        let file = File::create(dest)
            .await
            .map_err(|e| DeviceError::io(dest, e))?;
        let bytes = stream_to_file(file, response, url, dest).await?;

        debug!(bytes, "download complete");
        Ok(())
    }

    /// Range GET continuing a partial file of `offset` bytes.
    async fn download_resume(&self, url: &Url, dest: &Path, offset: u64) -> Result<(), DeviceError> {
        debug!(offset, "resuming partial download");
        let request = self
            .http
            .get(url.clone())
            .header(RANGE, format!("bytes={offset}-"));
        let response = self.send(request, url).await?;

        let file = match response.status() {
            StatusCode::PARTIAL_CONTENT => {
                check_content_range(&response, url, offset)?;
                OpenOptions::new()
                    .append(true)
                    .open(dest)
                    .await
                    .map_err(|e| DeviceError::io(dest, e))?
            }
            StatusCode::OK => {
                warn!(offset, "device ignored range request; rewriting file from the start");
                File::create(dest)
                    .await
                    .map_err(|e| DeviceError::io(dest, e))?
            }
            StatusCode::NOT_FOUND => return Err(DeviceError::not_found(url.as_str())),
            StatusCode::RANGE_NOT_SATISFIABLE => {
                return Err(DeviceError::RangeNotSatisfiable {
                    url: url.to_string(),
                    offset,
                });
            }
            status => return Err(DeviceError::unexpected_status(url.as_str(), status.as_u16())),
        };

        let bytes = stream_to_file(file, response, url, dest).await?;
        debug!(bytes, offset, "resumed download complete");
        Ok(())
    }
}

fn check_full_status(response: &Response, url: &Url) -> Result<(), DeviceError> {
    match response.status() {
        StatusCode::OK => Ok(()),
        StatusCode::NOT_FOUND => Err(DeviceError::not_found(url.as_str())),
        status => Err(DeviceError::unexpected_status(url.as_str(), status.as_u16())),
    }
}

/// Verifies a `206` answer continues at `offset` (`Content-Range: bytes <offset>-…`).
fn check_content_range(response: &Response, url: &Url, offset: u64) -> Result<(), DeviceError> {
    let Some(value) = response.headers().get(CONTENT_RANGE) else {
        return Err(DeviceError::MissingContentRange {
            url: url.to_string(),
        });
    };

    let content_range = String::from_utf8_lossy(value.as_bytes());
    if content_range.starts_with(&format!("bytes {offset}-")) {
        Ok(())
    } else {
        Err(DeviceError::range_mismatch(
            url.as_str(),
            offset,
            content_range.into_owned(),
        ))
    }
}

/// Streams the response body into `file`, returning bytes written.
///
/// The writer is flushed and shut down before returning; both the body and the
/// file handle are dropped on every path.
async fn stream_to_file(
    file: File,
    response: Response,
    url: &Url,
    file_path: &Path,
) -> Result<u64, DeviceError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DeviceError::from_reqwest(url.as_str(), e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DeviceError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DeviceError::io(file_path, e))?;
    writer
        .shutdown()
        .await
        .map_err(|e| DeviceError::io(file_path, e))?;

    Ok(bytes_written)
}
