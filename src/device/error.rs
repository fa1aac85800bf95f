//! Error types for device requests.
//!
//! This module defines structured errors for all requests sent to the card,
//! carrying the URL or path involved so log lines are actionable.

use std::path::PathBuf;

use thiserror::Error;

use crate::listing::ListingError;

/// Errors that can occur while talking to the card or writing its files locally.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The file or directory does not exist on the card (HTTP 404).
    #[error("not found on device: {target}")]
    NotFound {
        /// Device path or entry name that was requested.
        target: String,
    },

    /// The directory index page could not be parsed.
    #[error("invalid directory listing for {path}: {source}")]
    InvalidListing {
        /// Device path that was listed.
        path: String,
        /// The parse failure.
        #[source]
        source: ListingError,
    },

    /// The card answered with a document of unexpected shape.
    #[error("invalid response from device: {reason}")]
    InvalidResponse {
        /// What was wrong with the response.
        reason: String,
    },

    /// The card answered with a 5xx status.
    #[error("server error: HTTP {status} from {url}")]
    ServerError {
        /// The URL that failed.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The request or body transfer timed out.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// A 206 response started at a different offset than requested.
    #[error("unexpected Content-Range {content_range:?} from {url} (expected start at {expected_offset})")]
    RangeMismatch {
        /// The URL requested.
        url: String,
        /// Offset sent in the Range header.
        expected_offset: u64,
        /// Content-Range header value received.
        content_range: String,
    },

    /// A 206 response carried no Content-Range header.
    #[error("206 response from {url} is missing the Content-Range header")]
    MissingContentRange {
        /// The URL requested.
        url: String,
    },

    /// The requested range starts past the end of the remote file (HTTP 416).
    #[error("range starting at {offset} not satisfiable for {url}")]
    RangeNotSatisfiable {
        /// The URL requested.
        url: String,
        /// Offset sent in the Range header.
        offset: u64,
    },

    /// Any other non-success status code.
    #[error("unexpected status code {status} from {url}")]
    UnexpectedStatus {
        /// The URL requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Network-level error (connection refused, reset, protocol errors).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL requested.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Local file system error (create, append, flush, close).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The base URL or an entry locator is malformed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be built (bad proxy address, TLS backend).
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Every attempt failed with a retriable error.
    #[error("operation failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the last attempt.
        #[source]
        source: Box<DeviceError>,
    },
}

impl DeviceError {
    /// Creates a not-found error.
    pub fn not_found(target: impl Into<String>) -> Self {
        Self::NotFound {
            target: target.into(),
        }
    }

    /// Creates an invalid-listing error for a device path.
    pub fn invalid_listing(path: impl Into<String>, source: ListingError) -> Self {
        Self::InvalidListing {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates a server (5xx) error.
    pub fn server_error(url: impl Into<String>, status: u16) -> Self {
        Self::ServerError {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a range mismatch error.
    pub fn range_mismatch(
        url: impl Into<String>,
        expected_offset: u64,
        content_range: impl Into<String>,
    ) -> Self {
        Self::RangeMismatch {
            url: url.into(),
            expected_offset,
            content_range: content_range.into(),
        }
    }

    /// Creates an unexpected-status error.
    pub fn unexpected_status(url: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an error from a reqwest failure, separating timeouts from
    /// other network errors.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Wraps the last error of a retry loop.
    #[must_use]
    pub fn retries_exhausted(attempts: u32, last: DeviceError) -> Self {
        Self::RetriesExhausted {
            attempts,
            source: Box::new(last),
        }
    }

    /// Returns true if this error (or the last attempt it wraps) is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::RetriesExhausted { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Returns true if the card reported the target as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::RetriesExhausted { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

// Like the download errors this is modeled on, no `From<reqwest::Error>` or
// `From<std::io::Error>`: every variant needs the URL or path for context.
