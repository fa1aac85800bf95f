//! HTTP transport for the EZ-Share card.
//!
//! This module provides [`DeviceClient`], which talks to the card's embedded
//! web server:
//!
//! - directory listings (`/dir?dir=A:\…`) parsed into [`Entry`](crate::Entry) values
//! - file downloads with range resume
//! - firmware version queries (`/client?command=version`)
//!
//! Every request goes through a [`RetryPolicy`] that retries timeouts and 5xx
//! answers with exponential backoff and honors a
//! [`CancellationToken`](tokio_util::sync::CancellationToken).

mod client;
mod config;
mod download;
mod error;
mod list;
mod path;
mod retry;
mod version;

pub use client::DeviceClient;
pub use config::{CONNECT_TIMEOUT, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use download::{MIN_RESUMABLE_SIZE, validate_partial_file};
pub use error::DeviceError;
pub use path::to_device_path;
pub use retry::{
    DEFAULT_BACKOFF_BASE, DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy,
    classify_error,
};
pub use version::{Version, parse_version_string};
