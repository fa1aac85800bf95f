//! EZ-Share Sync Library
//!
//! This library mirrors the file tree of an EZ-Share WiFi SD card onto local
//! storage. The card only exposes HTML directory index pages, so enumeration
//! is done by scraping those pages.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`device`] - HTTP transport, retry policy, listing/download/version requests
//! - [`listing`] - Directory index page parser producing [`Entry`] values
//! - [`sync`] - Recursive one-way mirror of the device tree

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod device;
pub mod listing;
pub mod sync;
mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use device::{
    ClientConfig, DEFAULT_MAX_RETRIES, DeviceClient, DeviceError, FailureType, RetryDecision,
    RetryPolicy, Version, classify_error, to_device_path,
};
pub use listing::{Entry, ListingError, parse_directory_listing};
pub use sync::{SyncDecision, SyncError, SyncReason, SyncStats, Syncer, needs_sync};
