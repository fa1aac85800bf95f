//! Change detection between a remote entry and its local copy.
//!
//! The card reports sizes rounded up to whole KiB and timestamps with second
//! resolution, so both comparisons are deliberately coarse: sizes are compared
//! in KiB, and modification times may drift by up to 10 seconds.

use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, TimeDelta, Utc};

use crate::listing::Entry;

/// Largest modification time difference still treated as "same file".
const MTIME_TOLERANCE_SECS: i64 = 10;

/// Whether a file must be (re)downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// The local copy is up to date.
    Skip,
    /// The file must be downloaded, for the given reason.
    Sync(SyncReason),
}

/// Why a file is downloaded; shown in log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReason {
    /// No local copy exists.
    NewFile,
    /// Local and remote sizes differ after rounding up to whole KiB.
    SizeMismatch {
        /// Local size in KiB (rounded up).
        local_kb: u64,
        /// Remote size in KiB.
        remote_kb: u64,
    },
    /// Modification times differ by more than the tolerance.
    TimestampMismatch {
        /// Absolute difference in seconds.
        drift_secs: i64,
    },
    /// The local copy could not be inspected.
    StatError(String),
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewFile => write!(f, "new file"),
            Self::SizeMismatch {
                local_kb,
                remote_kb,
            } => write!(f, "size mismatch (local {local_kb}KB, remote {remote_kb}KB)"),
            Self::TimestampMismatch { drift_secs } => {
                write!(f, "timestamp mismatch ({drift_secs}s apart)")
            }
            Self::StatError(message) => write!(f, "stat error: {message}"),
        }
    }
}

/// Decides whether `entry` must be downloaded over the file at `local_path`.
pub async fn needs_sync(entry: &Entry, local_path: &Path) -> SyncDecision {
    let metadata = match tokio::fs::metadata(local_path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return SyncDecision::Sync(SyncReason::NewFile),
        Err(e) => return SyncDecision::Sync(SyncReason::StatError(e.to_string())),
    };

    match metadata.modified() {
        Ok(modified) => compare(entry, metadata.len(), DateTime::<Utc>::from(modified)),
        Err(e) => SyncDecision::Sync(SyncReason::StatError(e.to_string())),
    }
}

/// Compares a remote entry with local size and modification time.
///
/// The entry's naive timestamp is read as UTC, matching how synced files get
/// their modification time.
#[must_use]
pub fn compare(entry: &Entry, local_size: u64, local_modified: DateTime<Utc>) -> SyncDecision {
    let local_kb = local_size.div_ceil(1024);
    let remote_kb = entry.size.div_ceil(1024);
    if local_kb != remote_kb {
        return SyncDecision::Sync(SyncReason::SizeMismatch {
            local_kb,
            remote_kb,
        });
    }

    let drift = (local_modified - entry.timestamp.and_utc()).abs();
    if drift > TimeDelta::seconds(MTIME_TOLERANCE_SECS) {
        return SyncDecision::Sync(SyncReason::TimestampMismatch {
            drift_secs: drift.num_seconds(),
        });
    }

    SyncDecision::Skip
}
