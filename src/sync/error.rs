//! Errors raised while mirroring the device tree.

use std::path::PathBuf;

use thiserror::Error;

use crate::device::DeviceError;

/// A failure while syncing one directory or file, tagged with its remote path.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The directory could not be listed.
    #[error("failed to list directory {remote_path}: {source}")]
    ListDirectory {
        /// Slash-separated path on the card.
        remote_path: String,
        #[source]
        source: DeviceError,
    },

    /// The file could not be downloaded.
    #[error("failed to download {remote_path}: {source}")]
    Download {
        /// Slash-separated path on the card.
        remote_path: String,
        #[source]
        source: DeviceError,
    },

    /// A local filesystem step failed.
    #[error("failed to {action} {} for {remote_path}: {source}", path.display())]
    Io {
        /// Slash-separated path on the card.
        remote_path: String,
        /// The step that failed, e.g. `create directory`.
        action: &'static str,
        /// Local path involved.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The card reported an entry name that is not a single path component.
    #[error("refusing entry with unsafe name: {remote_path}")]
    UnsafeName {
        /// Slash-separated path on the card, as it would be built from the name.
        remote_path: String,
    },

    /// The run was cancelled between requests.
    #[error("sync cancelled")]
    Cancelled,
}

impl SyncError {
    pub(crate) fn io(
        remote_path: &str,
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            remote_path: remote_path.to_string(),
            action,
            path: path.into(),
            source,
        }
    }

    /// Returns true if the failure is a cancellation rather than a real error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::ListDirectory { source, .. } | Self::Download { source, .. } => {
                source.is_cancelled()
            }
            Self::Io { .. } | Self::UnsafeName { .. } => false,
        }
    }
}
