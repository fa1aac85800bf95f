//! One-way mirror of the card's file tree into a local directory.
//!
//! [`Syncer`] walks the card depth-first, one listing request per directory,
//! and downloads every file whose local copy is missing or differs (see
//! [`needs_sync`]). Files are written to `<name>.tmp`, stamped with the
//! remote modification time, then renamed into place, so an interrupted run
//! never leaves a truncated file under its final name.
//!
//! A failure on one file or subdirectory is logged and counted but does not
//! stop the walk. Only a failure to list the starting directory, or
//! cancellation, ends the run with an error.

mod change;
mod error;
mod stats;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::device::DeviceClient;
use crate::listing::Entry;

pub use change::{SyncDecision, SyncReason, compare, needs_sync};
pub use error::SyncError;
pub use stats::SyncStats;

/// Suffix of the temporary file a download is written to.
const TEMP_SUFFIX: &str = ".tmp";

/// Mirrors the card into `local_root`.
///
/// # Example
///
/// ```no_run
/// use ezshare_sync::{ClientConfig, DeviceClient, Syncer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DeviceClient::new(ClientConfig::new("http://192.168.4.1")?)?;
/// let stats = Syncer::new(&client, "/srv/cpap").run().await?;
/// println!("Sync complete: {stats}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Syncer<'a> {
    client: &'a DeviceClient,
    local_root: PathBuf,
    dry_run: bool,
    cancel: CancellationToken,
}

impl<'a> Syncer<'a> {
    /// Creates a syncer writing under `local_root`.
    #[must_use]
    pub fn new(client: &'a DeviceClient, local_root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            local_root: local_root.into(),
            dry_run: false,
            cancel: CancellationToken::new(),
        }
    }

    /// In dry-run mode decisions are logged and counted, but nothing is
    /// created, downloaded, or renamed.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Uses `cancel` to abort the run (including in-flight retries).
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Mirrors the whole card.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ListDirectory`] if the root cannot be listed, or a
    /// cancelled error if the token fires. Per-entry failures are counted in
    /// the returned [`SyncStats`] instead.
    pub async fn run(&self) -> Result<SyncStats, SyncError> {
        self.sync_tree("/").await
    }

    /// Mirrors the subtree at slash-separated `remote_root`.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    #[instrument(skip(self), fields(local_root = %self.local_root.display(), dry_run = self.dry_run))]
    pub async fn sync_tree(&self, remote_root: &str) -> Result<SyncStats, SyncError> {
        let mut stats = SyncStats::default();
        self.sync_directory(remote_root, &mut stats).await?;
        info!(%stats, "sync finished");
        Ok(stats)
    }

    async fn sync_directory(&self, remote_path: &str, stats: &mut SyncStats) -> Result<(), SyncError> {
        let entries = self
            .client
            .list_directory(remote_path, &self.cancel)
            .await
            .map_err(|source| SyncError::ListDirectory {
                remote_path: remote_path.to_string(),
                source,
            })?;
        debug!(remote_path, count = entries.len(), "walking directory");

        for entry in &entries {
            if self.cancel.is_cancelled() {
                return Err(SyncError::Cancelled);
            }

            let child_remote = remote_child_path(remote_path, &entry.name);

            let result = if !is_safe_name(&entry.name) {
                Err(SyncError::UnsafeName {
                    remote_path: child_remote.clone(),
                })
            } else if entry.is_dir {
                let local_path = self.local_path_for(&child_remote);
                self.enter_directory(&child_remote, &local_path, stats).await
            } else {
                let local_path = self.local_path_for(&child_remote);
                self.sync_file(entry, &child_remote, &local_path, stats).await
            };

            match result {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    error!(remote_path = %child_remote, error = %e, "sync failed");
                    stats.record_error();
                }
            }
        }

        Ok(())
    }

    async fn enter_directory(
        &self,
        remote_path: &str,
        local_path: &Path,
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        if !self.dry_run {
            tokio::fs::create_dir_all(local_path)
                .await
                .map_err(|e| SyncError::io(remote_path, "create directory", local_path, e))?;
        }
        Box::pin(self.sync_directory(remote_path, stats)).await
    }

    async fn sync_file(
        &self,
        entry: &Entry,
        remote_path: &str,
        local_path: &Path,
        stats: &mut SyncStats,
    ) -> Result<(), SyncError> {
        let SyncDecision::Sync(reason) = needs_sync(entry, local_path).await else {
            debug!(remote_path, "up to date");
            stats.record_skipped();
            return Ok(());
        };

        if self.dry_run {
            info!(remote_path, %reason, "would sync");
            stats.record_synced();
            return Ok(());
        }

        info!(remote_path, %reason, "syncing");

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::io(remote_path, "create parent directory", parent, e))?;
        }

        let temp_path = temp_path_for(local_path);
        if let Err(e) = self
            .write_file(entry, remote_path, &temp_path, local_path)
            .await
        {
            if let Err(cleanup) = tokio::fs::remove_file(&temp_path).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %temp_path.display(), error = %cleanup, "failed to remove temp file");
            }
            return Err(e);
        }

        stats.record_synced();
        Ok(())
    }

    /// Downloads to `temp_path`, stamps the remote mtime, and renames into place.
    async fn write_file(
        &self,
        entry: &Entry,
        remote_path: &str,
        temp_path: &Path,
        local_path: &Path,
    ) -> Result<(), SyncError> {
        self.client
            .download_file(entry, temp_path, &self.cancel)
            .await
            .map_err(|source| SyncError::Download {
                remote_path: remote_path.to_string(),
                source,
            })?;

        let mtime = FileTime::from_unix_time(entry.timestamp.and_utc().timestamp(), 0);
        filetime::set_file_times(temp_path, mtime, mtime)
            .map_err(|e| SyncError::io(remote_path, "set modification time on", temp_path, e))?;

        tokio::fs::rename(temp_path, local_path)
            .await
            .map_err(|e| SyncError::io(remote_path, "rename into", local_path, e))
    }

    fn local_path_for(&self, remote_path: &str) -> PathBuf {
        remote_path
            .split('/')
            .filter(|component| !component.is_empty())
            .fold(self.local_root.clone(), |path, component| path.join(component))
    }
}

/// An entry name must be a single path component, so the mirror stays under
/// the local root.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Joins `name` onto a slash-separated remote directory path.
fn remote_child_path(parent: &str, name: &str) -> String {
    format!("{}/{name}", parent.trim_end_matches('/'))
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ClientConfig;

    #[test]
    fn test_remote_child_path_at_root() {
        assert_eq!(remote_child_path("/", "DATALOG"), "/DATALOG");
    }

    #[test]
    fn test_remote_child_path_nested() {
        assert_eq!(remote_child_path("/DATALOG", "20260104"), "/DATALOG/20260104");
        assert_eq!(remote_child_path("/DATALOG/", "x.edf"), "/DATALOG/x.edf");
    }

    #[test]
    fn test_safe_names() {
        assert!(is_safe_name("BRP.edf"));
        assert!(is_safe_name("..hidden"));
        assert!(is_safe_name("a..b"));
    }

    #[test]
    fn test_unsafe_names_rejected() {
        for name in ["", ".", "..", "../escaped.txt", "a/b", r"..\x", "nul\0byte"] {
            assert!(!is_safe_name(name), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/mirror/STR.edf")),
            PathBuf::from("/mirror/STR.edf.tmp")
        );
    }

    #[test]
    fn test_local_path_for_joins_components() {
        let client = DeviceClient::new(ClientConfig::new("http://192.168.4.1").unwrap()).unwrap();
        let syncer = Syncer::new(&client, "/mirror");
        assert_eq!(
            syncer.local_path_for("/DATALOG/20260104/BRP.edf"),
            Path::new("/mirror").join("DATALOG").join("20260104").join("BRP.edf")
        );
        assert_eq!(syncer.local_path_for("/"), PathBuf::from("/mirror"));
    }
}
