//! Per-run counters.

use std::fmt;

/// Outcome counters for one sync run.
///
/// Dry runs count files they would have synced as `synced`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    synced: usize,
    skipped: usize,
    errors: usize,
}

impl SyncStats {
    /// Files downloaded (or that would be, in a dry run).
    #[must_use]
    pub fn synced(&self) -> usize {
        self.synced
    }

    /// Files already up to date.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Files and directories that failed.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Returns true if any file or directory failed to sync.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub(crate) fn record_synced(&mut self) {
        self.synced += 1;
    }

    pub(crate) fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn record_error(&mut self) {
        self.errors += 1;
    }
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} synced, {} skipped, {} errors",
            self.synced, self.skipped, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = SyncStats::default();
        assert_eq!((stats.synced(), stats.skipped(), stats.errors()), (0, 0, 0));
        assert!(!stats.has_errors());
    }

    #[test]
    fn test_record_and_display() {
        let mut stats = SyncStats::default();
        stats.record_synced();
        stats.record_synced();
        stats.record_skipped();
        stats.record_error();
        assert!(stats.has_errors());
        assert_eq!(stats.to_string(), "2 synced, 1 skipped, 1 errors");
    }
}
