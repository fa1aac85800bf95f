//! Exit code logic for the sync process.
//!
//! Single responsibility: map the run's outcome to the process exit status.

use ezshare_sync::SyncStats;

use crate::ProcessExit;

/// Determines the process exit outcome from the final sync counters.
pub(crate) fn determine_exit_outcome(stats: &SyncStats) -> ProcessExit {
    if stats.has_errors() {
        ProcessExit::Failure
    } else {
        ProcessExit::Success
    }
}
