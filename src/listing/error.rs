//! Error types for directory listing parsing.

use thiserror::Error;

/// Maximum number of characters of an offending line kept in error messages.
const LINE_PREVIEW_CHARS: usize = 120;

/// Errors that can occur while parsing a directory index page.
///
/// Any of these means the page cannot be trusted, so the whole listing fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    /// The page has no `<pre>` block holding the listing.
    #[error("<pre> block not found in directory listing")]
    MissingPreBlock,

    /// No timestamp could be found in an entry line.
    #[error("timestamp not found in line: {line:?}")]
    MissingTimestamp {
        /// The offending line (truncated)
        line: String,
    },

    /// A timestamp was found but is not a valid date/time.
    #[error("failed to parse timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The normalized timestamp text
        value: String,
        /// Why parsing failed
        reason: String,
    },

    /// Neither a size nor a directory marker could be found in an entry line.
    #[error("size not found in line: {line:?}")]
    MissingSize {
        /// The offending line (truncated)
        line: String,
    },

    /// The size value does not fit in a byte count.
    #[error("failed to parse size {value:?}KB")]
    InvalidSize {
        /// The raw KB value
        value: String,
    },
}

impl ListingError {
    /// Creates a `MissingTimestamp` error for an entry line.
    #[must_use]
    pub fn missing_timestamp(line: &str) -> Self {
        Self::MissingTimestamp {
            line: preview(line),
        }
    }

    /// Creates a `MissingSize` error for an entry line.
    #[must_use]
    pub fn missing_size(line: &str) -> Self {
        Self::MissingSize {
            line: preview(line),
        }
    }
}

fn preview(line: &str) -> String {
    line.chars().take(LINE_PREVIEW_CHARS).collect()
}
