//! The [`Entry`] value produced by a directory listing.

use chrono::NaiveDateTime;

/// One file or directory reported by a device listing.
///
/// Entries are created fresh for every listing request and carry no identity
/// beyond their fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Display name as shown in the listing (long file name, not the 8.3 alias).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Device-reported modification time (wall clock, no timezone).
    pub timestamp: NaiveDateTime,
    /// Size in bytes at KiB granularity; always 0 for directories.
    pub size: u64,
    /// Locator from the anchor `href`, absolute or relative to the base URL.
    pub url: String,
}

impl Entry {
    /// Creates a file entry.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        timestamp: NaiveDateTime,
        size: u64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            timestamp,
            size,
            url: url.into(),
        }
    }

    /// Creates a directory entry. Directories always report a size of 0.
    #[must_use]
    pub fn directory(name: impl Into<String>, timestamp: NaiveDateTime, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            timestamp,
            size: 0,
            url: url.into(),
        }
    }
}
