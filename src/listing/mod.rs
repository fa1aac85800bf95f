//! Directory index page parsing.
//!
//! The card has no machine-readable listing API. Each directory is served as
//! an HTML page whose `<pre>` block holds one line per entry: a timestamp, a
//! size (or a `<DIR>` marker) and an anchor carrying the name and locator.
//!
//! # Example
//!
//! ```
//! use ezshare_sync::listing::parse_directory_listing;
//!
//! let html = r#"<html><body><pre>
//!    2026- 1- 4   10:55:58          64KB  <a href="http://192.168.4.1/download?file=JOURNAL.DAT"> Journal.dat</a>
//! Total Entries: 1
//! </pre></body></html>"#;
//!
//! let entries = parse_directory_listing(html).unwrap();
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].name, "Journal.dat");
//! assert_eq!(entries[0].size, 64 * 1024);
//! ```

mod entry;
mod error;
mod parser;

pub use entry::Entry;
pub use error::ListingError;
pub use parser::parse_directory_listing;
