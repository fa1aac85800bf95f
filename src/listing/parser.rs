//! Directory index page parser.
//!
//! The page is parsed into a node tree and the `<pre>` block is scanned as a
//! small state machine: text nodes accumulate, and each anchor emits one raw
//! record pairing the accumulated text with the anchor's name and `href`.
//! Records are then turned into [`Entry`] values with tolerant regexes.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, trace};

use super::{Entry, ListingError};

/// Timestamp as printed by the card. Month, day, hour, minute and second are
/// space-padded instead of zero-padded, inconsistently.
#[allow(clippy::expect_used)]
static TIMESTAMP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})-\s*(\d{1,2})-\s*(\d{1,2})\s+(\d{1,2}):\s*(\d{1,2}):\s*(\d{1,2})")
        .expect("timestamp regex is valid") // Static pattern, safe to panic
});

/// Size in KB, or the directory marker (entity-encoded or literal).
#[allow(clippy::expect_used)]
static SIZE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)KB|&lt;DIR&gt;|<DIR>").expect("size regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

#[allow(clippy::expect_used)]
static PRE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("pre").expect("pre selector is valid"));

/// Format of a normalized timestamp (`2026-1-4 10:55:58`).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix of the summary footer lines (`Total Entries: 4`, `Total Size: 87KB`).
const SUMMARY_PREFIX: &str = "Total";

/// Anchor text of the self and parent references.
const SELF_REFERENCES: [&str; 2] = [".", ".."];

/// One anchor of the `<pre>` block together with the text preceding it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawRecord {
    text: String,
    name: String,
    href: String,
}

/// Parsed size column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeField {
    Directory,
    Bytes(u64),
}

/// Parses a directory index page into entries, in document order.
///
/// Summary footer lines and the `.`/`..` self references are skipped.
///
/// # Errors
///
/// Returns [`ListingError`] if the page has no `<pre>` block or if any entry
/// line lacks a recognizable timestamp or size. A single malformed line fails
/// the whole listing.
#[tracing::instrument(skip(html), fields(html_len = html.len()))]
pub fn parse_directory_listing(html: &str) -> Result<Vec<Entry>, ListingError> {
    let document = Html::parse_document(html);
    let pre = document
        .select(&PRE_SELECTOR)
        .next()
        .ok_or(ListingError::MissingPreBlock)?;

    let records = extract_raw_records(pre);

    let mut entries = Vec::with_capacity(records.len());
    for record in &records {
        if let Some(entry) = parse_record(record)? {
            entries.push(entry);
        }
    }

    debug!(
        records = records.len(),
        entries = entries.len(),
        "parsed directory listing"
    );
    Ok(entries)
}

fn extract_raw_records(pre: ElementRef<'_>) -> Vec<RawRecord> {
    let mut records = Vec::new();
    let mut text = String::new();

    for child in pre.children() {
        match child.value() {
            Node::Text(chunk) => text.push_str(chunk),
            Node::Element(element) if element.name() == "a" => {
                let href = element.attr("href").unwrap_or_default();
                let name = ElementRef::wrap(child)
                    .map(|anchor| anchor.text().collect::<String>())
                    .unwrap_or_default();
                let name = name.trim();

                if href.is_empty() || name.is_empty() {
                    trace!(href, name, "ignoring anchor without name or href");
                    continue;
                }

                records.push(RawRecord {
                    text: std::mem::take(&mut text),
                    name: name.to_string(),
                    href: href.to_string(),
                });
            }
            _ => {}
        }
    }

    records
}

fn parse_record(record: &RawRecord) -> Result<Option<Entry>, ListingError> {
    let text = record.text.trim();
    if text.is_empty() || text.starts_with(SUMMARY_PREFIX) {
        trace!(name = %record.name, "skipping summary or empty line");
        return Ok(None);
    }

    if SELF_REFERENCES.contains(&record.name.as_str()) {
        return Ok(None);
    }

    let timestamp = parse_timestamp(text)?;
    let entry = match parse_size(text)? {
        SizeField::Directory => Entry::directory(&record.name, timestamp, &record.href),
        SizeField::Bytes(size) => Entry::file(&record.name, timestamp, size, &record.href),
    };
    Ok(Some(entry))
}

fn parse_timestamp(text: &str) -> Result<NaiveDateTime, ListingError> {
    let matched = TIMESTAMP_PATTERN
        .find(text)
        .ok_or_else(|| ListingError::missing_timestamp(text))?;

    let normalized = normalize_timestamp(matched.as_str());
    NaiveDateTime::parse_from_str(&normalized, TIMESTAMP_FORMAT).map_err(|e| {
        ListingError::InvalidTimestamp {
            value: normalized.clone(),
            reason: e.to_string(),
        }
    })
}

/// Collapses whitespace runs and drops the padding after `-` and `:`.
fn normalize_timestamp(raw: &str) -> String {
    WHITESPACE_PATTERN
        .replace_all(raw, " ")
        .replace("- ", "-")
        .replace(": ", ":")
}

fn parse_size(text: &str) -> Result<SizeField, ListingError> {
    let captures = SIZE_PATTERN
        .captures(text)
        .ok_or_else(|| ListingError::missing_size(text))?;

    let Some(kilobytes) = captures.get(1) else {
        return Ok(SizeField::Directory);
    };

    let invalid = || ListingError::InvalidSize {
        value: kilobytes.as_str().to_string(),
    };
    kilobytes
        .as_str()
        .parse::<u64>()
        .map_err(|_| invalid())?
        .checked_mul(1024)
        .map(SizeField::Bytes)
        .ok_or_else(invalid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    // Captured from a real card (root directory).
    const ROOT_LISTING: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<meta http-equiv="Content-Type" content="text/html; charset=gb2312">
<title>Index of A:</title>
</head>
<body>
<h1><a href="photo">back to photo</a></h1>
<h1>Directory Index of A:</h1>
<pre>
   2026- 1- 4   10:55:58          64KB  <a href="http://192.168.4.1/download?file=JOURNAL.DAT"> Journal.dat</a>
   2026- 1- 4   10:56:12           1KB  <a href="http://192.168.4.1/download?file=IDNK8C~1.TGT"> Identification.tgt</a>
   2026- 1- 4   10:56:12         &lt;DIR&gt;   <a href="dir?dir=A:%5CDATALOG"> DATALOG</a>
   2026- 1- 5   12:10: 0          22KB  <a href="http://192.168.4.1/download?file=STR.EDF"> STR.edf</a>

Total Entries: 4
Total Size: 87KB
</pre>
</body>
</html>"#;

    const SUBDIR_LISTING: &str = r#"<html><head><title>Index of 20260104</title></head>
<body>
<h1><a href="photo">back to photo</a></h1>
<pre>
   2026- 1- 4   12: 0: 2         &lt;DIR&gt;   <a href="dir?dir=A:%5CDATALOG%5C20260104"> .</a>
   2026- 1- 4   12: 0: 2         &lt;DIR&gt;   <a href="dir?dir=A:%5CDATALOG"> ..</a>
   2026- 1- 4   23:41:40           1KB  <a href="http://192.168.4.1/download?file=DATALOG%5C20260104%5C20CITZ~1.EDF"> 20260104_234139_CSL.edf</a>
   2026- 1- 5    5: 8:56        1918KB  <a href="http://192.168.4.1/download?file=DATALOG%5C20260104%5C20FL2G~1.EDF"> 20260104_234156_BRP.edf</a>

Total Entries: 4
Total Size: 1919KB
</pre>
</body>
</html>"#;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_parse_root_listing() {
        let entries = parse_directory_listing(ROOT_LISTING).unwrap();
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].name, "Journal.dat");
        assert!(!entries[0].is_dir);
        assert_eq!(entries[0].size, 64 * 1024);
        assert_eq!(entries[0].timestamp, at(2026, 1, 4, 10, 55, 58));
        assert_eq!(
            entries[0].url,
            "http://192.168.4.1/download?file=JOURNAL.DAT"
        );

        assert_eq!(entries[2].name, "DATALOG");
        assert!(entries[2].is_dir);
        assert_eq!(entries[2].size, 0);
        assert_eq!(entries[2].url, "dir?dir=A:%5CDATALOG");

        // Space-padded seconds
        assert_eq!(entries[3].timestamp, at(2026, 1, 5, 12, 10, 0));
    }

    #[test]
    fn test_parse_subdirectory_skips_self_references() {
        let entries = parse_directory_listing(SUBDIR_LISTING).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "20260104_234139_CSL.edf");
        assert_eq!(
            entries[0].url,
            "http://192.168.4.1/download?file=DATALOG%5C20260104%5C20CITZ~1.EDF"
        );
        assert_eq!(entries[1].size, 1918 * 1024);
        assert_eq!(entries[1].timestamp, at(2026, 1, 5, 5, 8, 56));
    }

    #[test]
    fn test_parse_empty_directory() {
        let html = r#"<html><body><pre>
   2026- 1- 5   12: 0: 0         &lt;DIR&gt;   <a href="dir?dir=A:%5CDATALOG%5C20260105"> .</a>
   2026- 1- 5   12: 0: 0         &lt;DIR&gt;   <a href="dir?dir=A:%5CDATALOG"> ..</a>

Total Entries: 2
Total Size: 0KB
</pre></body></html>"#;
        let entries = parse_directory_listing(html).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_summary_line_before_anchor_is_skipped() {
        // Six anchors: two self references, one after the summary footer.
        let html = r#"<html><body><pre>
   2026- 1- 4   12: 0: 2         &lt;DIR&gt;   <a href="dir?dir=A:"> .</a>
   2026- 1- 4   12: 0: 2         &lt;DIR&gt;   <a href="dir?dir=A:"> ..</a>
   2026- 1- 4   10:55:58           5KB  <a href="/download?file=A.TXT"> A.txt</a>
   2026- 1- 4   10:55:59         &lt;DIR&gt;   <a href="dir?dir=A:%5CSUB"> sub</a>
   2026- 1- 4   10:56: 1           2KB  <a href="/download?file=C.TXT"> C.txt</a>
Total Entries: 3 <a href="photo">photo</a>
</pre></body></html>"#;
        let entries = parse_directory_listing(html).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A.txt", "sub", "C.txt"]);
        assert!(entries[1].is_dir);
        assert_eq!(entries[1].size, 0);
    }

    #[test]
    fn test_literal_dir_marker_is_directory() {
        assert_eq!(
            parse_size("2026- 1- 4 10:56:12 <DIR>").unwrap(),
            SizeField::Directory
        );
        assert_eq!(
            parse_size("2026- 1- 4 10:56:12 &lt;DIR&gt;").unwrap(),
            SizeField::Directory
        );
    }

    #[test]
    fn test_entity_encoded_name_is_decoded() {
        let html = r#"<html><body><pre>
   2026- 1- 4   10:55:58           1KB  <a href="/download?file=R_D~1.TXT"> R&amp;D notes.txt</a>
</pre></body></html>"#;
        let entries = parse_directory_listing(html).unwrap();
        assert_eq!(entries[0].name, "R&D notes.txt");
    }

    #[test]
    fn test_anchor_without_href_keeps_accumulating() {
        let html = r#"<html><body><pre>
   2026- 1- 4   10:55:58 <a>ignored</a>          3KB  <a href="/download?file=X.BIN"> x.bin</a>
</pre></body></html>"#;
        let entries = parse_directory_listing(html).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "x.bin");
        assert_eq!(entries[0].size, 3 * 1024);
    }

    #[test]
    fn test_missing_pre_block_is_error() {
        let result = parse_directory_listing("<html><body><h1>Oops</h1></body></html>");
        assert_eq!(result, Err(ListingError::MissingPreBlock));
    }

    #[test]
    fn test_missing_timestamp_fails_whole_listing() {
        let html = r#"<html><body><pre>
   2026- 1- 4   10:55:58          64KB  <a href="/download?file=A"> a</a>
   garbage line 12KB  <a href="/download?file=B"> b</a>
</pre></body></html>"#;
        let result = parse_directory_listing(html);
        assert!(matches!(result, Err(ListingError::MissingTimestamp { .. })));
    }

    #[test]
    fn test_missing_size_fails_whole_listing() {
        let html = r#"<html><body><pre>
   2026- 1- 4   10:55:58   ???  <a href="/download?file=A"> a</a>
</pre></body></html>"#;
        let result = parse_directory_listing(html);
        assert!(matches!(result, Err(ListingError::MissingSize { .. })));
    }

    #[test]
    fn test_out_of_range_timestamp_is_invalid() {
        let result = parse_timestamp("2026-13- 4 10:55:58");
        assert!(matches!(result, Err(ListingError::InvalidTimestamp { .. })));
    }

    #[test]
    fn test_overflowing_size_is_invalid() {
        let result = parse_size("99999999999999999999KB");
        assert!(matches!(result, Err(ListingError::InvalidSize { .. })));
    }

    #[test]
    fn test_normalize_timestamp_removes_padding() {
        assert_eq!(
            normalize_timestamp("2026- 1- 5    5: 8:56"),
            "2026-1-5 5:8:56"
        );
        assert_eq!(normalize_timestamp("2026- 1- 4   12: 0: 2"), "2026-1-4 12:0:2");
    }
}
