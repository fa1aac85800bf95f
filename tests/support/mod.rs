//! Shared helpers for integration tests: fake listing pages and a
//! range-aware file responder standing in for the card.

#![allow(dead_code)]

use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use ezshare_sync::{ClientConfig, DeviceClient};
use wiremock::{Request, Respond, ResponseTemplate};

/// Builds a naive device timestamp.
pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .and_then(|date| date.and_hms_opt(h, mi, s))
        .expect("valid test timestamp")
}

/// Formats a timestamp the way the card pads it (`2026- 1- 4    5: 8:56`).
fn device_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%_m-%_d   %_H:%_M:%_S").to_string()
}

/// One `<pre>` line for a file of `size_kb` KB.
pub fn file_row(ts: NaiveDateTime, size_kb: u64, name: &str, href: &str) -> String {
    format!(
        "   {}  {:>10}KB  <a href=\"{href}\"> {name}</a>",
        device_timestamp(ts),
        size_kb
    )
}

/// One `<pre>` line for a directory.
pub fn dir_row(ts: NaiveDateTime, name: &str, href: &str) -> String {
    format!(
        "   {}         &lt;DIR&gt;   <a href=\"{href}\"> {name}</a>",
        device_timestamp(ts)
    )
}

/// Wraps rows into a full index page, with the `.`/`..` entries and footer the card emits.
pub fn listing_page(title: &str, rows: &[String]) -> String {
    let ts = at(2026, 1, 1, 0, 0, 0);
    let mut body = String::new();
    body.push_str(&dir_row(ts, ".", "dir?dir=A:"));
    body.push('\n');
    body.push_str(&dir_row(ts, "..", "dir?dir=A:"));
    body.push('\n');
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    format!(
        "<html><head><title>Index of {title}</title></head><body>\n\
         <h1><a href=\"photo\">back to photo</a></h1>\n\
         <pre>\n{body}\nTotal Entries: {}\nTotal Size: 0KB\n</pre>\n</body></html>",
        rows.len() + 2
    )
}

/// Deterministic, non-repeating-looking content of `len` bytes.
pub fn content(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| u8::try_from((i * 31 + i / 251) % 251).unwrap_or(0))
        .collect()
}

/// Client for a mock card with short backoff so retry tests stay fast.
pub fn client_for(uri: &str, max_retries: u32) -> DeviceClient {
    let config = ClientConfig::new(uri)
        .expect("mock server URI is valid")
        .with_max_retries(max_retries)
        .with_backoff_base(Duration::from_millis(5));
    DeviceClient::new(config).expect("client builds")
}

/// Parses the start offset of a `Range: bytes=N-` header.
pub fn range_start(request: &Request) -> Option<usize> {
    request
        .headers
        .get("range")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("bytes="))
        .and_then(|value| value.strip_suffix('-'))
        .and_then(|value| value.parse().ok())
}

/// Serves a fixed file, honoring (or ignoring) `Range: bytes=N-` like the card.
pub struct FileResponder {
    content: Vec<u8>,
    honor_range: bool,
}

impl FileResponder {
    /// Answers range requests with `206` and a matching `Content-Range`.
    pub fn ranged(content: Vec<u8>) -> Self {
        Self {
            content,
            honor_range: true,
        }
    }

    /// Always answers `200` with the whole file.
    pub fn ignoring_range(content: Vec<u8>) -> Self {
        Self {
            content,
            honor_range: false,
        }
    }
}

impl Respond for FileResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let len = self.content.len();
        match range_start(request) {
            Some(start) if self.honor_range && start >= len => ResponseTemplate::new(416)
                .insert_header("Content-Range", format!("bytes */{len}").as_str()),
            Some(start) if self.honor_range => ResponseTemplate::new(206)
                .insert_header(
                    "Content-Range",
                    format!("bytes {start}-{}/{len}", len - 1).as_str(),
                )
                .set_body_bytes(self.content[start..].to_vec()),
            _ => ResponseTemplate::new(200).set_body_bytes(self.content.clone()),
        }
    }
}
