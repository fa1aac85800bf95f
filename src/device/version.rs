//! Firmware version query (`GET /client?command=version`).
//!
//! The card answers with a small XML document:
//!
//! ```text
//! <response><device><version>LZ1801EDPG:1.0.0:2016-03-19:72 …</version></device></response>
//! ```
//!
//! Only the first whitespace-separated token is interpreted; it must have
//! exactly four `:`-separated components.

use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use url::Url;

use super::{DeviceClient, DeviceError};

/// Firmware identification reported by the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// Controller chip model, e.g. `LZ1801EDPG`.
    pub chip_model: String,
    /// Firmware version, e.g. `1.0.0`.
    pub firmware_version: String,
    /// Firmware build date as reported (`YYYY-MM-DD`).
    pub date: String,
    /// Build number.
    pub build_number: String,
    /// The full, unsplit version string.
    pub raw: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    device: VersionDevice,
}

#[derive(Debug, Deserialize)]
struct VersionDevice {
    #[serde(default)]
    version: String,
}

/// Parses a raw version string into its components.
///
/// # Errors
///
/// Returns [`DeviceError::InvalidResponse`] if the string is empty or its
/// first token does not have exactly four `:`-separated components.
pub fn parse_version_string(raw: &str) -> Result<Version, DeviceError> {
    let Some(first) = raw.split_whitespace().next() else {
        return Err(DeviceError::invalid_response("empty version string"));
    };

    let components: Vec<&str> = first.split(':').collect();
    let [chip_model, firmware_version, date, build_number] = components.as_slice() else {
        return Err(DeviceError::invalid_response(format!(
            "expected 4 version components, got {}",
            components.len()
        )));
    };

    Ok(Version {
        chip_model: (*chip_model).to_string(),
        firmware_version: (*firmware_version).to_string(),
        date: (*date).to_string(),
        build_number: (*build_number).to_string(),
        raw: raw.to_string(),
    })
}

fn parse_version_document(xml: &str) -> Result<Version, DeviceError> {
    let response: VersionResponse = quick_xml::de::from_str(xml)
        .map_err(|e| DeviceError::invalid_response(format!("malformed version XML: {e}")))?;

    let raw = response.device.version.trim();
    if raw.is_empty() {
        return Err(DeviceError::invalid_response("version string is empty"));
    }
    parse_version_string(raw)
}

impl DeviceClient {
    /// Queries the card's firmware version.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::UnexpectedStatus`] for a non-200 answer
    /// - [`DeviceError::InvalidResponse`] if the XML or version string is malformed
    /// - transport errors once retries are exhausted, or [`DeviceError::Cancelled`]
    #[instrument(skip(self, cancel))]
    pub async fn version(&self, cancel: &CancellationToken) -> Result<Version, DeviceError> {
        let url = self.build_url("/client", "command", "version");
        self.retry.run(cancel, || self.version_once(&url)).await
    }

    async fn version_once(&self, url: &Url) -> Result<Version, DeviceError> {
        let response = self.send(self.http.get(url.clone()), url).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(DeviceError::unexpected_status(url.as_str(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DeviceError::from_reqwest(url.as_str(), e))?;
        let version = parse_version_document(&String::from_utf8_lossy(&body))?;

        debug!(chip = %version.chip_model, firmware = %version.firmware_version, "device version");
        Ok(version)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HARDWARE_VERSION: &str =
        "LZ1801EDPG:1.0.0:2016-03-19:72 LZ1801EDRS:1.0.0:2016-03-19:72 SPEED:-H:SPEED";

    #[test]
    fn test_parse_real_hardware_string() {
        let version = parse_version_string(HARDWARE_VERSION).unwrap();
        assert_eq!(version.chip_model, "LZ1801EDPG");
        assert_eq!(version.firmware_version, "1.0.0");
        assert_eq!(version.date, "2016-03-19");
        assert_eq!(version.build_number, "72");
        assert_eq!(version.raw, HARDWARE_VERSION);
    }

    #[test]
    fn test_parse_single_component_string() {
        let version = parse_version_string("LZ1001:2.0.1:2020-01-15:100").unwrap();
        assert_eq!(version.chip_model, "LZ1001");
        assert_eq!(version.firmware_version, "2.0.1");
        assert_eq!(version.date, "2020-01-15");
        assert_eq!(version.build_number, "100");
    }

    #[test]
    fn test_parse_empty_string_fails() {
        assert!(matches!(
            parse_version_string(""),
            Err(DeviceError::InvalidResponse { .. })
        ));
        assert!(matches!(
            parse_version_string("   "),
            Err(DeviceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_parse_wrong_component_count_fails() {
        let err = parse_version_string("LZ1801:1.0.0:2016-03-19").unwrap_err();
        assert!(err.to_string().contains("got 3"), "got: {err}");
        let err = parse_version_string("LZ1801:1.0.0:2016-03-19:72:extra").unwrap_err();
        assert!(err.to_string().contains("got 5"), "got: {err}");
    }

    #[test]
    fn test_parse_version_document() {
        let xml = format!(
            "<?xml version=\"1.0\"?><response><device><version>{HARDWARE_VERSION}</version></device></response>"
        );
        let version = parse_version_document(&xml).unwrap();
        assert_eq!(version.chip_model, "LZ1801EDPG");
    }

    #[test]
    fn test_parse_version_document_empty_version() {
        let xml = "<response><device><version></version></device></response>";
        let err = parse_version_document(xml).unwrap_err();
        assert!(err.to_string().contains("empty"), "got: {err}");
    }

    #[test]
    fn test_parse_version_document_malformed() {
        let err = parse_version_document("<html>not xml").unwrap_err();
        assert!(matches!(err, DeviceError::InvalidResponse { .. }));
    }
}
