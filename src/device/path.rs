//! Conversion from slash-separated paths to the card's drive-letter paths.

/// Drive prefix the card uses for the SD card root.
const DRIVE_ROOT: &str = "A:";

/// Converts a slash-separated device path to the card's `A:\…` form.
///
/// ```
/// use ezshare_sync::to_device_path;
///
/// assert_eq!(to_device_path("/"), "A:");
/// assert_eq!(to_device_path("/DATALOG/20260104"), r"A:\DATALOG\20260104");
/// ```
#[must_use]
pub fn to_device_path(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return DRIVE_ROOT.to_string();
    }
    format!("{DRIVE_ROOT}\\{}", trimmed.replace('/', "\\"))
}
