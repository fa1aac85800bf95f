//! Default User-Agent string for requests sent to the card.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/haimgel/ezshare-sync";

/// Default User-Agent for device requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("ezshare-sync/{version} (+{PROJECT_UA_URL})")
}
