use serde::{Deserialize, Serialize};

/// A playable video link found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub url: String,
    /// Best-effort name of the hosting service ("Voe", "Streamtape", ...).
    pub hoster: String,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>, hoster: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hoster: hoster.into(),
        }
    }
}
