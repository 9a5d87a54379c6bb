use serde::{Deserialize, Serialize};

/// Application-wide operating context that gates location-based notifications.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppPhase {
    /// Public discovery: everything is creatable and visible
    #[default]
    Public,
    /// Private/incognito: proximity-style notifications are suppressed
    Private,
}

impl AppPhase {
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::Private)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}
