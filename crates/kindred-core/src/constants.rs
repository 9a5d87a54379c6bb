//! Engine-wide constants
//!
//! Centralized location for payload keys, dedupe key literals and the
//! default lifecycle limits used across multiple modules.

/// Notification lifetime in seconds (24 hours)
pub const NOTIFICATION_TTL_SECS: u64 = 24 * 60 * 60;

/// Maximum number of new notifications of one type per calendar day
pub const DAILY_TYPE_CAP: usize = 3;

/// Default directory for persisted engine state
pub const DEFAULT_DATA_DIR: &str = "kindred_data";

/// Default user/installation key used when none is configured
pub const DEFAULT_USER_ID: &str = "local";

/// Subdirectory (under the data dir) holding one JSON file per user
pub const NOTIFICATIONS_DIR: &str = "notifications";

/// Placeholder used when a payload lacks the field a dedupe key needs
pub const UNKNOWN_FIELD: &str = "unknown";

/// Default slug for system notifications
pub const DEFAULT_SYSTEM_SLUG: &str = "general";

/// Shared dedupe key for the daily profile-view aggregate
pub const DAILY_VIEW_KEY: &str = "view:daily";

// Payload keys
pub mod payload_keys {
    /// The other user involved in the event
    pub const COUNTERPART_ID: &str = "counterpartId";
    /// Chat conversation; also the group id for mark-read-for-group
    pub const CONVERSATION_ID: &str = "conversationId";
    /// Confession the reaction/reply belongs to
    pub const CONFESSION_ID: &str = "confessionId";
    /// System notification slug
    pub const SLUG: &str = "slug";
    /// Running counter for aggregated notifications
    pub const COUNT: &str = "count";
}
