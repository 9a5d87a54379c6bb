use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{payload_keys, NOTIFICATION_TTL_SECS};

/// Opaque identifying fields carried by a notification.
/// Only read by the engine to compute dedupe keys, group ids and counters.
pub type Payload = BTreeMap<String, String>;

/// Kind of event a notification was created from.
///
/// Unknown kinds are preserved as `Other` rather than rejected, so a newer
/// event originator never breaks an older engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    Match,
    Like,
    SuperLike,
    Message,
    CrossedPaths,
    /// Proximity ping while both users are in public discovery
    Nearby,
    ProfileViewed,
    System,
    ConfessionReaction,
    ConfessionReply,
    Other(String),
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Match => "match",
            Self::Like => "like",
            Self::SuperLike => "super_like",
            Self::Message => "message",
            Self::CrossedPaths => "crossed_paths",
            Self::Nearby => "nearby",
            Self::ProfileViewed => "profile_viewed",
            Self::System => "system",
            Self::ConfessionReaction => "confession_reaction",
            Self::ConfessionReply => "confession_reply",
            Self::Other(name) => name,
        }
    }

    /// Kinds that point at a relationship with another user and must go away
    /// when that relationship does (withdrawn like, unmatch, block).
    pub fn references_relationship(&self) -> bool {
        matches!(self, Self::Match | Self::Like | Self::SuperLike)
    }
}

impl From<&str> for NotificationType {
    fn from(value: &str) -> Self {
        match value {
            "match" => Self::Match,
            "like" => Self::Like,
            "super_like" => Self::SuperLike,
            "message" => Self::Message,
            "crossed_paths" => Self::CrossedPaths,
            "nearby" => Self::Nearby,
            "profile_viewed" => Self::ProfileViewed,
            "system" => Self::System,
            "confession_reaction" => Self::ConfessionReaction,
            "confession_reply" => Self::ConfessionReply,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming event handed to the intake pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationInput {
    pub kind: NotificationType,
    pub title: String,
    pub body: String,
    pub payload: Payload,
}

impl NotificationInput {
    pub fn new(kind: NotificationType, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: body.into(),
            payload: Payload::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// A single notification record.
///
/// `is_read` is derived from `read_at`, so the two can never disagree.
/// `expires_at` is optional for records written before it was tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub payload: Payload,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<u64>,
    /// Empty on legacy records; recomputed on load.
    #[serde(default)]
    pub dedupe_key: String,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Expiry instant, deriving it from `created_at` for legacy records
    pub fn effective_expires_at(&self) -> u64 {
        self.expires_at
            .unwrap_or_else(|| self.created_at.saturating_add(NOTIFICATION_TTL_SECS))
    }

    pub fn counterpart_id(&self) -> Option<&str> {
        self.payload
            .get(payload_keys::COUNTERPART_ID)
            .map(String::as_str)
    }

    /// Group this notification belongs to for bulk read (the conversation)
    pub fn group_id(&self) -> Option<&str> {
        self.payload
            .get(payload_keys::CONVERSATION_ID)
            .map(String::as_str)
    }

    /// Running counter of an aggregated notification (1 when absent or garbled)
    pub fn count(&self) -> u64 {
        self.payload
            .get(payload_keys::COUNT)
            .and_then(|c| c.parse().ok())
            .unwrap_or(1)
    }
}
