//! Dedupe key resolution.
//!
//! A dedupe key names the logical slot a notification occupies. Repeated
//! events with the same key update one record instead of creating many.
//! Resolution is pure and never fails: a missing identifying field degrades
//! to `"unknown"`, an unrecognized kind to a key that is unique per event.

use crate::constants::{payload_keys, DAILY_VIEW_KEY, DEFAULT_SYSTEM_SLUG, UNKNOWN_FIELD};
use crate::models::{NotificationType, Payload};

fn field<'a>(payload: &'a Payload, key: &str) -> &'a str {
    payload
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN_FIELD)
}

/// Resolve the dedupe key for an event.
///
/// `instant` is only used for unrecognized kinds and must be unique per
/// creation (the intake pipeline passes the creation time plus the new id).
pub fn resolve_dedupe_key(kind: &NotificationType, payload: &Payload, instant: &str) -> String {
    let counterpart = || field(payload, payload_keys::COUNTERPART_ID);

    match kind {
        NotificationType::Match => format!("match:{}", counterpart()),
        NotificationType::Like => format!("like:{}", counterpart()),
        NotificationType::SuperLike => format!("super_like:{}", counterpart()),
        NotificationType::Message => {
            let target = payload
                .get(payload_keys::CONVERSATION_ID)
                .filter(|v| !v.is_empty())
                .map(String::as_str)
                .unwrap_or_else(counterpart);
            format!("message:{}", target)
        }
        NotificationType::CrossedPaths => format!("crossed_paths:{}", counterpart()),
        NotificationType::Nearby => format!("nearby:{}", counterpart()),
        NotificationType::ProfileViewed => DAILY_VIEW_KEY.to_string(),
        NotificationType::System => {
            let slug = payload
                .get(payload_keys::SLUG)
                .filter(|v| !v.is_empty())
                .map(String::as_str)
                .unwrap_or(DEFAULT_SYSTEM_SLUG);
            format!("system:{}", slug)
        }
        NotificationType::ConfessionReaction | NotificationType::ConfessionReply => {
            format!("{}:{}", kind, field(payload, payload_keys::CONFESSION_ID))
        }
        NotificationType::Other(name) => format!("{}:{}", name, instant),
    }
}

/// Whether entries under this key merge into a running counter.
pub fn is_aggregated_key(key: &str) -> bool {
    key == DAILY_VIEW_KEY
}
