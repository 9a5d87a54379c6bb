//! Merge rules for repeated events landing on an existing dedupe key.

use crate::constants::payload_keys;
use crate::models::{Notification, NotificationInput};

use super::dedupe::is_aggregated_key;

/// Body text for the daily profile-view aggregate
pub fn profile_view_body(count: u64) -> String {
    if count <= 1 {
        "Someone viewed your profile".to_string()
    } else {
        format!("{} people viewed your profile", count)
    }
}

/// Apply a repeated event to an existing entry in place.
///
/// Either way the entry becomes fresh, unseen activity: timestamps move to
/// `now`, expiry to `now + ttl`, and any read state is cleared.
pub fn merge_into(existing: &mut Notification, input: NotificationInput, now: u64, ttl: u64) {
    if is_aggregated_key(&existing.dedupe_key) {
        let count = existing.count().saturating_add(1);
        existing
            .payload
            .insert(payload_keys::COUNT.to_string(), count.to_string());
        existing.body = profile_view_body(count);
    } else {
        existing.title = input.title;
        existing.body = input.body;
        existing.payload = input.payload;
    }

    existing.created_at = now;
    existing.expires_at = Some(now.saturating_add(ttl));
    existing.read_at = None;
}
