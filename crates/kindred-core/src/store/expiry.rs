use crate::constants::NOTIFICATION_TTL_SECS;
use crate::models::Notification;

/// Whether a notification has outlived its TTL at `now`.
///
/// An explicit `expires_at` is authoritative. Legacy records without one
/// expire once they are strictly older than the TTL.
pub fn is_expired(entry: &Notification, now: u64) -> bool {
    is_expired_with_ttl(entry, now, NOTIFICATION_TTL_SECS)
}

/// [`is_expired`] with a configured TTL for legacy records
pub fn is_expired_with_ttl(entry: &Notification, now: u64, ttl: u64) -> bool {
    match entry.expires_at {
        Some(expires_at) => expires_at <= now,
        None => now.saturating_sub(entry.created_at) > ttl,
    }
}
