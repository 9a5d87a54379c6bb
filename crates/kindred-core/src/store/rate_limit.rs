use crate::models::{Notification, NotificationType};

/// Whether creating another `kind` notification today would exceed `cap`.
///
/// `day` is the `[start, end)` window of the current calendar day. Only the
/// new-entry path consults this; merges into an existing slot never count.
pub fn is_rate_limited(
    entries: &[Notification],
    kind: &NotificationType,
    day: (u64, u64),
    cap: usize,
) -> bool {
    let (start, end) = day;
    let created_today = entries
        .iter()
        .filter(|n| &n.kind == kind && n.created_at >= start && n.created_at < end)
        .count();
    created_today >= cap
}
