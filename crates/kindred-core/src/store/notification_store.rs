use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::constants::{payload_keys, DAILY_TYPE_CAP, NOTIFICATION_TTL_SECS};
use crate::models::{Notification, NotificationInput, NotificationType};

use super::aggregator::merge_into;
use super::dedupe::{is_aggregated_key, resolve_dedupe_key};
use super::expiry::is_expired_with_ttl;
use super::pending::ReadTarget;
use super::phase::PhaseGate;
use super::rate_limit::is_rate_limited;

/// Generate a unique notification ID using UUID v4
fn generate_notification_id() -> String {
    format!("ntf-{}", Uuid::new_v4())
}

/// What the intake pipeline did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Created(String),
    /// An existing entry with the same dedupe key was refreshed
    Merged(String),
    /// Dropped by the daily per-type cap
    RateLimited,
    /// Dropped because the current phase hides this kind
    PhaseBlocked,
}

/// Where an orphan cleanup was triggered from. Only affects logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupContext {
    /// Initial load; leftovers from a previous session are expected
    Startup,
    /// Mid-session; an orphan here means some cleanup path was missed
    Runtime,
}

/// Locally owned notification set.
///
/// Every mutation builds a new list and swaps it in, so a snapshot taken
/// before a mutation is never affected by it. `version` increases on every
/// published change.
pub struct NotificationStore {
    entries: Arc<Vec<Notification>>,
    version: u64,
    clock: Arc<dyn Clock>,
    phase: PhaseGate,
    ttl_secs: u64,
    daily_cap: usize,
}

impl NotificationStore {
    pub fn new(clock: Arc<dyn Clock>, phase: PhaseGate) -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            version: 0,
            clock,
            phase,
            ttl_secs: NOTIFICATION_TTL_SECS,
            daily_cap: DAILY_TYPE_CAP,
        }
    }

    pub fn from_config(config: &CoreConfig, clock: Arc<dyn Clock>, phase: PhaseGate) -> Self {
        let mut store = Self::new(clock, phase);
        store.ttl_secs = config.ttl_secs;
        store.daily_cap = config.daily_cap;
        store
    }

    // ===== Getters =====

    pub fn snapshot(&self) -> Arc<Vec<Notification>> {
        self.entries.clone()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.entries.iter().find(|n| n.id == id)
    }

    pub fn find_by_key(&self, dedupe_key: &str) -> Option<&Notification> {
        self.entries.iter().find(|n| n.dedupe_key == dedupe_key)
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    fn publish(&mut self, next: Vec<Notification>) {
        self.entries = Arc::new(next);
        self.version += 1;
    }

    // ===== Mutations =====

    /// Replace the whole set (initial load). Legacy records without a
    /// dedupe key get one computed from their type and payload.
    pub fn replace_all(&mut self, mut entries: Vec<Notification>) {
        for entry in entries.iter_mut().filter(|n| n.dedupe_key.is_empty()) {
            let instant = format!("{}-{}", entry.created_at, entry.id);
            entry.dedupe_key = resolve_dedupe_key(&entry.kind, &entry.payload, &instant);
        }
        self.publish(entries);
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.publish(Vec::new());
        }
    }

    /// Event intake: merge into an existing slot, drop, or create.
    ///
    /// Never fails. Malformed payloads and unknown kinds simply produce
    /// keys that do not collide with anything.
    pub fn apply_event(&mut self, input: NotificationInput) -> IntakeOutcome {
        if !self.phase.allows(&input.kind) {
            tracing::debug!(
                "intake: dropping {} while phase is {}",
                input.kind,
                self.phase.current().label()
            );
            return IntakeOutcome::PhaseBlocked;
        }

        let now = self.clock.now();
        let id = generate_notification_id();
        let instant = format!("{}-{}", now, id);
        let key = resolve_dedupe_key(&input.kind, &input.payload, &instant);

        let mut next = (*self.entries).clone();

        // An expired slot is dead even before the sweep gets to it
        let ttl = self.ttl_secs;
        next.retain(|n| n.dedupe_key != key || !is_expired_with_ttl(n, now, ttl));

        if let Some(pos) = next.iter().position(|n| n.dedupe_key == key) {
            let mut existing = next.remove(pos);
            merge_into(&mut existing, input, now, self.ttl_secs);
            let merged_id = existing.id.clone();
            // Most recently touched first
            next.insert(0, existing);
            self.publish(next);
            return IntakeOutcome::Merged(merged_id);
        }

        let aggregated = is_aggregated_key(&key);
        if !aggregated
            && is_rate_limited(&next, &input.kind, self.clock.day_bounds(now), self.daily_cap)
        {
            tracing::debug!("intake: daily cap reached for {}, dropping {}", input.kind, key);
            return IntakeOutcome::RateLimited;
        }

        let mut payload = input.payload;
        if aggregated {
            payload.insert(payload_keys::COUNT.to_string(), "1".to_string());
        }

        next.insert(
            0,
            Notification {
                id: id.clone(),
                kind: input.kind,
                title: input.title,
                body: input.body,
                payload,
                created_at: now,
                expires_at: Some(now.saturating_add(self.ttl_secs)),
                read_at: None,
                dedupe_key: key,
            },
        );
        self.publish(next);
        IntakeOutcome::Created(id)
    }

    /// Mark every unread entry covered by `target` as read.
    /// Returns how many entries changed.
    pub fn mark_read(&mut self, target: &ReadTarget) -> usize {
        let now = self.clock.now();
        let mut next = (*self.entries).clone();
        let mut changed = 0;
        for entry in next.iter_mut().filter(|n| !n.is_read() && target.covers(n)) {
            entry.read_at = Some(now);
            changed += 1;
        }
        if changed > 0 {
            self.publish(next);
        }
        changed
    }

    fn retain_published(&mut self, keep: impl Fn(&Notification) -> bool) -> Vec<Notification> {
        let (kept, removed): (Vec<Notification>, Vec<Notification>) =
            self.entries.iter().cloned().partition(|n| keep(n));
        if !removed.is_empty() {
            self.publish(kept);
        }
        removed
    }

    /// Privileged delete of every `kind` entry about `counterpart_id`
    /// (e.g. a withdrawn like). Bypasses the merge path entirely.
    pub fn remove_for_counterpart(
        &mut self,
        counterpart_id: &str,
        kind: &NotificationType,
    ) -> usize {
        let removed = self.retain_published(|n| {
            !(&n.kind == kind && n.counterpart_id() == Some(counterpart_id))
        });
        if !removed.is_empty() {
            tracing::debug!(
                "cleanup: removed {} {} notification(s) for {}",
                removed.len(),
                kind,
                counterpart_id
            );
        }
        removed.len()
    }

    /// Drop relationship notifications whose counterpart is no longer valid.
    ///
    /// Entries without a counterpart, and kinds that do not reference a
    /// relationship, are left alone.
    pub fn remove_orphaned(&mut self, valid: &HashSet<String>, context: CleanupContext) -> usize {
        let removed = self.retain_published(|n| {
            if !n.kind.references_relationship() {
                return true;
            }
            match n.counterpart_id() {
                Some(counterpart) => valid.contains(counterpart),
                None => true,
            }
        });

        match context {
            CleanupContext::Startup => {
                if !removed.is_empty() {
                    tracing::info!(
                        "cleanup: removed {} orphaned notification(s) on startup",
                        removed.len()
                    );
                }
            }
            CleanupContext::Runtime => {
                for entry in &removed {
                    tracing::warn!(
                        id = %entry.id,
                        kind = %entry.kind,
                        counterpart = entry.counterpart_id().unwrap_or_default(),
                        "cleanup: orphaned notification found mid-session"
                    );
                }
            }
        }
        removed.len()
    }

    /// Delete every entry that is expired at `now`.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let ttl = self.ttl_secs;
        let removed = self.retain_published(|n| !is_expired_with_ttl(n, now, ttl));
        if !removed.is_empty() {
            tracing::debug!("sweep: removed {} expired notification(s)", removed.len());
        }
        removed.len()
    }
}
