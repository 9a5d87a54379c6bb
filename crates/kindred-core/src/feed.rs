//! Unified notification feed.
//!
//! A pure projection over the current source state plus any in-flight
//! reads; it is recomputed on every call and never cached. Read entries are
//! removed from the list rather than styled differently.

use std::sync::Arc;
use tokio::sync::watch;

use crate::clock::Clock;
use crate::constants::NOTIFICATION_TTL_SECS;
use crate::models::Notification;
use crate::source::NotificationSource;
use crate::store::{is_expired_with_ttl, PhaseGate, ReadTicket};

/// What the UI renders: the visible list and the badge count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedView {
    pub items: Vec<Notification>,
    pub unseen_count: usize,
    /// Source revision the view was computed from
    pub revision: u64,
}

#[derive(Clone)]
pub struct NotificationFeed {
    source: Arc<dyn NotificationSource>,
    phase: PhaseGate,
    clock: Arc<dyn Clock>,
    ttl_secs: u64,
}

impl NotificationFeed {
    pub fn new(
        source: Arc<dyn NotificationSource>,
        phase: PhaseGate,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            phase,
            clock,
            ttl_secs: NOTIFICATION_TTL_SECS,
        }
    }

    /// TTL applied to legacy entries that carry no explicit expiry
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn view(&self) -> FeedView {
        let snapshot = self.source.snapshot();
        let now = self.clock.now();

        let live: Vec<Notification> = snapshot
            .entries
            .iter()
            .filter(|n| !is_expired_with_ttl(n, now, self.ttl_secs))
            .map(|n| {
                let mut n = n.clone();
                if !n.is_read() && snapshot.is_pending_read(&n) {
                    n.read_at = Some(now);
                }
                n
            })
            .collect();

        let items: Vec<Notification> = self
            .phase
            .filter(live)
            .into_iter()
            .filter(|n| !n.is_read())
            .collect();

        let unseen_count = items.iter().filter(|n| !n.is_read()).count();
        FeedView {
            items,
            unseen_count,
            revision: snapshot.revision,
        }
    }

    pub fn list(&self) -> Vec<Notification> {
        self.view().items
    }

    pub fn unseen_count(&self) -> usize {
        self.view().unseen_count
    }

    pub fn mark_read(&self, id: &str) -> ReadTicket {
        self.source.mark_read(id)
    }

    pub fn mark_all_read(&self) -> ReadTicket {
        self.source.mark_all_read()
    }

    pub fn mark_read_by_dedupe_key(&self, key: &str) -> ReadTicket {
        self.source.mark_read_by_dedupe_key(key)
    }

    pub fn mark_read_for_group(&self, group_id: &str) -> ReadTicket {
        self.source.mark_read_for_group(group_id)
    }

    /// Changes whenever a recomputed view may differ
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.source.subscribe()
    }
}
