//! Application-facing facade for the locally owned notification set.
//!
//! Bundles a [`LocalBackedSource`], the feed over it, the shared phase gate
//! and the clock, and exposes the operations the app calls. Everything here
//! is fire-and-forget: emits and reads never report failure to the caller.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::error::StorageError;
use crate::feed::{FeedView, NotificationFeed};
use crate::models::{AppPhase, Notification, NotificationInput, NotificationType, Payload};
use crate::source::{LocalBackedSource, NotificationSource};
use crate::store::{CleanupContext, IntakeOutcome, PhaseGate};

pub struct NotificationCenter {
    source: Arc<LocalBackedSource>,
    feed: NotificationFeed,
    phase: PhaseGate,
    clock: Arc<dyn Clock>,
}

impl NotificationCenter {
    /// File-backed center on the wall clock. Call [`load`](Self::load) next.
    pub fn open(config: &CoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CoreConfig, clock: Arc<dyn Clock>) -> Self {
        let phase = PhaseGate::default();
        let source = Arc::new(LocalBackedSource::new(config, clock.clone(), phase.clone()));
        Self::assemble(source, phase, clock, config.ttl_secs)
    }

    /// Center with no persistence, already loaded.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        let phase = PhaseGate::default();
        let source = Arc::new(LocalBackedSource::in_memory(clock.clone(), phase.clone()));
        source.load(None);
        let ttl_secs = source.ttl_secs();
        Self::assemble(source, phase, clock, ttl_secs)
    }

    fn assemble(
        source: Arc<LocalBackedSource>,
        phase: PhaseGate,
        clock: Arc<dyn Clock>,
        ttl_secs: u64,
    ) -> Self {
        let feed = NotificationFeed::new(source.clone(), phase.clone(), clock.clone())
            .with_ttl_secs(ttl_secs);
        Self {
            source,
            feed,
            phase,
            clock,
        }
    }

    // ===== Startup =====

    /// Load the persisted list and run startup cleanup.
    pub fn load(&self, valid_counterparts: Option<&HashSet<String>>) {
        self.source.load(valid_counterparts);
    }

    pub fn is_ready(&self) -> bool {
        self.source.is_ready()
    }

    pub async fn ready(&self) {
        self.source.ready().await;
    }

    // ===== Intake =====

    pub fn emit(&self, kind: NotificationType, title: &str, body: &str, payload: Option<Payload>) {
        let input =
            NotificationInput::new(kind, title, body).with_payload(payload.unwrap_or_default());
        self.emit_input(input);
    }

    /// Same as [`emit`](Self::emit) but reports what intake did with it.
    pub fn emit_input(&self, input: NotificationInput) -> IntakeOutcome {
        self.source.emit(input)
    }

    // ===== Queries =====

    pub fn view(&self) -> FeedView {
        self.feed.view()
    }

    pub fn list(&self) -> Vec<Notification> {
        self.feed.list()
    }

    pub fn unseen_count(&self) -> usize {
        self.feed.unseen_count()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.feed.subscribe()
    }

    // ===== Reads =====

    pub fn mark_read(&self, id: &str) {
        self.feed.mark_read(id);
    }

    pub fn mark_all_read(&self) {
        self.feed.mark_all_read();
    }

    pub fn mark_read_by_dedupe_key(&self, key: &str) {
        self.feed.mark_read_by_dedupe_key(key);
    }

    pub fn mark_read_for_group(&self, group_id: &str) {
        self.feed.mark_read_for_group(group_id);
    }

    // ===== Cleanup =====

    /// Drop the entry of `kind` about `counterpart_id` (relationship ended).
    pub fn remove_for_counterpart(&self, counterpart_id: &str, kind: NotificationType) -> usize {
        self.source.remove_for_counterpart(counterpart_id, &kind)
    }

    pub fn remove_orphaned(&self, valid: &HashSet<String>, context: CleanupContext) -> usize {
        self.source.remove_orphaned(valid, context)
    }

    pub fn sweep_expired(&self, now: u64) -> usize {
        self.source.sweep_expired(now)
    }

    /// Sweep against the center's own clock
    pub fn sweep(&self) -> usize {
        self.sweep_expired(self.clock.now())
    }

    /// Forget everything, including the persisted file (logout).
    pub fn clear(&self) {
        self.source.clear();
    }

    // ===== Phase =====

    pub fn set_phase(&self, phase: AppPhase) {
        self.phase.set(phase);
    }

    pub fn phase(&self) -> AppPhase {
        self.phase.current()
    }

    // ===== Accessors =====

    pub fn source(&self) -> &Arc<LocalBackedSource> {
        &self.source
    }

    pub fn feed(&self) -> &NotificationFeed {
        &self.feed
    }

    /// Every stored entry, including read, expired and phase-hidden ones
    pub fn entries(&self) -> Arc<Vec<Notification>> {
        self.source.snapshot().entries
    }

    pub fn take_last_error(&self) -> Option<StorageError> {
        self.source.take_last_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::constants::NOTIFICATION_TTL_SECS;
    use tempfile::tempdir;

    const NOW: u64 = 1_710_072_000;

    fn center() -> (NotificationCenter, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(NOW));
        (NotificationCenter::in_memory(clock.clone()), clock)
    }

    fn payload(pairs: &[(&str, &str)]) -> Option<Payload> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_like_emit_merge_read() {
        let (center, clock) = center();
        center.emit(NotificationType::Like, "New like", "", payload(&[("counterpartId", "u1")]));
        let list = center.list();
        assert_eq!(list.len(), 1);
        assert_eq!(center.unseen_count(), 1);
        let id = list[0].id.clone();

        center.mark_read(&id);
        clock.advance(10);
        center.emit(NotificationType::Like, "New like", "", payload(&[("counterpartId", "u1")]));
        let list = center.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, id);
        assert_eq!(list[0].created_at, NOW + 10);
        assert!(!list[0].is_read());

        center.mark_read(&id);
        assert!(center.list().is_empty());
        assert_eq!(center.unseen_count(), 0);
    }

    #[test]
    fn test_three_profile_views_aggregate() {
        let (center, _) = center();
        for _ in 0..3 {
            center.emit(NotificationType::ProfileViewed, "Profile views", "", None);
        }
        let list = center.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].payload.get("count").map(String::as_str), Some("3"));
        assert!(list[0].body.contains('3'));
    }

    #[test]
    fn test_remove_for_counterpart_unread_like() {
        let (center, _) = center();
        center.emit(NotificationType::Like, "New like", "", payload(&[("counterpartId", "u1")]));
        center.emit(NotificationType::Like, "New like", "", payload(&[("counterpartId", "u2")]));

        assert_eq!(center.remove_for_counterpart("u1", NotificationType::Like), 1);
        let list = center.list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].counterpart_id(), Some("u2"));
    }

    #[test]
    fn test_daily_cap_per_type() {
        let (center, _) = center();
        for user in ["u1", "u2", "u3", "u4"] {
            let fields = payload(&[("counterpartId", user)]);
            center.emit(NotificationType::Match, "New match", "", fields);
        }
        assert_eq!(center.list().len(), 3);
        // Other types have their own budget
        center.emit(NotificationType::Like, "New like", "", payload(&[("counterpartId", "u4")]));
        assert_eq!(center.list().len(), 4);
        // Merges are never capped
        let fields = payload(&[("counterpartId", "u1")]);
        center.emit(NotificationType::Match, "Matched again", "", fields);
        assert_eq!(center.list()[0].title, "Matched again");
    }

    #[test]
    fn test_phase_toggle_never_reveals_blocked() {
        let (center, _) = center();
        center.set_phase(AppPhase::Private);
        assert_eq!(center.phase(), AppPhase::Private);
        center.emit(
            NotificationType::CrossedPaths,
            "Crossed paths",
            "",
            payload(&[("counterpartId", "u9")]),
        );
        center.set_phase(AppPhase::Public);
        assert!(center.list().is_empty());
        assert!(center.entries().is_empty());
    }

    #[test]
    fn test_sweep_and_orphans() {
        let (center, clock) = center();
        center.emit(NotificationType::Match, "New match", "", payload(&[("counterpartId", "u1")]));
        center.emit(NotificationType::Match, "New match", "", payload(&[("counterpartId", "u2")]));
        center.emit(NotificationType::System, "Welcome", "", payload(&[("slug", "welcome")]));

        let valid: HashSet<String> = ["u2".to_string()].into_iter().collect();
        assert_eq!(center.remove_orphaned(&valid, CleanupContext::Runtime), 1);
        assert_eq!(center.entries().len(), 2);

        clock.advance(NOTIFICATION_TTL_SECS);
        assert_eq!(center.sweep(), 2);
        assert!(center.entries().is_empty());
    }

    #[test]
    fn test_group_and_key_reads() {
        let (center, _) = center();
        center.emit(
            NotificationType::Message,
            "New message",
            "hey",
            payload(&[("conversationId", "c1"), ("counterpartId", "u1")]),
        );
        center.emit(NotificationType::System, "Update", "", payload(&[("slug", "release")]));
        assert_eq!(center.unseen_count(), 2);

        center.mark_read_for_group("c1");
        assert_eq!(center.unseen_count(), 1);
        center.mark_read_by_dedupe_key("system:release");
        assert_eq!(center.unseen_count(), 0);
        assert_eq!(center.entries().len(), 2);
    }

    #[test]
    fn test_open_and_reload_from_disk() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(dir.path()).with_user_id("me");
        let clock = Arc::new(ManualClock::new(NOW));

        let center = NotificationCenter::with_clock(&config, clock.clone());
        assert!(!center.is_ready());
        center.load(None);
        center.emit(NotificationType::Like, "New like", "", payload(&[("counterpartId", "u1")]));
        center.mark_all_read();
        center.emit(NotificationType::Like, "New like", "", payload(&[("counterpartId", "u2")]));

        let reopened = NotificationCenter::with_clock(&config, clock);
        reopened.load(None);
        assert_eq!(reopened.entries().len(), 2);
        assert_eq!(reopened.unseen_count(), 1);
        assert!(reopened.take_last_error().is_none());
    }

    #[tokio::test]
    async fn test_ready_after_in_memory_construction() {
        let (center, _) = center();
        center.ready().await;
        assert!(center.is_ready());
    }
}
