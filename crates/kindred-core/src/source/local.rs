//! Locally authoritative source: the engine owns the set and persists it.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::error::StorageError;
use crate::models::{Notification, NotificationInput, NotificationType};
use crate::store::{
    CleanupContext, IntakeOutcome, NotificationFile, NotificationStore, PhaseGate, ReadOutcome,
    ReadTarget, ReadTicket,
};

use super::{NotificationSource, SourceSnapshot};

pub struct LocalBackedSource {
    store: Mutex<NotificationStore>,
    /// None for in-memory sources (tests, demo data)
    file: Option<NotificationFile>,
    clock: Arc<dyn Clock>,
    revision: watch::Sender<u64>,
    ready: watch::Sender<bool>,
    /// Last persistence error (for surfacing to UI)
    last_error: Mutex<Option<StorageError>>,
}

impl LocalBackedSource {
    /// File-backed source. Call [`load`](Self::load) before trusting reads.
    pub fn new(config: &CoreConfig, clock: Arc<dyn Clock>, phase: PhaseGate) -> Self {
        let file = NotificationFile::new(&config.data_dir, &config.user_id);
        Self::build(
            NotificationStore::from_config(config, clock.clone(), phase),
            Some(file),
            clock,
        )
    }

    /// Source with no persistence behind it.
    pub fn in_memory(clock: Arc<dyn Clock>, phase: PhaseGate) -> Self {
        Self::build(NotificationStore::new(clock.clone(), phase), None, clock)
    }

    fn build(
        store: NotificationStore,
        file: Option<NotificationFile>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        let (ready, _) = watch::channel(false);
        Self {
            store: Mutex::new(store),
            file,
            clock,
            revision,
            ready,
            last_error: Mutex::new(None),
        }
    }

    // ===== Startup =====

    /// Initial load: read the persisted list, sweep what expired while the
    /// app was closed, drop orphans, then signal readiness.
    ///
    /// `valid_counterparts` is the current set of live relationships, when
    /// the caller has it; without it orphan cleanup is skipped. A corrupt or
    /// unreadable file starts the set empty, is moved aside rather than
    /// overwritten, and is kept in `last_error` until taken.
    pub fn load(&self, valid_counterparts: Option<&HashSet<String>>) {
        let mut load_failed = false;
        let loaded = match &self.file {
            Some(file) => match file.load() {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        "notifications: failed to load {}: {}",
                        file.path().display(),
                        e
                    );
                    match file.quarantine() {
                        Ok(moved) => {
                            tracing::warn!("notifications: kept bad file as {}", moved.display())
                        }
                        Err(qe) => {
                            tracing::warn!("notifications: could not move bad file: {}", qe)
                        }
                    }
                    *self.last_error.lock() = Some(e);
                    load_failed = true;
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        let loaded_count = loaded.len();

        // Nothing to write back after a failed load; the next real
        // mutation persists.
        self.apply(!load_failed, |store| {
            store.replace_all(loaded);
            let expired = store.sweep_expired(self.clock.now());
            let orphaned = valid_counterparts
                .map(|valid| store.remove_orphaned(valid, CleanupContext::Startup))
                .unwrap_or(0);
            tracing::info!(
                "notifications: loaded {} ({} expired, {} orphaned)",
                loaded_count,
                expired,
                orphaned
            );
        });

        self.ready.send_replace(true);
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Resolves once [`load`](Self::load) has completed.
    pub async fn ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    // ===== Mutations =====

    /// Run `f` against the store; persist and bump the revision if it
    /// published a change.
    fn mutate<R>(&self, f: impl FnOnce(&mut NotificationStore) -> R) -> R {
        self.apply(true, f)
    }

    fn apply<R>(&self, persist: bool, f: impl FnOnce(&mut NotificationStore) -> R) -> R {
        let mut store = self.store.lock();
        let before = store.version();
        let result = f(&mut store);
        if store.version() != before {
            if persist {
                self.persist(&store.snapshot());
            }
            drop(store);
            self.revision.send_modify(|r| *r += 1);
        }
        result
    }

    fn persist(&self, entries: &[Notification]) {
        let Some(file) = &self.file else {
            return;
        };
        match file.save(entries) {
            Ok(()) => {
                // A load error stays until someone takes it
                let mut last_error = self.last_error.lock();
                if matches!(*last_error, Some(StorageError::Write(_))) {
                    *last_error = None;
                }
            }
            Err(e) => {
                tracing::warn!(
                    "notifications: failed to persist {}: {}",
                    file.path().display(),
                    e
                );
                *self.last_error.lock() = Some(e);
            }
        }
    }

    pub fn emit(&self, input: NotificationInput) -> IntakeOutcome {
        self.mutate(|store| store.apply_event(input))
    }

    pub fn remove_for_counterpart(&self, counterpart_id: &str, kind: &NotificationType) -> usize {
        self.mutate(|store| store.remove_for_counterpart(counterpart_id, kind))
    }

    pub fn remove_orphaned(&self, valid: &HashSet<String>, context: CleanupContext) -> usize {
        self.mutate(|store| store.remove_orphaned(valid, context))
    }

    pub fn sweep_expired(&self, now: u64) -> usize {
        self.mutate(|store| store.sweep_expired(now))
    }

    /// Drop everything, including the persisted file (logout).
    pub fn clear(&self) {
        self.mutate(|store| store.clear());
        if let Some(file) = &self.file {
            file.remove();
        }
    }

    // ===== Getters =====

    pub fn entries(&self) -> Arc<Vec<Notification>> {
        self.store.lock().snapshot()
    }

    pub fn ttl_secs(&self) -> u64 {
        self.store.lock().ttl_secs()
    }

    pub fn take_last_error(&self) -> Option<StorageError> {
        self.last_error.lock().take()
    }
}

impl NotificationSource for LocalBackedSource {
    fn snapshot(&self) -> SourceSnapshot {
        SourceSnapshot {
            entries: self.entries(),
            pending: Vec::new(),
            revision: *self.revision.borrow(),
        }
    }

    fn submit_read(&self, target: ReadTarget) -> ReadTicket {
        self.mutate(|store| store.mark_read(&target));
        ReadTicket::settled(ReadOutcome::Applied)
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::constants::NOTIFICATION_TTL_SECS;
    use std::fs;
    use tempfile::tempdir;

    const NOW: u64 = 1_710_072_000;

    fn like(counterpart: &str) -> NotificationInput {
        NotificationInput::new(NotificationType::Like, "New like", "Someone liked you")
            .with_field("counterpartId", counterpart)
    }

    #[test]
    fn test_mutations_persist_and_reload() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(dir.path()).with_user_id("u-me");
        let clock = Arc::new(ManualClock::new(NOW));

        let source = LocalBackedSource::new(&config, clock.clone(), PhaseGate::default());
        source.load(None);
        source.emit(like("u1"));
        source.emit(like("u2"));
        source.mark_read(&source.entries()[0].id.clone());

        let reopened = LocalBackedSource::new(&config, clock, PhaseGate::default());
        reopened.load(None);
        let entries = reopened.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].dedupe_key, "like:u2");
        assert!(entries[0].is_read());
        assert!(!entries[1].is_read());
    }

    #[test]
    fn test_load_sweeps_expired_and_orphans() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(dir.path());
        let clock = Arc::new(ManualClock::new(NOW));

        let source = LocalBackedSource::new(&config, clock.clone(), PhaseGate::default());
        source.load(None);
        source.emit(like("u1"));
        source.emit(like("u2"));
        clock.advance(NOTIFICATION_TTL_SECS / 2);
        source.emit(like("gone"));
        clock.advance(NOTIFICATION_TTL_SECS / 2);

        let valid: HashSet<String> = ["u1", "u2"].iter().map(|s| s.to_string()).collect();
        let reopened = LocalBackedSource::new(&config, clock, PhaseGate::default());
        assert!(!reopened.is_ready());
        reopened.load(Some(&valid));
        assert!(reopened.is_ready());
        // u1/u2 expired exactly at the TTL boundary, "gone" is orphaned
        assert!(reopened.entries().is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty_and_reports() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(dir.path());
        let file = NotificationFile::new(dir.path(), &config.user_id);
        fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        fs::write(file.path(), "[{broken").unwrap();

        let source =
            LocalBackedSource::new(&config, Arc::new(ManualClock::new(NOW)), PhaseGate::default());
        source.load(None);
        assert!(source.entries().is_empty());
        assert!(source.is_ready());

        // The original bytes survive next to the (now absent) live file
        let corrupt = file.path().with_extension("json.corrupt");
        assert_eq!(fs::read_to_string(&corrupt).unwrap(), "[{broken");
        assert!(!file.path().exists());

        // A later successful save does not hide the load failure
        source.emit(like("u1"));
        assert!(file.path().exists());
        assert!(matches!(source.take_last_error(), Some(StorageError::Parse(_))));
        assert!(source.take_last_error().is_none());
        assert_eq!(fs::read_to_string(&corrupt).unwrap(), "[{broken");
    }

    #[test]
    fn test_revision_bumps_only_on_change() {
        let source =
            LocalBackedSource::in_memory(Arc::new(ManualClock::new(NOW)), PhaseGate::default());
        let rx = source.subscribe();
        source.emit(like("u1"));
        assert_eq!(*rx.borrow(), 1);

        source.mark_read("missing");
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(source.snapshot().revision, 1);
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempdir().unwrap();
        let config = CoreConfig::new(dir.path());
        let source =
            LocalBackedSource::new(&config, Arc::new(ManualClock::new(NOW)), PhaseGate::default());
        source.load(None);
        source.emit(like("u1"));
        let file = NotificationFile::new(dir.path(), &config.user_id);
        assert!(file.path().exists());

        source.clear();
        assert!(source.entries().is_empty());
        assert!(!file.path().exists());
    }

    #[tokio::test]
    async fn test_ready_resolves_after_load() {
        let source = Arc::new(LocalBackedSource::in_memory(
            Arc::new(ManualClock::new(NOW)),
            PhaseGate::default(),
        ));
        let waiter = {
            let source = source.clone();
            tokio::spawn(async move { source.ready().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        source.load(None);
        waiter.await.unwrap();
        assert!(source.is_ready());
    }
}
