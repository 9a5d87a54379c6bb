//! Remote-synced source: the remote store is authoritative, this side only
//! caches its last query result and tracks reads still in flight.
//!
//! ## Read lifecycle
//! 1. A pending marker is registered and the revision bumped, so every view
//!    shows the entry as read immediately.
//! 2. The remote write runs on a spawned task. There is no cancellation.
//! 3. On success the list is re-queried before the marker is cleared, so the
//!    entry does not flash back as unread.
//! 4. On failure the marker is cleared and the revision bumped; the entry
//!    shows as unread again and the user can simply retry.
//!
//! The outcome is delivered through the [`ReadTicket`]. A consumer torn down
//! mid-flight just drops its ticket; the source still settles its marker.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::RemoteError;
use crate::models::{Notification, RemoteNotificationRecord};
use crate::store::{resolve_dedupe_key, PendingLedger, ReadOutcome, ReadTarget, ReadTicket};

use super::{NotificationSource, SourceSnapshot};

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Contract of the remote notification store.
///
/// Futures are `'static` so they can be driven from a spawned task;
/// implementations clone whatever they need out of the arguments.
pub trait NotificationApi: Send + Sync {
    fn list(
        &self,
        user_id: &str,
    ) -> BoxFuture<'static, RemoteResult<Vec<RemoteNotificationRecord>>>;
    fn mark_read(&self, id: &str) -> BoxFuture<'static, RemoteResult<()>>;
    fn mark_all_read(&self, user_id: &str) -> BoxFuture<'static, RemoteResult<()>>;
    fn mark_read_by_key(&self, user_id: &str, key: &str) -> BoxFuture<'static, RemoteResult<()>>;
    fn mark_read_for_group(
        &self,
        user_id: &str,
        group_id: &str,
    ) -> BoxFuture<'static, RemoteResult<()>>;
}

#[derive(Default)]
struct RemoteState {
    entries: Arc<Vec<Notification>>,
    /// Bumped on every cache replacement, so a slow re-query can tell it
    /// has been overtaken by a newer snapshot
    epoch: u64,
    pending: PendingLedger,
}

impl RemoteState {
    fn replace(&mut self, records: Vec<RemoteNotificationRecord>) {
        self.entries = Arc::new(to_canonical(records));
        self.epoch += 1;
    }
}

pub struct RemoteSyncedSource {
    api: Arc<dyn NotificationApi>,
    user_id: String,
    state: Arc<Mutex<RemoteState>>,
    revision: Arc<watch::Sender<u64>>,
}

/// Map remote records to the canonical shape, filling in dedupe keys the
/// remote store did not send.
fn to_canonical(records: Vec<RemoteNotificationRecord>) -> Vec<Notification> {
    records
        .into_iter()
        .map(Notification::from)
        .map(|mut n| {
            if n.dedupe_key.is_empty() {
                let instant = format!("{}-{}", n.created_at, n.id);
                n.dedupe_key = resolve_dedupe_key(&n.kind, &n.payload, &instant);
            }
            n
        })
        .collect()
}

impl RemoteSyncedSource {
    pub fn new(api: Arc<dyn NotificationApi>, user_id: impl Into<String>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            api,
            user_id: user_id.into(),
            state: Arc::new(Mutex::new(RemoteState::default())),
            revision: Arc::new(revision),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Re-query the remote list and replace the cached copy.
    pub async fn refresh(&self) -> Result<(), RemoteError> {
        let records = self.api.list(&self.user_id).await?;
        self.apply_remote_snapshot(records);
        Ok(())
    }

    /// Replace the cached copy with a pushed query result.
    /// Pending markers are untouched and keep applying on top of it.
    pub fn apply_remote_snapshot(&self, records: Vec<RemoteNotificationRecord>) {
        self.state.lock().replace(records);
        self.revision.send_modify(|r| *r += 1);
    }

    /// Number of reads still waiting on the remote store
    pub fn in_flight(&self) -> usize {
        self.state.lock().pending.len()
    }

    fn remote_write(&self, target: &ReadTarget) -> BoxFuture<'static, RemoteResult<()>> {
        match target {
            ReadTarget::One(id) => self.api.mark_read(id),
            ReadTarget::All => self.api.mark_all_read(&self.user_id),
            ReadTarget::DedupeKey(key) => self.api.mark_read_by_key(&self.user_id, key),
            ReadTarget::Group(group_id) => self.api.mark_read_for_group(&self.user_id, group_id),
        }
    }
}

impl NotificationSource for RemoteSyncedSource {
    fn snapshot(&self) -> SourceSnapshot {
        let state = self.state.lock();
        SourceSnapshot {
            entries: state.entries.clone(),
            pending: state.pending.targets(),
            revision: *self.revision.borrow(),
        }
    }

    fn submit_read(&self, target: ReadTarget) -> ReadTicket {
        let Some(token) = self.state.lock().pending.begin(target.clone()) else {
            tracing::debug!("read: {:?} already in flight", target);
            return ReadTicket::settled(ReadOutcome::Duplicate);
        };
        self.revision.send_modify(|r| *r += 1);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("read: no async runtime available, dropping {:?}", target);
            self.state.lock().pending.settle(token);
            self.revision.send_modify(|r| *r += 1);
            return ReadTicket::settled(ReadOutcome::Abandoned);
        };

        let (ticket, outcome_tx) = ReadTicket::pending(token);
        let write = self.remote_write(&target);
        let api = self.api.clone();
        let user_id = self.user_id.clone();
        let state = self.state.clone();
        let revision = self.revision.clone();

        runtime.spawn(async move {
            let outcome = match write.await {
                Ok(()) => {
                    let epoch = state.lock().epoch;
                    match api.list(&user_id).await {
                        Ok(records) => {
                            let mut current = state.lock();
                            if current.epoch == epoch {
                                current.replace(records);
                            } else {
                                tracing::debug!("read: newer snapshot arrived, dropping re-query");
                            }
                        }
                        Err(e) => {
                            tracing::debug!("read: refresh after {:?} failed: {}", target, e)
                        }
                    }
                    ReadOutcome::Confirmed
                }
                Err(e) => {
                    tracing::debug!("read: {:?} rejected, rolling back: {}", target, e);
                    ReadOutcome::RolledBack
                }
            };

            state.lock().pending.settle(token);
            revision.send_modify(|r| *r += 1);
            // Fails only if the consumer is gone, which is fine
            let _ = outcome_tx.send(outcome);
        });

        ticket
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
