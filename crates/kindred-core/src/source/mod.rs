//! Backing sources for the notification feed.
//!
//! A feed reads from exactly one source, chosen at construction: a locally
//! owned store, or a cache of the remote store's query results.

pub mod local;
pub mod remote;

use std::sync::Arc;
use tokio::sync::watch;

use crate::models::Notification;
use crate::store::{ReadTarget, ReadTicket};

pub use local::LocalBackedSource;
pub use remote::{NotificationApi, RemoteResult, RemoteSyncedSource};

/// Point-in-time view of a source.
#[derive(Debug, Clone, Default)]
pub struct SourceSnapshot {
    pub entries: Arc<Vec<Notification>>,
    /// Reads issued but not yet settled; empty for local sources
    pub pending: Vec<ReadTarget>,
    pub revision: u64,
}

impl SourceSnapshot {
    pub fn is_pending_read(&self, entry: &Notification) -> bool {
        self.pending.iter().any(|target| target.covers(entry))
    }
}

pub trait NotificationSource: Send + Sync {
    fn snapshot(&self) -> SourceSnapshot;

    /// Issue a read for `target`
    fn submit_read(&self, target: ReadTarget) -> ReadTicket;

    /// Revision counter, bumped whenever a view over this source may change
    fn subscribe(&self) -> watch::Receiver<u64>;

    fn mark_read(&self, id: &str) -> ReadTicket {
        self.submit_read(ReadTarget::One(id.to_string()))
    }

    fn mark_all_read(&self) -> ReadTicket {
        self.submit_read(ReadTarget::All)
    }

    fn mark_read_by_dedupe_key(&self, key: &str) -> ReadTicket {
        self.submit_read(ReadTarget::DedupeKey(key.to_string()))
    }

    fn mark_read_for_group(&self, group_id: &str) -> ReadTicket {
        self.submit_read(ReadTarget::Group(group_id.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod mock;
