//! In-process stand-in for the remote store, used by tests.

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::RemoteError;
use crate::models::{Payload, RemoteNotificationRecord};

use super::{NotificationApi, RemoteResult};

struct Inner {
    records: Mutex<Vec<RemoteNotificationRecord>>,
    reject: AtomicBool,
    hold: AtomicBool,
    gate: Semaphore,
    writes: AtomicUsize,
    hold_lists: AtomicBool,
    list_gate: Semaphore,
    lists: AtomicUsize,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            reject: AtomicBool::new(false),
            hold: AtomicBool::new(false),
            gate: Semaphore::new(0),
            writes: AtomicUsize::new(0),
            hold_lists: AtomicBool::new(false),
            list_gate: Semaphore::new(0),
            lists: AtomicUsize::new(0),
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockApi {
    inner: Arc<Inner>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        id: &str,
        kind: &str,
        data: &[(&str, &str)],
        created_ms: u64,
    ) -> RemoteNotificationRecord {
        RemoteNotificationRecord {
            id: id.to_string(),
            kind: kind.to_string(),
            title: format!("{} title", kind),
            body: format!("{} body", kind),
            data: data
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Payload>(),
            created_at: created_ms,
            expires_at: None,
            read_at: None,
            is_read: false,
            dedupe_key: None,
        }
    }

    pub fn push(&self, record: RemoteNotificationRecord) {
        self.inner.records.lock().push(record);
    }

    pub fn records(&self) -> Vec<RemoteNotificationRecord> {
        self.inner.records.lock().clone()
    }

    /// Make every subsequent write fail
    pub fn reject_writes(&self, reject: bool) {
        self.inner.reject.store(reject, Ordering::SeqCst);
    }

    /// Park writes until [`release`](Self::release) is called
    pub fn hold_writes(&self) {
        self.inner.hold.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.inner.hold.store(false, Ordering::SeqCst);
        self.inner.gate.add_permits(64);
    }

    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Park list queries until [`release_lists`](Self::release_lists)
    pub fn hold_lists(&self) {
        self.inner.hold_lists.store(true, Ordering::SeqCst);
    }

    pub fn release_lists(&self) {
        self.inner.hold_lists.store(false, Ordering::SeqCst);
        self.inner.list_gate.add_permits(64);
    }

    /// List queries started so far
    pub fn list_count(&self) -> usize {
        self.inner.lists.load(Ordering::SeqCst)
    }

    fn write(
        &self,
        matches: impl Fn(&RemoteNotificationRecord) -> bool + Send + 'static,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        let inner = self.inner.clone();
        async move {
            inner.writes.fetch_add(1, Ordering::SeqCst);
            if inner.hold.load(Ordering::SeqCst) {
                if let Ok(permit) = inner.gate.acquire().await {
                    permit.forget();
                }
            }
            if inner.reject.load(Ordering::SeqCst) {
                return Err(RemoteError::Rejected("mock rejection".to_string()));
            }
            for record in inner.records.lock().iter_mut().filter(|r| matches(r)) {
                record.is_read = true;
                record.read_at = Some(record.created_at);
            }
            Ok(())
        }
        .boxed()
    }
}

impl NotificationApi for MockApi {
    fn list(
        &self,
        _user_id: &str,
    ) -> BoxFuture<'static, RemoteResult<Vec<RemoteNotificationRecord>>> {
        let inner = self.inner.clone();
        async move {
            inner.lists.fetch_add(1, Ordering::SeqCst);
            if inner.hold_lists.load(Ordering::SeqCst) {
                if let Ok(permit) = inner.list_gate.acquire().await {
                    permit.forget();
                }
            }
            let records = inner.records.lock().clone();
            Ok(records)
        }
        .boxed()
    }

    fn mark_read(&self, id: &str) -> BoxFuture<'static, RemoteResult<()>> {
        let id = id.to_string();
        self.write(move |r| r.id == id)
    }

    fn mark_all_read(&self, _user_id: &str) -> BoxFuture<'static, RemoteResult<()>> {
        self.write(|_| true)
    }

    fn mark_read_by_key(&self, _user_id: &str, key: &str) -> BoxFuture<'static, RemoteResult<()>> {
        let key = key.to_string();
        self.write(move |r| r.dedupe_key.as_deref() == Some(key.as_str()))
    }

    fn mark_read_for_group(
        &self,
        _user_id: &str,
        group_id: &str,
    ) -> BoxFuture<'static, RemoteResult<()>> {
        let group_id = group_id.to_string();
        self.write(move |r| r.data.get("conversationId") == Some(&group_id))
    }
}
