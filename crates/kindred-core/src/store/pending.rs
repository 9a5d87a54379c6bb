//! In-flight read requests against a remote store.
//!
//! While a remote mark-read is outstanding, every view must treat the
//! affected entries as read even though the remote-sourced copy still says
//! unread. The ledger is keyed by target, so a repeated request for the same
//! target (a double tap) adds nothing.

use std::collections::HashMap;
use tokio::sync::oneshot;

use crate::models::Notification;

/// What a mark-read request covers.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReadTarget {
    One(String),
    All,
    DedupeKey(String),
    /// Every notification of one conversation
    Group(String),
}

impl ReadTarget {
    pub fn covers(&self, entry: &Notification) -> bool {
        match self {
            ReadTarget::One(id) => entry.id == *id,
            ReadTarget::All => true,
            ReadTarget::DedupeKey(key) => entry.dedupe_key == *key,
            ReadTarget::Group(group_id) => entry.group_id() == Some(group_id.as_str()),
        }
    }
}

/// Identifies one in-flight request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

/// How a mark-read request ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Applied synchronously to a locally owned store
    Applied,
    /// Remote store acknowledged the write
    Confirmed,
    /// Remote store rejected the write; entries are unread again
    RolledBack,
    /// Same target was already in flight; nothing new was issued
    Duplicate,
    /// The request was dropped before reporting (runtime shut down)
    Abandoned,
}

/// A consumer's interest in a mark-read request.
///
/// Dropping the ticket does not cancel the request. It only means nobody
/// hears about the outcome; the source still settles its own state.
#[derive(Debug)]
pub struct ReadTicket {
    token: Option<RequestToken>,
    rx: oneshot::Receiver<ReadOutcome>,
}

impl ReadTicket {
    /// A ticket whose outcome is already known
    pub fn settled(outcome: ReadOutcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self { token: None, rx }
    }

    pub(crate) fn pending(token: RequestToken) -> (Self, oneshot::Sender<ReadOutcome>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                token: Some(token),
                rx,
            },
            tx,
        )
    }

    pub fn token(&self) -> Option<RequestToken> {
        self.token
    }

    /// Wait for the request to settle
    pub async fn outcome(self) -> ReadOutcome {
        self.rx.await.unwrap_or(ReadOutcome::Abandoned)
    }
}

/// Set of targets with an outstanding remote write.
#[derive(Debug, Default)]
pub struct PendingLedger {
    by_target: HashMap<ReadTarget, RequestToken>,
    next_token: u64,
}

impl PendingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request. Returns `None` if `target` is already pending.
    pub fn begin(&mut self, target: ReadTarget) -> Option<RequestToken> {
        if self.by_target.contains_key(&target) {
            return None;
        }
        self.next_token += 1;
        let token = RequestToken(self.next_token);
        self.by_target.insert(target, token);
        Some(token)
    }

    /// Remove a finished request, returning what it covered
    pub fn settle(&mut self, token: RequestToken) -> Option<ReadTarget> {
        let target = self
            .by_target
            .iter()
            .find(|(_, t)| **t == token)
            .map(|(target, _)| target.clone())?;
        self.by_target.remove(&target);
        Some(target)
    }

    pub fn covers(&self, entry: &Notification) -> bool {
        self.by_target.keys().any(|target| target.covers(entry))
    }

    pub fn targets(&self) -> Vec<ReadTarget> {
        self.by_target.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
