//! Wire shape of notifications returned by the remote store.
//!
//! The remote store timestamps in milliseconds and may omit `readAt` while
//! still reporting `isRead`; both are folded into the canonical
//! [`Notification`] here.

use serde::{Deserialize, Serialize};

use super::notification::{Notification, NotificationType, Payload};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteNotificationRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Payload,
    /// Milliseconds since the epoch
    pub created_at: u64,
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub read_at: Option<u64>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub dedupe_key: Option<String>,
}

impl From<RemoteNotificationRecord> for Notification {
    fn from(record: RemoteNotificationRecord) -> Self {
        let created_at = record.created_at / 1000;
        let read_at = match (record.read_at, record.is_read) {
            (Some(ms), _) => Some(ms / 1000),
            (None, true) => Some(created_at),
            (None, false) => None,
        };
        Self {
            id: record.id,
            kind: NotificationType::from(record.kind),
            title: record.title,
            body: record.body,
            payload: record.data,
            created_at,
            expires_at: record.expires_at.map(|ms| ms / 1000),
            read_at,
            dedupe_key: record.dedupe_key.unwrap_or_default(),
        }
    }
}
