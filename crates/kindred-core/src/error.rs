/// Failures reading or writing the persisted notification list.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to read notifications: {0}")]
    Read(String),

    #[error("Failed to parse notifications: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to save notifications: {0}")]
    Write(String),
}

/// Failures reported by the remote notification store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected by remote store: {0}")]
    Rejected(String),

    #[error("Not authorized")]
    Unauthorized,
}
