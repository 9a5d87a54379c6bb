pub mod center;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod feed;
pub mod models;
pub mod source;
pub mod store;
pub mod tracing_setup;

// Re-export the types most callers need at crate root
pub use center::NotificationCenter;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use error::{RemoteError, StorageError};
pub use feed::{FeedView, NotificationFeed};
pub use models::{
    AppPhase, Notification, NotificationInput, NotificationType, Payload, RemoteNotificationRecord,
};
pub use source::{
    LocalBackedSource, NotificationApi, NotificationSource, RemoteResult, RemoteSyncedSource,
    SourceSnapshot,
};
pub use store::{CleanupContext, IntakeOutcome, PhaseGate, ReadOutcome, ReadTarget, ReadTicket};
