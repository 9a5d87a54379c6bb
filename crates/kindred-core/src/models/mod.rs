pub mod notification;
pub mod phase;
pub mod remote;

pub use notification::{Notification, NotificationInput, NotificationType, Payload};
pub use phase::AppPhase;
pub use remote::RemoteNotificationRecord;
