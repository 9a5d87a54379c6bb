pub mod aggregator;
pub mod dedupe;
pub mod expiry;
pub mod notification_store;
pub mod pending;
pub mod persistence;
pub mod phase;
pub mod rate_limit;

pub use dedupe::{is_aggregated_key, resolve_dedupe_key};
pub use expiry::{is_expired, is_expired_with_ttl};
pub use notification_store::{CleanupContext, IntakeOutcome, NotificationStore};
pub use pending::{PendingLedger, ReadOutcome, ReadTarget, ReadTicket, RequestToken};
pub use persistence::NotificationFile;
pub use phase::{is_phase_restricted, PhaseGate};
pub use rate_limit::is_rate_limited;
