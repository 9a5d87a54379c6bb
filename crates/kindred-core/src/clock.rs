//! Time source for the engine.
//!
//! Timestamps are Unix seconds. The rate limiter needs calendar-day bounds
//! in the user's local time, so the clock also owns the timezone.

use chrono::{Local, TimeZone, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

pub trait Clock: Send + Sync {
    /// Current Unix timestamp in seconds
    fn now(&self) -> u64;

    /// `[start, end)` of the calendar day containing `ts`
    fn day_bounds(&self, ts: u64) -> (u64, u64);
}

/// Wall clock using the system's local timezone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    fn day_bounds(&self, ts: u64) -> (u64, u64) {
        day_bounds_in(&Local, ts)
    }
}

/// Settable clock with UTC day boundaries. Used by tests and the CLI's
/// `--at` override.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn day_bounds(&self, ts: u64) -> (u64, u64) {
        day_bounds_in(&Utc, ts)
    }
}

/// Midnight-to-midnight bounds of the day containing `ts` in `tz`.
///
/// Falls back to a fixed 24h window starting at `ts` if the local midnight
/// cannot be resolved (never expected outside exotic DST rules).
pub fn day_bounds_in<Tz: TimeZone>(tz: &Tz, ts: u64) -> (u64, u64) {
    const DAY: u64 = 24 * 60 * 60;

    let Some(dt) = tz.timestamp_opt(ts as i64, 0).single() else {
        return (ts, ts + DAY);
    };
    let date = dt.date_naive();
    let midnight = |d: chrono::NaiveDate| {
        d.and_hms_opt(0, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest())
            .map(|local| local.timestamp().max(0) as u64)
    };

    let start = midnight(date);
    let end = date.succ_opt().and_then(midnight);
    match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, start + DAY),
        _ => (ts, ts + DAY),
    }
}
