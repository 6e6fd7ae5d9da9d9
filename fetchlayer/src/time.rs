//! Conversions between wall-clock and monotonic time.
//!
//! Cache metadata carries wall-clock stamps so expiry survives a restart,
//! while LRU ranking uses monotonic `Instant`s. These helpers bridge the
//! two when rehydrating persisted entries.

use chrono::{DateTime, Utc};
use std::time::{Instant, SystemTime};

/// Convert a `SystemTime` (e.g. a file mtime) to an `Instant`.
///
/// `Instant` has no fixed epoch, so the conversion measures how far in the
/// past the `SystemTime` lies and rewinds the current `Instant` by that
/// much. Returns `None` when the result would precede process start.
/// Future times clamp to now.
pub fn system_time_to_instant(system_time: SystemTime) -> Option<Instant> {
    let now_system = SystemTime::now();
    let now_instant = Instant::now();

    match now_system.duration_since(system_time) {
        Ok(elapsed) => now_instant.checked_sub(elapsed),
        Err(_) => Some(now_instant),
    }
}

/// Convert a wall-clock stamp to an `Instant`, clamping like
/// [`system_time_to_instant`].
pub fn wall_clock_to_instant(moment: DateTime<Utc>) -> Option<Instant> {
    let system_time = SystemTime::UNIX_EPOCH
        + std::time::Duration::from_millis(moment.timestamp_millis().max(0) as u64);
    system_time_to_instant(system_time)
}
