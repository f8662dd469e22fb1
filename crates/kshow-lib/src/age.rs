//! Coarse age labels
//!
//! Turns an elapsed duration into the compact `m`/`h`/`d`/`y` form shown in
//! the AGE columns. This is a classification, not a duration formatter.

use chrono::{DateTime, Duration, Utc};

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const HOURS_PER_DAY: i64 = 24;
const HOURS_PER_YEAR: i64 = 8760;

/// Bucket an elapsed duration into a coarse label
///
/// Negative durations (clock skew) count as zero. The duration is rounded to
/// the nearest second before bucketing.
pub fn bucket(elapsed: Duration) -> String {
    let millis = elapsed.num_milliseconds().max(0);
    let secs = (millis + 500) / 1000;

    // Integer division equals floor(whole units + finer remainder / 60)
    let hours = secs / SECS_PER_HOUR;
    if hours >= HOURS_PER_YEAR {
        format!("{}y", hours / HOURS_PER_YEAR)
    } else if hours >= HOURS_PER_DAY {
        format!("{}d", hours / HOURS_PER_DAY)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        format!("{}m", secs / SECS_PER_MINUTE)
    }
}

/// Age label of an object created at `created` as seen at `now`
pub fn age_label(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    bucket(now - created)
}
