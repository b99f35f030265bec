//! Weekly Window Resolution
//!
//! Weekly leaderboards run Monday 00:00:00.000 to Sunday 23:59:59.999 in a
//! fixed UTC+9 offset. Boundaries are returned as UTC instants so they can be
//! compared directly against `created_at`.
//!
//! Never reads the clock: callers pass `now`.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Offset of the weekly anchor from UTC, in seconds (UTC+9).
pub const WEEK_ANCHOR_OFFSET_SECS: i64 = 9 * 60 * 60;

/// Closed time interval `[start, end]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Window {
    /// First instant inside the window.
    pub start: DateTime<Utc>,
    /// Last instant inside the window.
    pub end: DateTime<Utc>,
}

impl Window {
    /// Create a window from explicit bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Check whether an instant falls inside the window (both ends inclusive).
    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// The calendar week containing `now`, in a local time `utc_offset` ahead of UTC.
    pub fn week_containing(now: DateTime<Utc>, utc_offset: Duration) -> Self {
        let local = now.naive_utc() + utc_offset;
        let days_since_monday = local.weekday().num_days_from_monday() as i64;
        let monday = local.date() - Duration::days(days_since_monday);

        let local_start = monday.and_time(NaiveTime::MIN);
        let local_end = local_start + Duration::days(7) - Duration::milliseconds(1);

        Self {
            start: Utc.from_utc_datetime(&(local_start - utc_offset)),
            end: Utc.from_utc_datetime(&(local_end - utc_offset)),
        }
    }
}

/// The current weekly leaderboard window for `now`.
pub fn current_week(now: DateTime<Utc>) -> Window {
    Window::week_containing(now, Duration::seconds(WEEK_ANCHOR_OFFSET_SECS))
}

// =============================================================================
// TESTS
// =============================================================================
