/// Calendar days at a fixed UTC offset
///
/// Due dates are plain calendar days, so every "is it overdue" question
/// needs a notion of *today*. Offsets are minutes east of UTC
/// (`330` for UTC+05:30, `-300` for UTC-05:00).

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Smallest accepted offset (UTC-12:00)
pub const MIN_OFFSET_MINUTES: i32 = -12 * 60;

/// Largest accepted offset (UTC+14:00)
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Builds an offset from minutes east of UTC
///
/// Returns None outside UTC-12:00..=UTC+14:00.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(minutes * 60)
}

/// Calendar day of `instant` at `offset`
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// Today's calendar day at `offset`
pub fn today(offset: FixedOffset) -> NaiveDate {
    local_date(Utc::now(), offset)
}
