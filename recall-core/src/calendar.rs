//! Calendar-day arithmetic on epoch-millisecond timestamps.
//!
//! Adding "N days" here means the same local wall-clock time N calendar days
//! later in the given zone, so a review scheduled at 09:00 stays at 09:00
//! across a daylight-saving change instead of drifting to 08:00 or 10:00.

use crate::{EpochMillis, MS_PER_DAY};
use chrono::{DateTime, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use tracing::warn;

/// Adds `days` calendar days to `timestamp`, keeping the local time-of-day in `tz`.
///
/// Local times that fall into a fall-back overlap resolve to the earlier
/// instant. Local times that fall into a spring-forward gap are read with the
/// offset in effect before the gap, which lands the same distance past the
/// transition. Timestamps chrono cannot represent fall back to fixed 24h days.
pub fn add_calendar_days<Tz: TimeZone>(timestamp: EpochMillis, days: i64, tz: &Tz) -> EpochMillis {
    match shift_local(timestamp, days, tz) {
        Some(ms) => ms,
        None => {
            warn!(timestamp, days, "calendar shift out of range; using fixed-length days");
            timestamp.saturating_add(days.saturating_mul(MS_PER_DAY))
        }
    }
}

fn shift_local<Tz: TimeZone>(timestamp: EpochMillis, days: i64, tz: &Tz) -> Option<EpochMillis> {
    let local = to_local(timestamp, tz)?.naive_local();
    let shifted = if days >= 0 {
        local.checked_add_days(Days::new(days.unsigned_abs()))?
    } else {
        local.checked_sub_days(Days::new(days.unsigned_abs()))?
    };

    match tz.from_local_datetime(&shifted) {
        LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp_millis()),
        LocalResult::None => resolve_gap(shifted, tz),
    }
}

fn resolve_gap<Tz: TimeZone>(shifted: NaiveDateTime, tz: &Tz) -> Option<EpochMillis> {
    let before = shifted.checked_sub_days(Days::new(1))?;
    let offset = match tz.from_local_datetime(&before).earliest() {
        Some(dt) => dt.offset().fix(),
        None => tz.offset_from_utc_datetime(&shifted).fix(),
    };
    let utc = shifted.checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))?;
    Some(utc.and_utc().timestamp_millis())
}

pub fn to_local<Tz: TimeZone>(timestamp: EpochMillis, tz: &Tz) -> Option<DateTime<Tz>> {
    DateTime::<Utc>::from_timestamp_millis(timestamp).map(|dt| dt.with_timezone(tz))
}

/// Local calendar date of `timestamp` in `tz`.
pub fn local_date<Tz: TimeZone>(timestamp: EpochMillis, tz: &Tz) -> Option<NaiveDate> {
    to_local(timestamp, tz).map(|dt| dt.date_naive())
}
