//! Reminder trigger arithmetic.
//!
//! All values here are local wall-clock times. The trigger for an all-day
//! event is its local midnight, moved back by the margin, then forward by the
//! configured time of day. Both shifts are plain durations, so margins longer
//! than a day (and times that cross midnight) spill into neighbouring days.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Minutes in one day; reminder margins are configured in whole days.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Compute the instant a reminder for `event_date` should fire.
///
/// Returns `None` only when the result falls outside the representable
/// calendar range.
pub fn trigger_instant(
    event_date: NaiveDate,
    margin_minutes: u32,
    time_of_day: NaiveTime,
) -> Option<NaiveDateTime> {
    let start = event_date.and_time(NaiveTime::MIN);
    let margin = Duration::minutes(i64::from(margin_minutes));
    let advance = Duration::hours(i64::from(time_of_day.hour()))
        + Duration::minutes(i64::from(time_of_day.minute()));

    start
        .checked_sub_signed(margin)?
        .checked_add_signed(advance)
}

/// Minutes from `trigger` until the start of the all-day event on `event_date`.
///
/// Positive when the reminder fires before the event starts.
pub fn lead_minutes(event_date: NaiveDate, trigger: NaiveDateTime) -> i64 {
    (event_date.and_time(NaiveTime::MIN) - trigger).num_minutes()
}

/// Lead time of the reminder to attach to an event, if any.
///
/// A trigger strictly before `now` would fire immediately, so no reminder is
/// attached in that case.
pub fn reminder_lead(
    event_date: NaiveDate,
    margin_minutes: u32,
    time_of_day: NaiveTime,
    now: NaiveDateTime,
) -> Option<i64> {
    let trigger = trigger_instant(event_date, margin_minutes, time_of_day)?;
    if trigger < now {
        return None;
    }
    Some(lead_minutes(event_date, trigger))
}

/// Convert minutes since midnight into a time of day.
pub fn time_of_day_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Inverse of [`time_of_day_from_minutes`].
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}
