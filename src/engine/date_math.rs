//! Instant arithmetic shared by the timeline engine.
//!
//! All spans are whole milliseconds; weekends count like any other day.

use chrono::{DateTime, Duration, Months, Utc};

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Signed duration `end - start` in milliseconds.
pub fn duration_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_milliseconds()
}

pub fn min_instant<I>(dates: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    dates.into_iter().min()
}

pub fn max_instant<I>(dates: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    dates.into_iter().max()
}

/// `span_ms * ratio`, truncated toward zero.
pub fn padding_ms(span_ms: i64, ratio: f64) -> i64 {
    (span_ms as f64 * ratio).trunc() as i64
}

/// Whole days covering `|ms|`, rounding any partial day up.
pub fn ceil_days(ms: i64) -> i64 {
    let abs = ms.unsigned_abs();
    let day = MS_PER_DAY as u64;
    abs.div_ceil(day) as i64
}

/// `date + ms`, saturating at the ends of the representable range.
pub fn add_ms(date: DateTime<Utc>, ms: i64) -> DateTime<Utc> {
    Duration::try_milliseconds(ms)
        .and_then(|d| date.checked_add_signed(d))
        .unwrap_or(if ms < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

pub fn add_days(date: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// Calendar-aware month addition; the day is clamped to the target month's
/// length. `None` on overflow.
pub fn add_months(date: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
}
