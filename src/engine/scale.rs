//! Time-scale detection and timeline marker generation.

use chrono::{DateTime, Utc};

use super::date_math::{add_days, add_months, ceil_days, duration_ms};
use crate::model::{TimeScale, TimelineBounds, TimelineMarker};

/// Spans up to this many days use the day scale.
pub const DAYS_SCALE_MAX_DAYS: i64 = 60;
/// Spans up to this many days use the week scale.
pub const WEEKS_SCALE_MAX_DAYS: i64 = 365;

/// Pick the marker granularity for a range, ignoring its direction.
pub fn detect_scale(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeScale {
    let days = ceil_days(duration_ms(start, end));
    if days <= DAYS_SCALE_MAX_DAYS {
        TimeScale::Days
    } else if days <= WEEKS_SCALE_MAX_DAYS {
        TimeScale::Weeks
    } else {
        TimeScale::Months
    }
}

/// The `k`-th marker date from `start`, or `None` on overflow.
fn step(start: DateTime<Utc>, scale: TimeScale, k: u32) -> Option<DateTime<Utc>> {
    match scale {
        TimeScale::Days => add_days(start, 7 * k as i64),
        TimeScale::Weeks => add_days(start, 14 * k as i64),
        TimeScale::Months => add_months(start, k),
    }
}

/// Evenly spaced markers from `start` up to and including `end`.
///
/// Each marker is computed from `start` rather than from the previous marker,
/// so month steps do not drift after a short month. An inverted range yields
/// no markers.
pub fn generate_markers(start: DateTime<Utc>, end: DateTime<Utc>, scale: TimeScale) -> Vec<TimelineMarker> {
    let mut markers = Vec::new();
    if start > end {
        return markers;
    }

    let mut k = 0u32;
    while let Some(date) = step(start, scale, k) {
        if date > end {
            break;
        }
        markers.push(marker(date, scale));
        k = match k.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    markers
}

fn marker(date: DateTime<Utc>, scale: TimeScale) -> TimelineMarker {
    let month = date.format("%b").to_string();
    let (label, line2) = match scale {
        TimeScale::Days | TimeScale::Weeks => (date.format("%b %-d").to_string(), date.format("%-d").to_string()),
        TimeScale::Months => (date.format("%b %Y").to_string(), date.format("%Y").to_string()),
    };
    TimelineMarker {
        date,
        label,
        label_line1: month,
        label_line2: line2,
    }
}

/// Horizontal position of `date` as a percentage of the timeline, clamped to
/// `0..=100`.
pub fn marker_position(date: DateTime<Utc>, bounds: &TimelineBounds) -> f32 {
    let offset = duration_ms(bounds.start, date) as f64;
    (offset / bounds.divisor_ms() * 100.0).clamp(0.0, 100.0) as f32
}

/// How crowded the axis is, used to pick the label text size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSpacing {
    Dense,
    Tight,
    Normal,
    Wide,
}

impl MarkerSpacing {
    /// Classify by the average percentage between consecutive markers.
    pub fn for_count(count: usize) -> MarkerSpacing {
        if count < 2 {
            return MarkerSpacing::Tight;
        }
        let avg = 100.0 / (count - 1) as f32;
        if avg < 8.0 {
            MarkerSpacing::Dense
        } else if avg < 15.0 {
            MarkerSpacing::Tight
        } else if avg < 25.0 {
            MarkerSpacing::Normal
        } else {
            MarkerSpacing::Wide
        }
    }

    /// Suggested label font size in points.
    pub fn font_size(self) -> f32 {
        match self {
            MarkerSpacing::Dense => 10.0,
            MarkerSpacing::Tight => 12.0,
            MarkerSpacing::Normal => 14.0,
            MarkerSpacing::Wide => 16.0,
        }
    }
}
