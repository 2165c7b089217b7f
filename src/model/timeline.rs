use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker spacing granularity of the timeline axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    Days,
    Weeks,
    Months,
}

impl TimeScale {
    /// Cycling order used by the scale toggle.
    pub const ALL: [TimeScale; 3] = [TimeScale::Days, TimeScale::Weeks, TimeScale::Months];

    pub fn next(self) -> TimeScale {
        match self {
            TimeScale::Days => TimeScale::Weeks,
            TimeScale::Weeks => TimeScale::Months,
            TimeScale::Months => TimeScale::Days,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeScale::Days => "Days",
            TimeScale::Weeks => "Weeks",
            TimeScale::Months => "Months",
        }
    }
}

/// Padded `{start, end}` instants that every bar is scaled against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineBounds {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimelineBounds {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Signed span in milliseconds.
    pub fn span_ms(&self) -> i64 {
        (self.end - self.start).num_milliseconds()
    }

    /// Span used as a divisor: a zero-width or inverted range counts as 1 ms.
    pub fn divisor_ms(&self) -> f64 {
        self.span_ms().max(1) as f64
    }
}

/// A labelled point on the timeline axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineMarker {
    pub date: DateTime<Utc>,
    /// Single-line label, e.g. `Jan 7` or `Jan 2024`.
    pub label: String,
    /// Upper line of a two-line header (month).
    pub label_line1: String,
    /// Lower line of a two-line header (day or year).
    pub label_line2: String,
}

/// Scale choice with an optional manual pin that suppresses auto-detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleSelector {
    pinned: Option<TimeScale>,
}

impl ScaleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pinned(scale: Option<TimeScale>) -> Self {
        Self { pinned: scale }
    }

    pub fn pinned_scale(&self) -> Option<TimeScale> {
        self.pinned
    }

    /// The pinned scale, or the one detected from `bounds`.
    pub fn effective(&self, bounds: &TimelineBounds) -> TimeScale {
        self.pinned
            .unwrap_or_else(|| crate::engine::scale::detect_scale(bounds.start, bounds.end))
    }

    pub fn pin(&mut self, scale: TimeScale) {
        self.pinned = Some(scale);
    }

    /// Return to auto-detection.
    pub fn clear(&mut self) {
        self.pinned = None;
    }

    /// Pin the scale following the current effective one.
    pub fn cycle(&mut self, bounds: &TimelineBounds) -> TimeScale {
        let next = self.effective(bounds).next();
        self.pinned = Some(next);
        next
    }
}
