use serde::{Deserialize, Serialize};

use super::timeline::TimelineBounds;

/// Persistent per-project display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Weekday indices (0 = Sunday). Reserved for a working calendar; date
    /// math does not consult it.
    pub working_days: Vec<u8>,
    pub show_dates_in_bars: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            working_days: vec![1, 2, 3, 4, 5],
            show_dates_in_bars: true,
        }
    }
}

/// Settings with the timeline bounds computed for one render pass attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub settings: ProjectSettings,
    pub timeline: TimelineBounds,
}

impl RenderSettings {
    pub fn new(settings: &ProjectSettings, timeline: TimelineBounds) -> Self {
        Self {
            settings: settings.clone(),
            timeline,
        }
    }
}
