use chrono::{DateTime, Utc};
use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GanttError, Result};

/// Whether a task groups other tasks or is a schedulable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Grouping task; its dates are derived from its leaf children.
    #[serde(rename = "phase")]
    Phase,
    /// Schedulable task with directly edited dates.
    #[serde(rename = "task")]
    Leaf,
}

/// Expand/collapse state of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandState {
    Collapsed,
    Expanded,
}

impl ExpandState {
    pub fn toggled(self) -> Self {
        match self {
            ExpandState::Collapsed => ExpandState::Expanded,
            ExpandState::Expanded => ExpandState::Collapsed,
        }
    }
}

/// A single phase or task in the Gantt chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub kind: TaskKind,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Display color (stored as a hex string).
    #[serde(with = "color_serde")]
    pub color: Color32,
    /// Weak reference to the parent task; `None` for roots.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Depth in the hierarchy, kept equal to `parent.level + 1`.
    #[serde(default)]
    pub level: u32,
    #[serde(default = "default_expanded")]
    pub is_expanded: bool,
    /// Reserved for cross-task ordering constraints. Not read by the engine.
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
}

fn default_expanded() -> bool {
    true
}

pub const DEFAULT_PHASE_COLOR: Color32 = Color32::from_rgb(0x9b, 0x59, 0xb6);
pub const DEFAULT_TASK_COLOR: Color32 = Color32::from_rgb(0xd1, 0xc4, 0xe9);

impl Task {
    /// Create a new root phase, expanded, without dates.
    pub fn new_phase(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: TaskKind::Phase,
            start_date: None,
            end_date: None,
            color: DEFAULT_PHASE_COLOR,
            parent_id: None,
            level: 0,
            is_expanded: true,
            dependencies: Vec::new(),
        }
    }

    /// Create a new root leaf task spanning `start..end`.
    pub fn new_leaf(name: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: TaskKind::Leaf,
            start_date: Some(start),
            end_date: Some(end),
            color: DEFAULT_TASK_COLOR,
            parent_id: None,
            level: 0,
            is_expanded: true,
            dependencies: Vec::new(),
        }
    }

    /// Attach this task under `parent`, deriving its level.
    pub fn with_parent(mut self, parent: &Task) -> Self {
        self.parent_id = Some(parent.id);
        self.level = parent.level + 1;
        self
    }

    pub fn with_color(mut self, color: Color32) -> Self {
        self.color = color;
        self
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.is_expanded = expanded;
        self
    }

    pub fn is_phase(&self) -> bool {
        self.kind == TaskKind::Phase
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == TaskKind::Leaf
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// `true` for a phase that is currently expanded. Leaves are never
    /// expanded phases, whatever their flag says.
    pub fn is_expanded_phase(&self) -> bool {
        self.is_phase() && self.is_expanded
    }

    pub fn expand_state(&self) -> ExpandState {
        if self.is_expanded {
            ExpandState::Expanded
        } else {
            ExpandState::Collapsed
        }
    }

    /// Flip the expand state and return the new one.
    pub fn toggle_expanded(&mut self) -> ExpandState {
        let next = self.expand_state().toggled();
        self.is_expanded = next == ExpandState::Expanded;
        next
    }

    /// Both dates, when the task has them.
    pub fn dates(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start_date?, self.end_date?))
    }
}

/// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Result<Color32> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || GanttError::InvalidColor(s.to_string());
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    if hex.len() == 8 {
        Ok(Color32::from_rgba_unmultiplied(r, g, b, channel(6)?))
    } else {
        Ok(Color32::from_rgb(r, g, b))
    }
}

/// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
pub fn to_hex_color(color: Color32) -> String {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    if a == 255 {
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
    }
}

/// Serde helper for `Color32` as a hex string.
mod color_serde {
    use egui::Color32;
    use serde::{self, de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_hex_color(*color))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Color32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_hex_color(&s).map_err(de::Error::custom)
    }
}
