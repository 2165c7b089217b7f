//! The timeline and layout engine.
//!
//! Every call recomputes from the task snapshot it is given; nothing is
//! cached between passes.

pub mod date_math;
pub mod layout;
pub mod phase;
pub mod scale;

use chrono::{DateTime, Utc};

use crate::model::{ProjectSettings, RenderSettings, ScaleSelector, Task, TimeScale, TimelineMarker};
use layout::ChartLayout;
use phase::Finding;
use scale::MarkerSpacing;

/// A timeline marker with its horizontal position.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedMarker {
    pub marker: TimelineMarker,
    /// Percent of the timeline width, `0..=100`.
    pub position: f32,
}

/// Output of one full render pass over a task snapshot.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    /// Input tasks with phase dates filled in, in input order.
    pub tasks: Vec<Task>,
    pub render_settings: RenderSettings,
    pub scale: TimeScale,
    pub markers: Vec<PositionedMarker>,
    pub spacing: MarkerSpacing,
    pub layout: ChartLayout,
    pub findings: Vec<Finding>,
}

impl ChartFrame {
    /// Resolve phases, bound the timeline, pick a scale, place markers and
    /// lay out rows.
    pub fn compute(
        tasks: &[Task],
        settings: &ProjectSettings,
        selector: &ScaleSelector,
        now: DateTime<Utc>,
    ) -> Self {
        let resolved = phase::resolve_all_tasks(tasks);
        let bounds = phase::project_timeline(tasks, now);
        let scale = selector.effective(&bounds);

        let markers: Vec<PositionedMarker> = scale::generate_markers(bounds.start, bounds.end, scale)
            .into_iter()
            .map(|marker| PositionedMarker {
                position: scale::marker_position(marker.date, &bounds),
                marker,
            })
            .collect();
        let spacing = MarkerSpacing::for_count(markers.len());

        let layout = ChartLayout::compute(&resolved, &bounds);
        let findings = phase::validate_structure(tasks);

        tracing::debug!(
            tasks = tasks.len(),
            rows = layout.rows.len(),
            markers = markers.len(),
            ?scale,
            findings = findings.len(),
            "computed chart frame"
        );

        Self {
            tasks: resolved,
            render_settings: RenderSettings::new(settings, bounds),
            scale,
            markers,
            spacing,
            layout,
            findings,
        }
    }

    pub fn task(&self, id: uuid::Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Findings attached to one task.
    pub fn findings_for(&self, id: uuid::Uuid) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.task_id() == id)
    }
}
