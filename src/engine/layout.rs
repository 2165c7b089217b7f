//! Tree-to-rows layout: visible rows, row heights/offsets, color bands and
//! bar geometry.
//!
//! Expanded phases act as section headers: they are visible rows but do not
//! occupy a label row and never get a bar. Label rows and bar rows are the
//! same list, so every bar lines up with its label.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::date_math::duration_ms;
use crate::model::{Task, TaskKind, TimelineBounds};

pub const ROOT_COLLAPSED_HEIGHT: f32 = 50.0;
pub const ROOT_EXPANDED_PHASE_HEIGHT: f32 = 35.0;
pub const LEVEL_ONE_HEIGHT: f32 = 40.0;
pub const NESTED_HEIGHT: f32 = 35.0;
/// Shrinks a color band so it does not touch the next one.
pub const BAND_DEFLATE: f32 = 4.0;
/// Smallest bar width, in percent of the timeline.
pub const MIN_BAR_WIDTH_PERCENT: f32 = 1.0;

/// Depth-first rows under the current expand state, parents before children.
pub fn visible_rows(tasks: &[Task]) -> Vec<&Task> {
    fn push<'a>(task: &'a Task, tasks: &'a [Task], seen: &mut HashSet<Uuid>, out: &mut Vec<&'a Task>) {
        if !seen.insert(task.id) {
            return;
        }
        out.push(task);
        if task.is_expanded {
            for child in tasks.iter().filter(|t| t.parent_id == Some(task.id)) {
                push(child, tasks, seen, out);
            }
        }
    }

    let mut out = Vec::with_capacity(tasks.len());
    let mut seen = HashSet::with_capacity(tasks.len());
    for root in tasks.iter().filter(|t| t.is_root()) {
        push(root, tasks, &mut seen, &mut out);
    }
    out
}

/// Leaves always show a bar; phases only while collapsed.
pub fn shows_bar(task: &Task) -> bool {
    match task.kind {
        TaskKind::Leaf => true,
        TaskKind::Phase => !task.is_expanded,
    }
}

pub fn rows_with_bars<'a>(visible: &[&'a Task]) -> Vec<&'a Task> {
    visible.iter().copied().filter(|t| shows_bar(t)).collect()
}

/// Visible rows that occupy a row of their own in the label column.
pub fn label_rows<'a>(visible: &[&'a Task]) -> Vec<&'a Task> {
    visible.iter().copied().filter(|t| !t.is_expanded_phase()).collect()
}

/// Row height in pixels, a step function of depth and expand state.
pub fn row_height(task: &Task) -> f32 {
    match task.level {
        0 if task.is_expanded_phase() => ROOT_EXPANDED_PHASE_HEIGHT,
        0 => ROOT_COLLAPSED_HEIGHT,
        1 => LEVEL_ONE_HEIGHT,
        _ => NESTED_HEIGHT,
    }
}

/// Sum of the heights of every label row before `index`.
pub fn row_offset(index: usize, rows: &[&Task]) -> f32 {
    rows.iter().take(index).map(|t| row_height(t)).sum()
}

/// Top offset of every label row, computed in one pass.
pub fn row_offsets(rows: &[&Task]) -> Vec<f32> {
    rows.iter()
        .scan(0.0f32, |acc, t| {
            let top = *acc;
            *acc += row_height(t);
            Some(top)
        })
        .collect()
}

/// Vertical extent of the color strip beside an expanded phase's children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBand {
    pub phase_id: Uuid,
    pub top: f32,
    pub height: f32,
}

/// Band for an expanded phase, or `None` for collapsed phases, leaves and
/// phases without visible children.
pub fn phase_color_band(phase: &Task, visible: &[&Task]) -> Option<ColorBand> {
    if !phase.is_expanded_phase() {
        return None;
    }
    let children: Vec<&Task> = visible
        .iter()
        .copied()
        .filter(|t| t.parent_id == Some(phase.id))
        .collect();
    if children.is_empty() {
        return None;
    }

    let height = children.iter().map(|t| row_height(t)).sum::<f32>() - BAND_DEFLATE;
    let rows = label_rows(visible);
    let top = rows
        .iter()
        .position(|t| t.parent_id == Some(phase.id))
        .map(|i| row_offset(i, &rows))
        .unwrap_or(0.0);

    Some(ColorBand {
        phase_id: phase.id,
        top,
        height,
    })
}

/// Horizontal placement of a bar as percentages of the timeline width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarGeometry {
    pub left_percent: f32,
    pub width_percent: f32,
}

/// Bar placement for `start..end`. The left edge is clamped to `0..=100` and
/// the width never drops below 1%, so zero-length tasks stay clickable. A
/// zero-width or inverted timeline is treated as 1 ms wide.
pub fn bar_geometry(start: DateTime<Utc>, end: DateTime<Utc>, bounds: &TimelineBounds) -> BarGeometry {
    let span = bounds.divisor_ms();
    let offset = duration_ms(bounds.start, start) as f64;
    let duration = duration_ms(start, end) as f64;

    BarGeometry {
        left_percent: (offset / span * 100.0).clamp(0.0, 100.0) as f32,
        width_percent: ((duration / span * 100.0) as f32).max(MIN_BAR_WIDTH_PERCENT),
    }
}

/// Bar for a task, when it has both dates.
pub fn task_bar(task: &Task, bounds: &TimelineBounds) -> Option<BarGeometry> {
    let (start, end) = task.dates()?;
    Some(bar_geometry(start, end, bounds))
}

/// Whether any task names `id` as its parent.
pub fn has_children(id: Uuid, tasks: &[Task]) -> bool {
    tasks.iter().any(|t| t.parent_id == Some(id))
}

/// Geometry of one label row and its bar.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub task_id: Uuid,
    pub level: u32,
    pub top: f32,
    pub height: f32,
    /// `None` when the task has no dates to draw.
    pub bar: Option<BarGeometry>,
    /// Draw the expand chevron.
    pub has_children: bool,
}

/// Everything the label and bar columns need for one render pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChartLayout {
    pub rows: Vec<RowLayout>,
    pub bands: Vec<ColorBand>,
    pub content_height: f32,
}

impl ChartLayout {
    /// Lay out already resolved `tasks` against `bounds`.
    pub fn compute(tasks: &[Task], bounds: &TimelineBounds) -> Self {
        let visible = visible_rows(tasks);
        let rows = rows_with_bars(&visible);
        let offsets = row_offsets(&rows);

        let rows: Vec<RowLayout> = rows
            .iter()
            .zip(offsets)
            .map(|(task, top)| RowLayout {
                task_id: task.id,
                level: task.level,
                top,
                height: row_height(task),
                bar: task_bar(task, bounds),
                has_children: has_children(task.id, tasks),
            })
            .collect();

        let bands = visible
            .iter()
            .filter_map(|phase| phase_color_band(phase, &visible))
            .collect();

        let content_height = rows.iter().map(|r| r.height).sum();

        Self {
            rows,
            bands,
            content_height,
        }
    }
}
