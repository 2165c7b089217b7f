//! Phase date derivation, project timeline bounds and structural checks.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::date_math::{add_ms, duration_ms, max_instant, min_instant, padding_ms, MS_PER_DAY};
use crate::model::project::compute_levels;
use crate::model::{Task, TaskKind, TimelineBounds};

/// Fraction of the total span added on each side of the timeline.
pub const TIMELINE_PADDING_RATIO: f64 = 0.02;
/// Fallback bounds for a project without any dated task.
pub const EMPTY_LOOKBACK_DAYS: i64 = 7;
pub const EMPTY_LOOKAHEAD_DAYS: i64 = 30;

/// Earliest start and latest end over a phase's direct leaf children, each
/// resolved on its own. A side is `None` when no child carries that date.
pub fn resolve_phase_bounds(
    phase_id: Uuid,
    tasks: &[Task],
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let leaves = || {
        tasks
            .iter()
            .filter(move |t| t.parent_id == Some(phase_id) && t.kind == TaskKind::Leaf)
    };
    (
        min_instant(leaves().filter_map(|t| t.start_date)),
        max_instant(leaves().filter_map(|t| t.end_date)),
    )
}

/// Derived `(start, end)` of a phase. `None` unless both sides resolve.
pub fn resolve_phase_dates(phase_id: Uuid, tasks: &[Task]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    match resolve_phase_bounds(phase_id, tasks) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    }
}

/// Copy of `tasks` with every phase's dates replaced by its derived dates.
/// Start and end are filled independently.
pub fn resolve_all_tasks(tasks: &[Task]) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| match task.kind {
            TaskKind::Phase => {
                let (start_date, end_date) = resolve_phase_bounds(task.id, tasks);
                Task {
                    start_date,
                    end_date,
                    ..task.clone()
                }
            }
            TaskKind::Leaf => task.clone(),
        })
        .collect()
}

/// Padded bounds covering every dated task after phase resolution.
///
/// Without dated tasks the range runs from a week before `now` to a month
/// after it. When all dates coincide the result has zero width.
pub fn project_timeline(tasks: &[Task], now: DateTime<Utc>) -> TimelineBounds {
    let resolved = resolve_all_tasks(tasks);
    let all_dates: Vec<DateTime<Utc>> = resolved
        .iter()
        .filter_map(Task::dates)
        .flat_map(|(s, e)| [s, e])
        .collect();

    let (Some(min), Some(max)) = (
        min_instant(all_dates.iter().copied()),
        max_instant(all_dates.iter().copied()),
    ) else {
        tracing::debug!("no dated tasks, using default timeline window");
        return TimelineBounds::new(
            add_ms(now, -EMPTY_LOOKBACK_DAYS * MS_PER_DAY),
            add_ms(now, EMPTY_LOOKAHEAD_DAYS * MS_PER_DAY),
        );
    };

    let pad = padding_ms(duration_ms(min, max), TIMELINE_PADDING_RATIO);
    TimelineBounds::new(add_ms(min, -pad), add_ms(max, pad))
}

pub fn project_timeline_now(tasks: &[Task]) -> TimelineBounds {
    project_timeline(tasks, Utc::now())
}

/// A structural problem found by [`validate_structure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    EmptyPhase { id: Uuid, name: String },
    MissingDates { id: Uuid, name: String },
    InvertedDates { id: Uuid, name: String },
    DanglingParent { id: Uuid, name: String, parent_id: Uuid },
    LevelMismatch { id: Uuid, name: String, stored: u32, expected: u32 },
}

impl Finding {
    pub fn task_id(&self) -> Uuid {
        match self {
            Finding::EmptyPhase { id, .. }
            | Finding::MissingDates { id, .. }
            | Finding::InvertedDates { id, .. }
            | Finding::DanglingParent { id, .. }
            | Finding::LevelMismatch { id, .. } => *id,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::EmptyPhase { name, .. } => {
                write!(f, "Phase \"{}\" must have at least one child task", name)
            }
            Finding::MissingDates { name, .. } => {
                write!(f, "Task \"{}\" must have start and end dates", name)
            }
            Finding::InvertedDates { name, .. } => {
                write!(f, "Task \"{}\" start date must be before end date", name)
            }
            Finding::DanglingParent { name, parent_id, .. } => {
                write!(f, "Task \"{}\" refers to missing parent {}", name, parent_id)
            }
            Finding::LevelMismatch { name, stored, expected, .. } => {
                write!(f, "Task \"{}\" has level {} but sits at depth {}", name, stored, expected)
            }
        }
    }
}

/// Collect structural findings. Advisory only: callers decide whether any
/// finding blocks further action.
pub fn validate_structure(tasks: &[Task]) -> Vec<Finding> {
    let ids: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
    let levels = compute_levels(tasks);
    let mut findings = Vec::new();

    for task in tasks {
        let id = task.id;
        let name = task.name.clone();
        match task.kind {
            TaskKind::Phase => {
                if !tasks.iter().any(|t| t.parent_id == Some(id)) {
                    findings.push(Finding::EmptyPhase { id, name: name.clone() });
                }
            }
            TaskKind::Leaf => {
                if task.start_date.is_none() || task.end_date.is_none() {
                    findings.push(Finding::MissingDates { id, name: name.clone() });
                }
                if let Some((start, end)) = task.dates() {
                    if start > end {
                        findings.push(Finding::InvertedDates { id, name: name.clone() });
                    }
                }
            }
        }

        if let Some(parent_id) = task.parent_id {
            if !ids.contains(&parent_id) {
                findings.push(Finding::DanglingParent { id, name, parent_id });
                continue;
            }
        }
        let expected = levels.get(&id).copied().unwrap_or(0);
        if task.level != expected {
            findings.push(Finding::LevelMismatch {
                id,
                name,
                stored: task.level,
                expected,
            });
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn phase_spans_its_leaf_children() {
        let phase = Task::new_phase("Build");
        let a = Task::new_leaf("a", at(2024, 1, 5), at(2024, 1, 9)).with_parent(&phase);
        let b = Task::new_leaf("b", at(2024, 1, 3), at(2024, 1, 7)).with_parent(&phase);
        let tasks = vec![phase.clone(), a, b];

        assert_eq!(
            resolve_phase_dates(phase.id, &tasks),
            Some((at(2024, 1, 3), at(2024, 1, 9)))
        );
    }

    #[test]
    fn phase_ignores_nested_phases_and_undated_leaves() {
        let phase = Task::new_phase("Outer");
        let inner = Task::new_phase("Inner").with_parent(&phase);
        let deep = Task::new_leaf("deep", at(2023, 1, 1), at(2025, 1, 1)).with_parent(&inner);
        let mut undated = Task::new_leaf("undated", at(2024, 1, 1), at(2024, 1, 2)).with_parent(&phase);
        undated.start_date = None;
        undated.end_date = None;
        let tasks = vec![phase.clone(), inner.clone(), deep, undated];

        assert_eq!(resolve_phase_dates(phase.id, &tasks), None);
        assert_eq!(
            resolve_phase_dates(inner.id, &tasks),
            Some((at(2023, 1, 1), at(2025, 1, 1)))
        );
    }

    #[test]
    fn phase_without_children_has_no_dates() {
        let phase = Task::new_phase("Empty");
        let tasks = vec![phase.clone()];
        assert_eq!(resolve_phase_dates(phase.id, &tasks), None);
    }

    #[test]
    fn phase_needs_both_a_start_and_an_end() {
        let phase = Task::new_phase("Half");
        let mut leaf = Task::new_leaf("only start", at(2024, 1, 1), at(2024, 1, 2)).with_parent(&phase);
        leaf.end_date = None;
        let tasks = vec![phase.clone(), leaf];
        assert_eq!(resolve_phase_dates(phase.id, &tasks), None);
    }

    #[test]
    fn resolved_phase_keeps_start_when_no_child_has_an_end() {
        let phase = Task::new_phase("Half");
        let mut leaf = Task::new_leaf("only start", at(2024, 1, 1), at(2024, 1, 2)).with_parent(&phase);
        leaf.end_date = None;
        let resolved = resolve_all_tasks(&[phase.clone(), leaf]);

        assert_eq!(
            resolve_phase_bounds(phase.id, &resolved),
            (Some(at(2024, 1, 1)), None)
        );
        assert_eq!(resolved[0].start_date, Some(at(2024, 1, 1)));
        assert_eq!(resolved[0].end_date, None);
        assert_eq!(resolved[0].dates(), None);
    }

    #[test]
    fn resolve_all_overwrites_stale_phase_dates() {
        let mut phase = Task::new_phase("Stale");
        phase.start_date = Some(at(2000, 1, 1));
        phase.end_date = Some(at(2000, 1, 2));
        let tasks = vec![phase];

        let resolved = resolve_all_tasks(&tasks);
        assert!(resolved[0].start_date.is_none());
        assert!(resolved[0].end_date.is_none());
        assert!(tasks[0].start_date.is_some(), "input must not be mutated");
    }

    #[test]
    fn timeline_pads_two_percent_each_side() {
        let tasks = vec![Task::new_leaf("month", at(2024, 1, 1), at(2024, 1, 31))];
        let bounds = project_timeline(&tasks, at(2030, 1, 1));

        let expected_start = Utc.with_ymd_and_hms(2023, 12, 31, 9, 36, 0).unwrap();
        let expected_end = Utc.with_ymd_and_hms(2024, 1, 31, 14, 24, 0).unwrap();
        assert_eq!(bounds.start, expected_start);
        assert_eq!(bounds.end, expected_end);
    }

    #[test]
    fn timeline_falls_back_around_now() {
        let now = at(2024, 6, 1);
        let mut undated = Task::new_leaf("undated", now, now);
        undated.start_date = None;
        for tasks in [Vec::new(), vec![undated], vec![Task::new_phase("Empty")]] {
            let bounds = project_timeline(&tasks, now);
            assert_eq!(bounds.start, now - Duration::days(7));
            assert_eq!(bounds.end, now + Duration::days(30));
        }
    }

    #[test]
    fn timeline_collapses_on_single_instant() {
        let day = at(2024, 2, 2);
        let bounds = project_timeline(&[Task::new_leaf("m", day, day)], at(2030, 1, 1));
        assert_eq!(bounds.start, day);
        assert_eq!(bounds.end, day);
    }

    #[test]
    fn timeline_saturates_at_representable_range() {
        let min = DateTime::<Utc>::MIN_UTC;
        let leaf = Task::new_leaf("ancient", min, min + Duration::days(10));
        let bounds = project_timeline(&[leaf], at(2030, 1, 1));
        assert_eq!(bounds.start, min);
        assert_eq!(bounds.end, min + Duration::days(10) + Duration::hours(4) + Duration::minutes(48));

        let max = DateTime::<Utc>::MAX_UTC;
        let leaf = Task::new_leaf("distant", max - Duration::days(10), max);
        assert_eq!(project_timeline(&[leaf], at(2030, 1, 1)).end, max);

        let bounds = project_timeline(&[], max);
        assert_eq!(bounds.start, max - Duration::days(7));
        assert_eq!(bounds.end, max);
        assert_eq!(project_timeline(&[], min).start, min);
    }

    #[test]
    fn validation_reports_each_problem() {
        let empty = Task::new_phase("Lonely");
        let mut undated = Task::new_leaf("Undated", at(2024, 1, 1), at(2024, 1, 2));
        undated.end_date = None;
        let inverted = Task::new_leaf("Backwards", at(2024, 1, 5), at(2024, 1, 1));
        let mut orphan = Task::new_leaf("Orphan", at(2024, 1, 1), at(2024, 1, 2));
        orphan.parent_id = Some(Uuid::new_v4());
        let mut deep = Task::new_leaf("Deep", at(2024, 1, 1), at(2024, 1, 2));
        deep.level = 3;

        let findings = validate_structure(&[empty, undated, inverted, orphan, deep]);
        let messages: Vec<String> = findings.iter().map(ToString::to_string).collect();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0], "Phase \"Lonely\" must have at least one child task");
        assert_eq!(messages[1], "Task \"Undated\" must have start and end dates");
        assert_eq!(messages[2], "Task \"Backwards\" start date must be before end date");
        assert!(matches!(findings[3], Finding::DanglingParent { .. }));
        assert!(matches!(
            findings[4],
            Finding::LevelMismatch { stored: 3, expected: 0, .. }
        ));
    }

    #[test]
    fn well_formed_project_has_no_findings() {
        let project = crate::model::Project::sample();
        assert!(validate_structure(&project.tasks).is_empty());
    }
}
