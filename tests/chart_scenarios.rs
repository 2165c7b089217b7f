//! End-to-end scenarios over the task store and the render pass.

use chrono::{DateTime, Duration, TimeZone, Utc};

use gantt_engine::engine::layout::{bar_geometry, rows_with_bars, visible_rows};
use gantt_engine::engine::phase::{project_timeline, project_timeline_now};
use gantt_engine::engine::scale::generate_markers;
use gantt_engine::model::{Project, ScaleSelector, Task, TaskKind, TaskUpdate, TimeScale, TimelineBounds};
use gantt_engine::ChartFrame;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

/// Phase A (expanded) with A1, A2 and phase B (collapsed) with B1, built
/// through the store the way an editor would.
fn editor_project() -> (Project, [uuid::Uuid; 5]) {
    let now = at(2024, 1, 1);
    let mut project = Project::new("scenario");
    let a = project.add_task(None, TaskKind::Phase, now).unwrap();
    let a1 = project.add_task(Some(a), TaskKind::Leaf, now).unwrap();
    let a2 = project.add_task(Some(a), TaskKind::Leaf, now + Duration::days(3)).unwrap();
    let b = project.add_task(None, TaskKind::Phase, now).unwrap();
    let b1 = project.add_task(Some(b), TaskKind::Leaf, now + Duration::days(10)).unwrap();

    for (id, name) in [(a, "A"), (a1, "A1"), (a2, "A2"), (b, "B"), (b1, "B1")] {
        project
            .update_task(
                id,
                TaskUpdate {
                    name: Some(name.to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
    }
    project.toggle_expand(b).unwrap();
    (project, [a, a1, a2, b, b1])
}

fn names(rows: &[&Task]) -> Vec<String> {
    rows.iter().map(|t| t.name.clone()).collect()
}

#[test]
fn visible_and_bar_rows_follow_expand_state() {
    let (project, _) = editor_project();
    let visible = visible_rows(&project.tasks);
    assert_eq!(names(&visible), ["A", "A1", "A2", "B"]);
    assert_eq!(names(&rows_with_bars(&visible)), ["A1", "A2", "B"]);
}

#[test]
fn cascading_delete_leaves_other_branch_untouched() {
    let (mut project, [a, a1, a2, b, b1]) = editor_project();
    let mut removed = project.delete_task(a);
    removed.sort();
    let mut expected = vec![a, a1, a2];
    expected.sort();
    assert_eq!(removed, expected);

    let remaining: Vec<_> = project.tasks.iter().map(|t| t.id).collect();
    assert_eq!(remaining, [b, b1]);
}

#[test]
fn expanding_a_phase_reveals_children_and_drops_its_bar() {
    let (mut project, [_, _, _, b, _]) = editor_project();
    project.toggle_expand(b).unwrap();
    let visible = visible_rows(&project.tasks);
    assert_eq!(names(&visible), ["A", "A1", "A2", "B", "B1"]);
    assert_eq!(names(&rows_with_bars(&visible)), ["A1", "A2", "B1"]);
}

#[test]
fn empty_project_timeline_surrounds_now() {
    let before = Utc::now();
    let bounds = project_timeline_now(&[]);
    let after = Utc::now();
    assert!(bounds.start >= before - Duration::days(7));
    assert!(bounds.start <= after - Duration::days(7));
    assert!(bounds.end >= before + Duration::days(30));
    assert!(bounds.end <= after + Duration::days(30));
}

#[test]
fn thirty_day_span_is_padded_by_fourteen_hours_each_side() {
    let tasks = vec![Task::new_leaf("January", at(2024, 1, 1), at(2024, 1, 31))];
    let bounds = project_timeline(&tasks, at(2030, 1, 1));
    let pad = Duration::hours(14) + Duration::minutes(24);
    assert_eq!(bounds.start, at(2024, 1, 1) - pad);
    assert_eq!(bounds.end, at(2024, 1, 31) + pad);
}

#[test]
fn single_day_range_has_one_marker() {
    let markers = generate_markers(at(2024, 1, 1), at(2024, 1, 1), TimeScale::Days);
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].date, at(2024, 1, 1));
}

#[test]
fn full_span_and_zero_length_bars() {
    let bounds = TimelineBounds::new(at(2024, 1, 1), at(2024, 3, 1));
    let full = bar_geometry(bounds.start, bounds.end, &bounds);
    assert_eq!((full.left_percent, full.width_percent), (0.0, 100.0));
    let point = bar_geometry(at(2024, 2, 1), at(2024, 2, 1), &bounds);
    assert_eq!(point.width_percent, 1.0);
}

#[test]
fn frame_cycles_scale_on_demand() {
    let (project, _) = editor_project();
    let now = at(2024, 1, 1);
    let mut selector = ScaleSelector::new();
    let frame = ChartFrame::compute(&project.tasks, &project.settings, &selector, now);
    assert_eq!(frame.scale, TimeScale::Days);

    selector.cycle(&frame.render_settings.timeline);
    let frame = ChartFrame::compute(&project.tasks, &project.settings, &selector, now);
    assert_eq!(frame.scale, TimeScale::Weeks);
    assert!(frame.markers.iter().all(|m| (0.0..=100.0).contains(&m.position)));
}
