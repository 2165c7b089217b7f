use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, TimeZone, Utc};
use egui::Color32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::settings::ProjectSettings;
use super::task::{ExpandState, Task, TaskKind};
use crate::error::{GanttError, Result};

/// A Gantt project: a flat, ordered task list plus settings.
///
/// Tasks reference their parent by id only. Every structural mutation keeps
/// `level` consistent with parentage and the parent graph acyclic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub settings: ProjectSettings,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Partial-field update applied by [`Project::update_task`].
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub color: Option<Color32>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub is_expanded: Option<bool>,
    pub dependencies: Option<Vec<Uuid>>,
}

impl TaskUpdate {
    fn touches_dates(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

impl Default for Project {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
            tasks: Vec::new(),
            settings: ProjectSettings::default(),
            created: Utc::now(),
            modified: Utc::now(),
        }
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn task_mut(&mut self, id: Uuid) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(GanttError::TaskNotFound(id))
    }

    fn index_of(&self, id: Uuid) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(GanttError::TaskNotFound(id))
    }

    /// `id` and every task below it.
    pub fn subtree_ids(&self, id: Uuid) -> Vec<Uuid> {
        collect_subtree(&self.tasks, id)
    }

    // ── Mutations ───────────────────────────────────────────────

    /// Append a fresh task under `parent` (or at root level) and return its id.
    ///
    /// Leaves start at `now` and last one week; phases have no dates of
    /// their own.
    pub fn add_task(&mut self, parent: Option<Uuid>, kind: TaskKind, now: DateTime<Utc>) -> Result<Uuid> {
        let level = match parent {
            Some(pid) => {
                self.task(pid)
                    .ok_or(GanttError::ParentNotFound(pid))?
                    .level
                    + 1
            }
            None => 0,
        };

        let mut task = match kind {
            TaskKind::Phase => Task::new_phase("New Phase"),
            TaskKind::Leaf => Task::new_leaf("New Task", now, now + Duration::days(7)),
        };
        task.parent_id = parent;
        task.level = level;

        let id = task.id;
        tracing::debug!(%id, ?kind, ?parent, level, "adding task");
        self.tasks.push(task);
        self.touch();
        Ok(id)
    }

    /// Apply a partial update. Phase dates are derived and cannot be set.
    pub fn update_task(&mut self, id: Uuid, update: TaskUpdate) -> Result<()> {
        let task = self.task_mut(id)?;
        if task.is_phase() && update.touches_dates() {
            return Err(GanttError::DerivedDates(id));
        }

        if let Some(name) = update.name {
            task.name = name;
        }
        if let Some(color) = update.color {
            task.color = color;
        }
        if let Some(start) = update.start_date {
            task.start_date = start;
        }
        if let Some(end) = update.end_date {
            task.end_date = end;
        }
        if let Some(expanded) = update.is_expanded {
            task.is_expanded = expanded;
        }
        if let Some(deps) = update.dependencies {
            task.dependencies = deps;
        }
        self.touch();
        Ok(())
    }

    /// Delete a task and all of its descendants. Returns the removed ids;
    /// an unknown id removes nothing.
    pub fn delete_task(&mut self, id: Uuid) -> Vec<Uuid> {
        if self.task(id).is_none() {
            return Vec::new();
        }
        let doomed = self.subtree_ids(id);
        let set: HashSet<Uuid> = doomed.iter().copied().collect();
        self.tasks.retain(|t| !set.contains(&t.id));
        tracing::debug!(%id, removed = doomed.len(), "deleted task subtree");
        self.touch();
        doomed
    }

    /// Flip a phase between expanded and collapsed.
    pub fn toggle_expand(&mut self, id: Uuid) -> Result<ExpandState> {
        let state = self.task_mut(id)?.toggle_expanded();
        self.touch();
        Ok(state)
    }

    /// Move `id` (with its subtree) under `parent`, or to root level.
    pub fn set_parent(&mut self, id: Uuid, parent: Option<Uuid>) -> Result<()> {
        self.index_of(id)?;
        if let Some(pid) = parent {
            if self.task(pid).is_none() {
                return Err(GanttError::ParentNotFound(pid));
            }
            if self.subtree_ids(id).contains(&pid) {
                return Err(GanttError::CycleDetected { task: id, parent: pid });
            }
        }

        self.task_mut(id)?.parent_id = parent;
        self.relevel();
        self.touch();
        Ok(())
    }

    /// Move a task to position `index` in the list order (clamped).
    pub fn move_task(&mut self, id: Uuid, index: usize) -> Result<()> {
        let from = self.index_of(id)?;
        let task = self.tasks.remove(from);
        let to = index.min(self.tasks.len());
        self.tasks.insert(to, task);
        self.touch();
        Ok(())
    }

    /// Recompute every `level` from parentage. Tasks whose parent is
    /// missing or part of a cycle are treated as roots.
    pub fn relevel(&mut self) {
        let levels = compute_levels(&self.tasks);
        for task in &mut self.tasks {
            let level = levels.get(&task.id).copied().unwrap_or(0);
            if task.level != level {
                tracing::debug!(id = %task.id, from = task.level, to = level, "fixing level");
                task.level = level;
            }
        }
    }

    /// Generate a sample project for demonstration.
    pub fn sample() -> Project {
        let day = |y, m, d| Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap_or_default();
        let mut project = Project::new("Sample Project");

        // ── Phase 1: Planning ───────────────────────────────────────
        let planning = Task::new_phase("Project Planning").with_color(Color32::from_rgb(0x34, 0x98, 0xdb));
        let requirements = Task::new_leaf("Requirements Gathering", day(2024, 1, 1), day(2024, 1, 7))
            .with_parent(&planning)
            .with_color(Color32::from_rgb(0x5d, 0xad, 0xe2));
        let design = Task::new_leaf("Technical Design", day(2024, 1, 8), day(2024, 1, 15))
            .with_parent(&planning)
            .with_color(Color32::from_rgb(0x5d, 0xad, 0xe2));

        // ── Phase 2: Development ────────────────────────────────────
        let development =
            Task::new_phase("Development Phase").with_color(Color32::from_rgb(0xe7, 0x4c, 0x3c));
        let frontend = Task::new_leaf("Frontend Development", day(2024, 1, 16), day(2024, 2, 5))
            .with_parent(&development)
            .with_color(Color32::from_rgb(0xf1, 0x94, 0x8a));
        let backend = Task::new_leaf("Backend API", day(2024, 1, 20), day(2024, 2, 15))
            .with_parent(&development)
            .with_color(Color32::from_rgb(0xf1, 0x94, 0x8a));

        // ── Phase 3: Testing (collapsed) ────────────────────────────
        let testing = Task::new_phase("Testing & QA Phase")
            .with_color(Color32::from_rgb(0xf3, 0x9c, 0x12))
            .with_expanded(false);
        let unit = Task::new_leaf("Unit Testing", day(2024, 2, 10), day(2024, 2, 20))
            .with_parent(&testing)
            .with_color(Color32::from_rgb(0xf7, 0xdc, 0x6f));
        let integration = Task::new_leaf("Integration Testing", day(2024, 2, 21), day(2024, 2, 28))
            .with_parent(&testing)
            .with_color(Color32::from_rgb(0xf7, 0xdc, 0x6f));

        // Order: parent, then children in sequence
        project.tasks = vec![
            planning,
            requirements,
            design,
            development,
            frontend,
            backend,
            testing,
            unit,
            integration,
        ];
        project
    }
}

/// Transitive closure of `id` over `parent_id`, starting with `id` itself.
pub fn collect_subtree(tasks: &[Task], id: Uuid) -> Vec<Uuid> {
    let mut out = vec![id];
    let mut seen: HashSet<Uuid> = HashSet::from([id]);
    let mut i = 0;
    while i < out.len() {
        let current = out[i];
        for child in tasks.iter().filter(|t| t.parent_id == Some(current)) {
            if seen.insert(child.id) {
                out.push(child.id);
            }
        }
        i += 1;
    }
    out
}

/// Depth of every task derived from parentage. Tasks on a parent cycle or
/// under a missing parent restart at 0.
pub fn compute_levels(tasks: &[Task]) -> HashMap<Uuid, u32> {
    let parents: HashMap<Uuid, Option<Uuid>> = tasks.iter().map(|t| (t.id, t.parent_id)).collect();
    let mut levels = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let mut depth = 0u32;
        let mut visited = HashSet::from([task.id]);
        let mut cursor = task.parent_id;
        while let Some(pid) = cursor {
            if !parents.contains_key(&pid) || !visited.insert(pid) {
                depth = 0;
                break;
            }
            depth += 1;
            cursor = parents.get(&pid).copied().flatten();
        }
        levels.insert(task.id, depth);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{DEFAULT_PHASE_COLOR, DEFAULT_TASK_COLOR};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn id_of(project: &Project, name: &str) -> Uuid {
        project.tasks.iter().find(|t| t.name == name).unwrap().id
    }

    #[test]
    fn add_task_derives_level_from_parent() {
        let mut project = Project::new("p");
        let phase = project.add_task(None, TaskKind::Phase, now()).unwrap();
        let leaf = project.add_task(Some(phase), TaskKind::Leaf, now()).unwrap();
        let nested = project.add_task(Some(leaf), TaskKind::Leaf, now()).unwrap();

        assert_eq!(project.task(phase).unwrap().level, 0);
        assert_eq!(project.task(leaf).unwrap().level, 1);
        assert_eq!(project.task(nested).unwrap().level, 2);

        let leaf = project.task(leaf).unwrap();
        assert_eq!(leaf.name, "New Task");
        assert_eq!(leaf.color, DEFAULT_TASK_COLOR);
        assert_eq!(leaf.start_date, Some(now()));
        assert_eq!(leaf.end_date, Some(now() + Duration::days(7)));
        let phase = project.task(phase).unwrap();
        assert_eq!(phase.color, DEFAULT_PHASE_COLOR);
        assert!(phase.start_date.is_none());
        assert!(phase.is_expanded);
    }

    #[test]
    fn add_task_rejects_unknown_parent() {
        let mut project = Project::new("p");
        let missing = Uuid::new_v4();
        let err = project.add_task(Some(missing), TaskKind::Leaf, now()).unwrap_err();
        assert!(matches!(err, GanttError::ParentNotFound(id) if id == missing));
        assert!(project.tasks.is_empty());
    }

    #[test]
    fn delete_cascades_to_descendants_only() {
        let mut project = Project::sample();
        let planning = id_of(&project, "Project Planning");
        let removed = project.delete_task(planning);

        assert_eq!(removed.len(), 3);
        let names: Vec<&str> = project.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "Development Phase",
                "Frontend Development",
                "Backend API",
                "Testing & QA Phase",
                "Unit Testing",
                "Integration Testing",
            ]
        );
    }

    #[test]
    fn delete_unknown_task_is_noop() {
        let mut project = Project::sample();
        assert!(project.delete_task(Uuid::new_v4()).is_empty());
        assert_eq!(project.tasks.len(), 9);
    }

    #[test]
    fn update_applies_partial_fields() {
        let mut project = Project::sample();
        let design = id_of(&project, "Technical Design");
        project
            .update_task(
                design,
                TaskUpdate {
                    name: Some("Architecture".into()),
                    end_date: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        let task = project.task(design).unwrap();
        assert_eq!(task.name, "Architecture");
        assert!(task.start_date.is_some());
        assert!(task.end_date.is_none());
    }

    #[test]
    fn phase_dates_cannot_be_set() {
        let mut project = Project::sample();
        let planning = id_of(&project, "Project Planning");
        let err = project
            .update_task(
                planning,
                TaskUpdate {
                    start_date: Some(Some(now())),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, GanttError::DerivedDates(_)));
    }

    #[test]
    fn set_parent_relevels_subtree_and_rejects_cycles() {
        let mut project = Project::sample();
        let planning = id_of(&project, "Project Planning");
        let development = id_of(&project, "Development Phase");
        let frontend = id_of(&project, "Frontend Development");

        project.set_parent(planning, Some(development)).unwrap();
        assert_eq!(project.task(planning).unwrap().level, 1);
        assert_eq!(project.task(id_of(&project, "Technical Design")).unwrap().level, 2);

        let err = project.set_parent(development, Some(frontend)).unwrap_err();
        assert!(matches!(err, GanttError::CycleDetected { .. }));
        let err = project.set_parent(development, Some(development)).unwrap_err();
        assert!(matches!(err, GanttError::CycleDetected { .. }));

        project.set_parent(planning, None).unwrap();
        assert_eq!(project.task(planning).unwrap().level, 0);
    }

    #[test]
    fn move_task_reorders_and_clamps() {
        let mut project = Project::sample();
        let testing = id_of(&project, "Testing & QA Phase");
        project.move_task(testing, 0).unwrap();
        assert_eq!(project.tasks[0].id, testing);
        project.move_task(testing, 100).unwrap();
        assert_eq!(project.tasks.last().unwrap().id, testing);
    }

    #[test]
    fn relevel_repairs_stale_levels() {
        let mut project = Project::sample();
        for task in &mut project.tasks {
            task.level = 7;
        }
        project.relevel();
        let levels: Vec<u32> = project.tasks.iter().map(|t| t.level).collect();
        assert_eq!(levels, [0, 1, 1, 0, 1, 1, 0, 1, 1]);
    }

    #[test]
    fn toggle_expand_reports_new_state() {
        let mut project = Project::sample();
        let testing = id_of(&project, "Testing & QA Phase");
        assert_eq!(project.toggle_expand(testing).unwrap(), ExpandState::Expanded);
        assert_eq!(project.toggle_expand(testing).unwrap(), ExpandState::Collapsed);
        assert!(project.toggle_expand(Uuid::new_v4()).is_err());
    }
}
