use std::path::Path;

use crate::error::Result;
use crate::model::Project;

/// Save a project to a JSON file.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a project from a JSON file. Levels are recomputed from parentage.
pub fn load_project(path: &Path) -> Result<Project> {
    let json = std::fs::read_to_string(path)?;
    let mut project: Project = serde_json::from_str(&json)?;
    project.relevel();
    tracing::debug!(path = %path.display(), tasks = project.tasks.len(), "loaded project");
    Ok(project)
}
