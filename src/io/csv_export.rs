use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::engine::phase::resolve_all_tasks;
use crate::error::Result;
use crate::model::{Task, TaskKind};

fn kind_label(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Phase => "phase",
        TaskKind::Leaf => "task",
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default()
}

/// Write the resolved schedule as semicolon-delimited CSV.
///
/// Columns: Task Label ; Type ; Level ; Parent ; Start Date ; End Date
/// Dates are formatted as DD/MM/YYYY; phases carry their derived dates.
/// Returns the number of tasks written.
pub fn write_csv<W: Write>(tasks: &[Task], writer: W) -> Result<usize> {
    let resolved = resolve_all_tasks(tasks);
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(["Task Label", "Type", "Level", "Parent", "Start Date", "End Date"])?;

    for task in &resolved {
        let parent = task
            .parent_id
            .and_then(|pid| resolved.iter().find(|t| t.id == pid))
            .map(|p| p.name.as_str())
            .unwrap_or("");
        let level = task.level.to_string();
        let start = format_date(task.start_date);
        let end = format_date(task.end_date);
        wtr.write_record([
            task.name.as_str(),
            kind_label(task.kind),
            level.as_str(),
            parent,
            start.as_str(),
            end.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(resolved.len())
}

/// Export the resolved schedule to a CSV file.
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    write_csv(tasks, file)
}
