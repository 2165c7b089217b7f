use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{GanttError, Result};
use crate::model::project::compute_levels;
use crate::model::task::parse_hex_color;
use crate::model::{Task, TaskKind};

/// Columns the importer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Start,
    End,
    Kind,
    Parent,
    Color,
    Expanded,
}

/// Try parsing a date string with several common formats; the result is
/// midnight UTC.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d", "%m-%d-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

fn header_to_column(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity" => Some(Column::Name),

        "start" | "startdate" | "from" | "begin" | "begindate" => Some(Column::Start),

        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "duedate" => Some(Column::End),

        "type" | "kind" | "tasktype" => Some(Column::Kind),

        "parent" | "parenttask" | "parentname" | "phase" | "subtaskof" => Some(Column::Parent),

        "color" | "colour" => Some(Column::Color),

        "expanded" | "isexpanded" | "open" => Some(Column::Expanded),

        _ => None,
    }
}

fn parse_kind(s: &str) -> TaskKind {
    match s.trim().to_lowercase().as_str() {
        "phase" | "group" | "section" | "summary" => TaskKind::Phase,
        _ => TaskKind::Leaf,
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "expanded" | "open" => Some(true),
        "false" | "no" | "0" | "collapsed" | "closed" => Some(false),
        _ => None,
    }
}

/// Import tasks from a CSV file. See [`import_csv_str`].
pub fn import_csv(path: &Path) -> Result<(Vec<Task>, usize)> {
    let content = std::fs::read_to_string(path)?;
    import_csv_str(&content)
}

/// Import tasks from CSV text.
///
/// Auto-detects delimiter (comma, semicolon, tab) and matches column headers
/// flexibly. Leaf rows need a name and valid dates; phase rows need only a
/// name. Parents are matched by name (case-insensitive) after all rows are
/// read and levels are derived from the resulting hierarchy.
/// Returns `(tasks, skipped_count)` on success.
pub fn import_csv_str(content: &str) -> Result<(Vec<Task>, usize)> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let col_map: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();

    let has = |c: Column| col_map.contains(&Some(c));
    if !has(Column::Name) || !has(Column::Start) || !has(Column::End) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(GanttError::Csv(format!(
            "CSV is missing required columns. Found headers: {:?}. \
             Need columns for: task name, start date, end date.",
            found
        )));
    }

    // Accumulate (task, optional parent name) pairs; resolve parent IDs in a second pass.
    let mut tasks: Vec<Task> = Vec::new();
    let mut parent_names: Vec<Option<String>> = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(row, error = %e, "skipping unreadable CSV row");
                skipped += 1;
                continue;
            }
        };

        let mut fields: HashMap<Column, &str> = HashMap::new();
        for (field, column) in record.iter().zip(&col_map) {
            if let Some(column) = column {
                fields.insert(*column, field);
            }
        }
        let field = |c: Column| fields.get(&c).copied().unwrap_or("");

        let name = field(Column::Name);
        if name.is_empty() {
            skipped += 1;
            continue;
        }

        let kind = parse_kind(field(Column::Kind));
        let mut task = match kind {
            TaskKind::Phase => Task::new_phase(name),
            TaskKind::Leaf => {
                let (Some(start), Some(end)) = (parse_date(field(Column::Start)), parse_date(field(Column::End)))
                else {
                    tracing::warn!(
                        row,
                        start = field(Column::Start),
                        end = field(Column::End),
                        "skipping row with invalid dates"
                    );
                    skipped += 1;
                    continue;
                };
                Task::new_leaf(name, start, end)
            }
        };

        let color = field(Column::Color);
        if !color.is_empty() {
            match parse_hex_color(color) {
                Ok(c) => task.color = c,
                Err(e) => tracing::warn!(row, error = %e, "keeping default color"),
            }
        }
        if let Some(expanded) = parse_flag(field(Column::Expanded)) {
            task.is_expanded = expanded;
        }

        let parent = field(Column::Parent);
        parent_names.push((!parent.is_empty()).then(|| parent.to_string()));
        tasks.push(task);
    }

    if tasks.is_empty() && skipped > 0 {
        return Err(GanttError::Csv(format!(
            "No valid tasks found in CSV ({} rows skipped)",
            skipped
        )));
    }
    if tasks.is_empty() {
        return Err(GanttError::Csv("CSV file is empty or has no data rows".to_string()));
    }

    // Second pass: resolve parent names to ids. The first task with a given
    // name wins.
    let mut name_to_id: HashMap<String, Uuid> = HashMap::new();
    for task in &tasks {
        name_to_id.entry(task.name.to_lowercase()).or_insert(task.id);
    }

    for (task, parent_name) in tasks.iter_mut().zip(parent_names.iter()) {
        if let Some(pname) = parent_name {
            match name_to_id.get(&pname.to_lowercase()) {
                // Don't allow a task to be its own parent.
                Some(&pid) if pid != task.id => task.parent_id = Some(pid),
                Some(_) => {}
                None => tracing::warn!(parent = %pname, task = %task.name, "parent task not found"),
            }
        }
    }

    // Break any parent cycles introduced by name matching.
    loop {
        let cyclic = tasks.iter().position(|t| on_cycle(&tasks, t.id));
        match cyclic {
            Some(i) => {
                tracing::warn!(task = %tasks[i].name, "detaching task from parent cycle");
                tasks[i].parent_id = None;
            }
            None => break,
        }
    }

    let levels = compute_levels(&tasks);
    for task in &mut tasks {
        task.level = levels.get(&task.id).copied().unwrap_or(0);
    }

    Ok((tasks, skipped))
}

/// Whether following parents from `id` leads back to `id`.
fn on_cycle(tasks: &[Task], id: Uuid) -> bool {
    let mut cursor = tasks.iter().find(|t| t.id == id).and_then(|t| t.parent_id);
    let mut steps = 0;
    while let Some(pid) = cursor {
        if pid == id {
            return true;
        }
        steps += 1;
        if steps > tasks.len() {
            return false;
        }
        cursor = tasks.iter().find(|t| t.id == pid).and_then(|t| t.parent_id);
    }
    false
}
