use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GanttError {
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Parent task not found: {0}")]
    ParentNotFound(Uuid),

    #[error("Moving task {task} under {parent} would create a cycle")]
    CycleDetected { task: Uuid, parent: Uuid },

    #[error("Dates of phase {0} are derived from its tasks and cannot be set")]
    DerivedDates(Uuid),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("CSV format error: {0}")]
    CsvFormat(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GanttError>;
