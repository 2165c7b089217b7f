//! Task hierarchy, timeline and layout engine for Gantt chart editors.
//!
//! A flat list of [`Task`]s (phases and leaf tasks linked by parent id) goes
//! in; resolved phase dates, padded timeline bounds, a time scale with
//! labelled markers and row/bar geometry come out. See [`ChartFrame`] for the
//! whole pipeline in one call.

pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod model;

pub use engine::ChartFrame;
pub use error::{GanttError, Result};
pub use model::{Project, ProjectSettings, ScaleSelector, Task, TaskKind, TimeScale, TimelineBounds};
