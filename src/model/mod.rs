pub mod project;
pub mod settings;
pub mod task;
pub mod timeline;

pub use project::{Project, TaskUpdate};
pub use settings::{ProjectSettings, RenderSettings};
pub use task::{ExpandState, Task, TaskKind};
pub use timeline::{ScaleSelector, TimeScale, TimelineBounds, TimelineMarker};
