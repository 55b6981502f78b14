//! Canned task breakdowns used when no LLM is involved

pub mod canvas;
pub mod jobs;

pub use canvas::{canvas_title, is_canvas_request, CanvasTaskGenerator, CanvasTaskSet};
pub use jobs::{AssignedAgent, Job, JobGenerator, ProjectKind};
