//! Agent executors served by the binary
//!
//! Each executor implements [`AgentExecutor`](crate::a2a::AgentExecutor) and
//! is paired with an [`AgentServer`](crate::a2a::AgentServer) by the launcher.

pub mod canvas;
pub mod llm_agent;
pub mod orchestrator;
pub mod request;
pub mod task_agent;

pub use canvas::CanvasAgentExecutor;
pub use llm_agent::{LlmAgentExecutor, LlmAgentProfile};
pub use orchestrator::OrchestratorExecutor;
pub use task_agent::TaskAgentExecutor;

use crate::a2a::executor::TaskUpdater;
use crate::a2a::types::{Artifact, Part};
use crate::error::AgentResult;

use self::request::tasks_created_text;

/// Emit a generated breakdown.
///
/// Blocking callers get a single final artifact. Non-blocking callers get the
/// artifact, a confirmation message and a completed status.
pub(crate) fn emit_task_breakdown(
    updater: &TaskUpdater,
    parts: Vec<Part>,
    blocking: bool,
) -> AgentResult<()> {
    let count = parts.len();
    let artifact = Artifact::new(parts);

    if blocking {
        return updater.push_artifact(artifact, None, true);
    }

    updater.push_artifact(artifact, None, false)?;
    updater.send_message(tasks_created_text(count))?;
    updater.complete()
}
