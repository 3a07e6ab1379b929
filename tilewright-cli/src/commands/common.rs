//! Shared plumbing for CLI commands.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tilewright::pool::{ResultMessage, WorkerPool};

/// Per-run context shared by every stage command.
pub struct StageContext {
    /// Worker pool sized from the global `-t` flag.
    pub pool: WorkerPool,
    /// Cooperative shutdown token wired to Ctrl-C.
    pub shutdown: CancellationToken,
}

/// Logs every per-job result message and a closing summary.
///
/// Failed jobs are recognizable only by their message text, so this is a
/// plain report: nothing here aborts the run.
pub fn report_messages(stage: &str, messages: &[ResultMessage]) {
    for message in messages {
        info!("{message}");
    }
    let failures = messages
        .iter()
        .filter(|m| m.message.contains("failed"))
        .count();
    if failures > 0 {
        warn!(stage, jobs = messages.len(), failures, "stage finished with failures");
    } else {
        info!(stage, jobs = messages.len(), "stage complete");
    }
}
