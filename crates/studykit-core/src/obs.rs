//! Structured events for the integration lifecycle.
//!
//! Every event carries an `event` field so JSON logs can be filtered on it.
//! Process executions are reported by `studykit-exec` as `exec.finished`.

use std::path::Path;

use tracing::{info, warn};

use crate::orchestrator::IntegrationPhase;
use crate::validator::ValidationOutcome;

/// Emit event: lifecycle phase change.
pub fn emit_transition(from: IntegrationPhase, to: IntegrationPhase) {
    info!(event = "integration.transition", from = %from, to = %to);
}

/// Emit event: tool validation settled.
pub fn emit_validated(tool: &str, outcome: &ValidationOutcome) {
    info!(
        event = "integration.validated",
        tool = %tool,
        result = %outcome.result,
        version = outcome.version.as_deref().unwrap_or("-"),
        tool_path = outcome.tool_path.as_deref().unwrap_or("-"),
    );
}

/// Emit event: command templates written.
pub fn emit_templates_generated(path: &Path, count: usize) {
    info!(
        event = "integration.templates_generated",
        path = %path.display(),
        count = count,
    );
}

/// Emit event: a lifecycle operation failed (warning level).
pub fn emit_failure(operation: &str, error_count: u32, error: &dyn std::fmt::Display) {
    warn!(
        event = "integration.failure",
        operation = %operation,
        error_count = error_count,
        error = %error,
    );
}
