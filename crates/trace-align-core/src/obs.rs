//! Structured observability hooks for alignment runs.
//!
//! Every emission carries an `event` field so runs can be followed in JSON
//! log output (`trace-align --json`).

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::TraceError;

/// RAII guard that enters a run-scoped span for the duration of a run.
pub struct AlignmentRunSpan {
    run_id: String,
    _span: tracing::span::EnteredSpan,
}

impl AlignmentRunSpan {
    /// Create and enter a span tagged with a fresh run id.
    pub fn enter() -> Self {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("trace_align.run", run_id = %run_id);
        Self {
            run_id,
            _span: span.entered(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

pub fn emit_tool_started(program: &str, args: &[String]) {
    info!(event = "tool.started", program = %program, args = ?args);
}

pub fn emit_tool_finished(exit_code: i32, duration_ms: u64) {
    info!(event = "tool.finished", exit_code = exit_code, duration_ms = duration_ms);
}

pub fn emit_store_loaded(templates: usize, cases: usize, rejected: usize) {
    info!(
        event = "store.loaded",
        templates = templates,
        cases = cases,
        rejected = rejected,
    );
}

/// Emit event: a trace was left out of the output (warning level).
pub fn emit_trace_skipped(case_id: Option<&str>, reason: &TraceError) {
    warn!(
        event = "trace.skipped",
        case_id = case_id.unwrap_or("<none>"),
        kind = reason.kind(),
        reason = %reason,
    );
}

pub fn emit_alignment_finished(
    run_id: &str,
    duration_ms: u64,
    aligned: usize,
    skipped: usize,
    records: usize,
) {
    info!(
        event = "alignment.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        aligned = aligned,
        skipped = skipped,
        records = records,
    );
}
