//! Structured observability hooks for pipeline lifecycle events.
//!
//! - Run-scoped tracing span via the `RunSpan` RAII guard
//! - One emitter per lifecycle event: start, stage done, engine done,
//!   tally extracted, publish, failure

use crate::error::BreederError;
use tracing::info;

/// RAII guard that keeps a run-scoped span entered for the duration of a run.
///
/// ```ignore
/// let _span = RunSpan::enter("3f1c…");
/// // every event below carries run_id = "3f1c…"
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the run id.
    pub fn enter(run_id: &str) -> Self {
        Self {
            _span: run_span(run_id).entered(),
        }
    }
}

/// The run-scoped span, for instrumenting async work.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("tbr.run", run_id = %run_id)
}

/// Emit event: pipeline started against the named engine.
pub fn emit_run_started(run_id: &str, engine: &str) {
    info!(event = "run.started", run_id = %run_id, engine = %engine);
}

/// Emit event: a pipeline stage completed.
pub fn emit_stage_completed(stage: &str, duration_ms: u64) {
    info!(event = "stage.completed", stage = %stage, duration_ms = duration_ms);
}

/// Emit event: the engine returned a result artifact.
pub fn emit_engine_finished(engine: &str, artifact: &std::path::Path, duration_ms: u64) {
    info!(
        event = "engine.finished",
        engine = %engine,
        artifact = %artifact.display(),
        duration_ms = duration_ms,
    );
}

/// Emit event: a tally was reduced to a scalar.
pub fn emit_tally_extracted(tally: &str, rows: usize, value: f64) {
    info!(event = "tally.extracted", tally = %tally, rows = rows, value = value);
}

/// Emit event: the summary was copied to the publish directory.
pub fn emit_summary_published(target: &std::path::Path) {
    info!(event = "summary.published", target = %target.display());
}

/// Emit event: the run aborted (error level).
pub fn emit_run_failed(run_id: &str, error: &BreederError) {
    tracing::error!(
        event = "run.failed",
        run_id = %run_id,
        stage = %error.stage(),
        error = %error,
    );
}
