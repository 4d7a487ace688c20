//! Observability tests for TBR run lifecycle tracing.

use std::path::Path;

use breeder_core::{
    emit_engine_finished, emit_run_failed, emit_run_started, emit_stage_completed,
    emit_summary_published, emit_tally_extracted, BreederError, RunSpan,
};
use tracing_test::traced_test;

#[traced_test]
#[test]
fn test_emit_run_started_logs_engine() {
    emit_run_started("run-123", "openmc");
    assert!(logs_contain("run.started"));
    assert!(logs_contain("openmc"));
}

#[traced_test]
#[test]
fn test_emit_stage_and_engine_events() {
    emit_stage_completed("materials", 3);
    emit_engine_finished("openmc", Path::new("run/tallies.out"), 5000);
    assert!(logs_contain("stage.completed"));
    assert!(logs_contain("run/tallies.out"));
}

#[traced_test]
#[test]
fn test_emit_tally_extracted_logs_value() {
    emit_tally_extracted("TBR", 2, 1.05);
    assert!(logs_contain("tally.extracted"));
    assert!(logs_contain("1.05"));
}

#[traced_test]
#[test]
fn test_emit_summary_published() {
    emit_summary_published(Path::new("/my_openmc_workshop/cad_simulation_results.json"));
    assert!(logs_contain("summary.published"));
}

#[traced_test]
#[test]
fn test_emit_run_failed_carries_stage() {
    let err = BreederError::PublishTargetMissing("/my_openmc_workshop".into());
    emit_run_failed("run-err-001", &err);
    assert!(logs_contain("run.failed"));
    assert!(logs_contain("post-processing"));
}

#[traced_test]
#[test]
fn test_run_span_tags_events() {
    let span = RunSpan::enter("span-run-42");
    emit_stage_completed("source", 1);
    drop(span);
    assert!(logs_contain("span-run-42"));
}
