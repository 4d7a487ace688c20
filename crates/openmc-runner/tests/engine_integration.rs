//! OpenMC engine tests with a shell script standing in for the executable.
#![cfg(unix)]

use std::path::Path;

use breeder_core::{
    extract_tally_sum, run_pipeline, BreederError, FailureStage, Geometry, MaterialCatalog,
    MaterialRequest, MaterialSet, Model, ParameterFileCompiler, ResultFormat, RunConfig,
    RunSettings, SourceRef, Tally, TallySet, TransportEngine,
};
use openmc_runner::{OpenmcEngine, RunnerError};

const FAKE_OPENMC: &str = r#"
test -f materials.xml || exit 3
test -f settings.xml || exit 3
test -f dagmc.h5m || { echo "ERROR: no dagmc.h5m" >&2; exit 4; }
printf ' ============================>     TALLY 1: TBR     <============================\n\n' > tallies.out
printf ' Cell 2\n   Total Material\n     (n,Xt)   0.75 +/- 0.01\n' >> tallies.out
printf ' Cell 3\n   Total Material\n     (n,Xt)   0.375 +/- 0.02\n' >> tallies.out
touch statepoint.10.h5
"#;

fn shell_engine(working_dir: &Path, script: &str) -> OpenmcEngine {
    OpenmcEngine::new("sh", working_dir).with_args(vec!["-c".to_string(), script.to_string()])
}

fn model(mesh: &Path) -> Model {
    let materials = MaterialSet::resolve_all(
        &MaterialCatalog::builtin(),
        &[
            MaterialRequest::enriched("Li4SiO4", 90.0),
            MaterialRequest::new("eurofer"),
            MaterialRequest::new("copper"),
        ],
    )
    .expect("materials");
    let settings = RunSettings::fixed_source(
        10,
        1000,
        SourceRef {
            library: "/opt/source_sampling.so".into(),
            parameters: None,
        },
    )
    .expect("settings");
    Model::new(
        Geometry::dagmc(mesh),
        materials,
        settings,
        TallySet::new(vec![Tally::tbr()]).expect("tallies"),
    )
    .expect("model")
}

#[tokio::test]
async fn test_engine_stages_mesh_and_returns_tallies_out() {
    let cad = tempfile::tempdir().expect("tempdir");
    let mesh = cad.path().join("blanket.h5m");
    std::fs::write(&mesh, b"not really hdf5").expect("write mesh");
    let work = tempfile::tempdir().expect("tempdir");

    let engine = shell_engine(work.path(), FAKE_OPENMC);
    let handle = engine.run(model(&mesh)).await.expect("engine run");

    assert_eq!(handle.format, ResultFormat::TalliesOut);
    assert_eq!(handle.path, work.path().join("tallies.out"));
    assert!(work.path().join("dagmc.h5m").is_file());
    assert!(work.path().join("tallies.xml").is_file());

    let value = extract_tally_sum(&handle, "TBR").expect("extract");
    assert_eq!(value.rows, 2);
    assert_eq!(value.value, 1.125);
}

#[tokio::test]
async fn test_nonzero_exit_reports_stderr() {
    let cad = tempfile::tempdir().expect("tempdir");
    let mesh = cad.path().join("dagmc.h5m");
    std::fs::write(&mesh, b"mesh").expect("write mesh");
    let work = tempfile::tempdir().expect("tempdir");

    let engine = shell_engine(
        work.path(),
        "echo 'ERROR: Failed to load source library' >&2; exit 1",
    );
    let err = engine.run_model(&model(&mesh)).await.unwrap_err();
    match err {
        RunnerError::EngineFailed {
            code, stderr_tail, ..
        } => {
            assert_eq!(code, 1);
            assert!(stderr_tail.contains("source library"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_mesh_is_engine_error() {
    let work = tempfile::tempdir().expect("tempdir");
    let engine = shell_engine(work.path(), FAKE_OPENMC);

    let err = engine
        .run(model(&work.path().join("missing.h5m")))
        .await
        .unwrap_err();
    assert_eq!(err.stage(), FailureStage::Engine);
    assert!(!work.path().join("tallies.out").exists());
}

#[tokio::test]
async fn test_clean_exit_without_report_is_engine_error() {
    let cad = tempfile::tempdir().expect("tempdir");
    let mesh = cad.path().join("dagmc.h5m");
    std::fs::write(&mesh, b"mesh").expect("write mesh");
    let work = tempfile::tempdir().expect("tempdir");

    let err = shell_engine(work.path(), "true")
        .run(model(&mesh))
        .await
        .unwrap_err();
    assert!(matches!(err, BreederError::Engine(ref m) if m.contains("no tally output")));
}

#[tokio::test]
async fn test_report_from_previous_run_is_not_reused() {
    let cad = tempfile::tempdir().expect("tempdir");
    let mesh = cad.path().join("dagmc.h5m");
    std::fs::write(&mesh, b"mesh").expect("write mesh");
    let work = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        work.path().join("tallies.out"),
        " ============================>     TALLY 1: TBR     <============================\n\n     (n,Xt)   9.99 +/- 0.1\n",
    )
    .expect("write old report");

    let err = shell_engine(work.path(), "true")
        .run_model(&model(&mesh))
        .await
        .unwrap_err();
    assert!(matches!(err, RunnerError::ResultMissing(_)));
    assert!(!work.path().join("tallies.out").exists());
}

#[tokio::test]
async fn test_full_pipeline_through_shell_engine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mesh = dir.path().join("dagmc.h5m");
    std::fs::write(&mesh, b"mesh").expect("write mesh");
    let work = dir.path().join("run");

    let mut config = RunConfig::default();
    config.geometry.mesh = mesh;
    config.source.artifact = dir.path().join("my_custom_plasma_source.so");
    config.output.summary = dir.path().join("cad_simulation_results.json");
    config.output.manifest = None;
    config.output.publish = false;

    let db = MaterialCatalog::builtin();
    let compiler = ParameterFileCompiler::new(dir.path().join("source_sampling.so"));
    let engine = shell_engine(&work, FAKE_OPENMC);

    let outcome = run_pipeline(&config, &db, &compiler, &engine)
        .await
        .expect("pipeline");
    assert_eq!(outcome.value, 1.125);

    let settings = std::fs::read_to_string(work.join("settings.xml")).expect("settings.xml");
    assert!(settings.contains("source_sampling.so"));
    assert!(settings.contains("elongation=2.9"));
    assert!(!settings.contains("my_custom_plasma_source.so"));
    assert!(dir.path().join("my_custom_plasma_source.so").is_file());

    let summary: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("cad_simulation_results.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary["TBR"], 1.125);
}
