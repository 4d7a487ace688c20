//! The end-to-end run: materials, geometry, source, settings, engine, extraction.

use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, Instrument};
use uuid::Uuid;

use crate::artifact::ArtifactDigest;
use crate::config::RunConfig;
use crate::engine::TransportEngine;
use crate::error::{BreederError, Result};
use crate::geometry::Geometry;
use crate::material::{MaterialCatalog, MaterialDatabase, MaterialSet};
use crate::model::Model;
use crate::obs::{
    emit_engine_finished, emit_run_failed, emit_run_started, emit_stage_completed, run_span,
};
use crate::report::{
    publish_summary, write_manifest, write_summary, RunManifest, MANIFEST_SCHEMA_VERSION,
};
use crate::results::extract_tally_sum;
use crate::settings::RunSettings;
use crate::source::{SourceCompiler, SourceRef};
use crate::tally::TallySet;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub tally: String,
    pub value: f64,
    pub summary: PathBuf,
    pub published_to: Option<PathBuf>,
    pub manifest: RunManifest,
}

/// Built-in catalog, overlaid with the configured catalog file if any.
pub fn material_database(config: &RunConfig) -> Result<MaterialCatalog> {
    let mut catalog = MaterialCatalog::builtin();
    if let Some(path) = &config.material_catalog {
        catalog.extend(MaterialCatalog::from_json_file(path)?);
    }
    Ok(catalog)
}

/// Compose the model from resolved materials and a compiled source.
pub fn build_model(config: &RunConfig, materials: MaterialSet, source: SourceRef) -> Result<Model> {
    let s = &config.settings;
    let settings = RunSettings::builder(source)
        .batches(s.batches)
        .inactive(s.inactive)
        .particles(s.particles)
        .run_mode(s.run_mode)
        .dagmc(s.dagmc)
        .build()?;

    let tallies = config
        .tallies
        .iter()
        .map(|spec| spec.build())
        .collect::<Result<Vec<_>>>()?;
    let tallies = TallySet::new(tallies)?;
    if tallies.get(&config.output.tally).is_none() {
        return Err(BreederError::Config(format!(
            "output tally {:?} is not among the configured tallies",
            config.output.tally
        )));
    }

    Model::new(
        Geometry::dagmc(config.geometry.mesh.clone()),
        materials,
        settings,
        tallies,
    )
}

/// Run the whole pipeline once.
///
/// Stops at the first failure; nothing is retried. The summary is written
/// before publishing, so a missing publish directory leaves the local
/// summary in place.
pub async fn run_pipeline(
    config: &RunConfig,
    db: &dyn MaterialDatabase,
    compiler: &dyn SourceCompiler,
    engine: &dyn TransportEngine,
) -> Result<RunOutcome> {
    let run_id = Uuid::new_v4();
    let id = run_id.to_string();

    async {
        let result = execute(run_id, config, db, compiler, engine).await;
        if let Err(e) = &result {
            emit_run_failed(&id, e);
        }
        result
    }
    .instrument(run_span(&id))
    .await
}

async fn execute(
    run_id: Uuid,
    config: &RunConfig,
    db: &dyn MaterialDatabase,
    compiler: &dyn SourceCompiler,
    engine: &dyn TransportEngine,
) -> Result<RunOutcome> {
    let started_at = Utc::now();
    emit_run_started(&run_id.to_string(), engine.name());

    let t = Instant::now();
    let materials = MaterialSet::resolve_all(db, &config.materials)?;
    let material_names = materials
        .iter()
        .map(|(_, m)| m.name().to_string())
        .collect::<Vec<_>>();
    emit_stage_completed("materials", elapsed_ms(t));

    let t = Instant::now();
    let compiled = compiler
        .compile(&config.source.plasma(), &config.source.artifact)
        .await?;
    emit_stage_completed("source", elapsed_ms(t));

    let model = build_model(config, materials, compiled.reference.clone())?;
    let (batches, particles) = (model.settings().batches(), model.settings().particles());

    let t = Instant::now();
    let handle = engine.run(model).await?;
    emit_engine_finished(engine.name(), &handle.path, elapsed_ms(t));

    let t = Instant::now();
    let value = extract_tally_sum(&handle, &config.output.tally)?;
    let result_digest = ArtifactDigest::of_file(&handle.path)?;
    write_summary(&config.output.summary, &value)?;
    info!(
        tally = %value.tally,
        value = value.value,
        summary = %config.output.summary.display(),
        "wrote summary"
    );
    emit_stage_completed("extract", elapsed_ms(t));

    let published_to = match config.publish_target() {
        Some(dir) => Some(publish_summary(&config.output.summary, dir)?),
        None => None,
    };

    let manifest = RunManifest {
        schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
        run_id,
        started_at,
        finished_at: Utc::now(),
        engine: engine.name().to_string(),
        batches,
        particles,
        materials: material_names,
        source_artifact: compiled.artifact.clone(),
        source_digest: compiled.digest.to_hex(),
        result_artifact: handle.path.clone(),
        result_digest: result_digest.to_hex(),
        tally: value.tally.clone(),
        value: value.value,
        summary: config.output.summary.clone(),
        published_to: published_to.clone(),
    };
    if let Some(path) = &config.output.manifest {
        write_manifest(path, &manifest)?;
    }

    Ok(RunOutcome {
        run_id,
        tally: value.tally,
        value: value.value,
        summary: config.output.summary.clone(),
        published_to,
        manifest,
    })
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::MaterialRequest;
    use crate::tally::{TallyFilter, TallySpec};

    fn source_ref() -> SourceRef {
        SourceRef {
            library: "source_sampling.so".into(),
            parameters: None,
        }
    }

    #[test]
    fn default_config_builds_reference_model() {
        let config = RunConfig::default();
        let db = material_database(&config).unwrap();
        let materials = MaterialSet::resolve_all(&db, &config.materials).unwrap();
        let model = build_model(&config, materials, source_ref()).unwrap();

        assert_eq!(model.materials().len(), 3);
        assert_eq!(model.settings().batches(), 10);
        assert_eq!(model.settings().particles(), 1000);
        assert_eq!(model.settings().inactive(), 0);
        assert!(model.settings().dagmc());
        assert_eq!(model.tallies().get("TBR").unwrap().scores()[0].as_str(), "(n,Xt)");
    }

    #[test]
    fn invalid_settings_rejected_before_engine() {
        let mut config = RunConfig::default();
        config.settings.inactive = 10;
        let db = material_database(&config).unwrap();
        let materials = MaterialSet::resolve_all(&db, &config.materials).unwrap();
        assert!(build_model(&config, materials, source_ref()).is_err());
    }

    #[test]
    fn unknown_output_tally_rejected_before_engine() {
        let mut config = RunConfig::default();
        config.output.tally = "TRB".to_string();
        let db = material_database(&config).unwrap();
        let materials = MaterialSet::resolve_all(&db, &config.materials).unwrap();

        let err = build_model(&config, materials, source_ref()).unwrap_err();
        assert!(matches!(err, BreederError::Config(ref m) if m.contains("TRB")));
        assert_eq!(err.stage(), crate::error::FailureStage::Configuration);
    }

    #[test]
    fn material_filter_checked_against_set() {
        let mut config = RunConfig::default();
        config.materials = vec![MaterialRequest::new("copper")];
        config.tallies = vec![TallySpec {
            filters: vec![TallyFilter::Material(vec!["Li4SiO4".to_string()])],
            ..TallySpec::default()
        }];
        let db = material_database(&config).unwrap();
        let materials = MaterialSet::resolve_all(&db, &config.materials).unwrap();
        assert!(build_model(&config, materials, source_ref()).is_err());
    }

    #[test]
    fn catalog_overlay_adds_materials() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"materials": [{"name": "lead", "density": 11.34, "basis": "atom", "components": {"Pb": 1.0}}]}"#,
        )
        .unwrap();

        let config = RunConfig {
            material_catalog: Some(path),
            ..RunConfig::default()
        };
        let db = material_database(&config).unwrap();
        assert!(db.lookup("lead").is_some());
        assert!(db.lookup("eurofer").is_some());
    }
}
