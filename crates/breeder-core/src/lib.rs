//! Breeder core library
//!
//! Domain model and orchestration for tritium breeding ratio runs: material
//! resolution, geometry binding, plasma source artifacts, run settings,
//! tallies, the transport engine seam, result extraction and reporting.

pub mod artifact;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod material;
pub mod model;
pub mod obs;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod settings;
pub mod source;
pub mod tally;
pub mod telemetry;

pub use artifact::ArtifactDigest;
pub use config::RunConfig;
pub use engine::{ResultFormat, ResultHandle, TransportEngine};
pub use error::{BreederError, FailureStage, Result};
pub use geometry::Geometry;
pub use material::{
    resolve, CatalogEntry, FractionBasis, Material, MaterialCatalog, MaterialDatabase,
    MaterialRequest, MaterialSet,
};
pub use model::Model;
pub use obs::{
    emit_engine_finished, emit_run_failed, emit_run_started, emit_stage_completed,
    emit_summary_published, emit_tally_extracted, RunSpan,
};
pub use pipeline::{build_model, material_database, run_pipeline, RunOutcome};
pub use report::{publish_summary, render_summary, write_summary, RunManifest};
pub use results::{extract_tally_sum, StatePoint, TallyTable, TallyValue};
pub use settings::{RunMode, RunSettings};
pub use source::{
    CompiledSource, ParameterFileCompiler, PlasmaProfile, PlasmaShape, PlasmaSource,
    SourceCompiler, SourceRef,
};
pub use tally::{Score, Tally, TallyFilter, TallySet, TallySpec};
pub use telemetry::init_tracing;

/// Crate version, recorded in logs.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
