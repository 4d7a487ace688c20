//! Error taxonomy for the TBR pipeline.

use std::path::PathBuf;

/// Pipeline phase in which a failure was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    /// Material lookup, source parameters, settings, tallies, config.
    Configuration,
    /// Anything raised while the transport engine runs.
    Engine,
    /// Result extraction, summary writing, publishing.
    PostProcessing,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureStage::Configuration => "configuration",
            FailureStage::Engine => "engine",
            FailureStage::PostProcessing => "post-processing",
        };
        f.write_str(s)
    }
}

/// Errors produced by the breeder pipeline.
#[derive(Debug, thiserror::Error)]
pub enum BreederError {
    #[error("unknown material: {0}")]
    UnknownMaterial(String),

    #[error("enrichment {value} out of range for material {material} (expected 0-100 %)")]
    EnrichmentOutOfRange { material: String, value: f64 },

    #[error("material {0} has no enrichable element")]
    EnrichmentNotApplicable(String),

    #[error("duplicate material name: {0}")]
    DuplicateMaterial(String),

    #[error("invalid material catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid plasma source: {0}")]
    InvalidSource(String),

    #[error("invalid run settings: {0}")]
    InvalidSettings(String),

    #[error("invalid tally: {0}")]
    InvalidTally(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("engine failure: {0}")]
    Engine(String),

    #[error("tally not found: {0}")]
    TallyNotFound(String),

    #[error("tally name {0} matches more than one tally")]
    AmbiguousTally(String),

    #[error("tally {tally} is malformed: {reason}")]
    TallyFormat { tally: String, reason: String },

    #[error("unreadable result artifact {path:?}: {reason}")]
    ResultArtifact { path: PathBuf, reason: String },

    #[error("publish target directory does not exist: {0:?}")]
    PublishTargetMissing(PathBuf),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BreederError {
    /// Classify the failure by pipeline phase.
    pub fn stage(&self) -> FailureStage {
        match self {
            BreederError::UnknownMaterial(_)
            | BreederError::EnrichmentOutOfRange { .. }
            | BreederError::EnrichmentNotApplicable(_)
            | BreederError::DuplicateMaterial(_)
            | BreederError::InvalidCatalog(_)
            | BreederError::InvalidSource(_)
            | BreederError::InvalidSettings(_)
            | BreederError::InvalidTally(_)
            | BreederError::Config(_) => FailureStage::Configuration,
            BreederError::Engine(_) => FailureStage::Engine,
            BreederError::TallyNotFound(_)
            | BreederError::AmbiguousTally(_)
            | BreederError::TallyFormat { .. }
            | BreederError::ResultArtifact { .. }
            | BreederError::PublishTargetMissing(_)
            | BreederError::Serialization(_)
            | BreederError::Io(_) => FailureStage::PostProcessing,
        }
    }
}

/// Result type for breeder operations.
pub type Result<T> = std::result::Result<T, BreederError>;
