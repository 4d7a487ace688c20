//! Error types for openmc-runner

use std::path::PathBuf;

use breeder_core::BreederError;
use thiserror::Error;

/// Errors raised while preparing or running the OpenMC executable.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Executable could not be started
    #[error("cannot start {executable}: {reason}")]
    Spawn { executable: String, reason: String },

    /// Engine exited with a non-zero status
    #[error("{executable} exited with status {code}: {stderr_tail}")]
    EngineFailed {
        executable: String,
        code: i32,
        stderr_tail: String,
    },

    /// Mesh file is not where the model says it is
    #[error("geometry mesh not found: {0:?}")]
    MeshNotFound(PathBuf),

    /// Engine finished without leaving a tally report
    #[error("no tally output in {0:?}")]
    ResultMissing(PathBuf),

    /// Model cannot be expressed as an input deck
    #[error("cannot render input deck: {0}")]
    Deck(String),

    /// Source build command failed
    #[error("source build failed: {0}")]
    SourceBuild(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RunnerError> for BreederError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::SourceBuild(reason) => BreederError::InvalidSource(reason),
            other => BreederError::Engine(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunnerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use breeder_core::FailureStage;

    #[test]
    fn engine_errors_fold_into_engine_stage() {
        let err: BreederError = RunnerError::EngineFailed {
            executable: "openmc".to_string(),
            code: 1,
            stderr_tail: "ERROR: Could not find DAGMC file".to_string(),
        }
        .into();
        assert_eq!(err.stage(), FailureStage::Engine);
        assert!(err.to_string().contains("DAGMC"));

        let err: BreederError = RunnerError::MeshNotFound("dagmc.h5m".into()).into();
        assert_eq!(err.stage(), FailureStage::Engine);
    }

    #[test]
    fn source_build_failure_is_configuration() {
        let err: BreederError = RunnerError::SourceBuild("make: no rule".to_string()).into();
        assert_eq!(err.stage(), FailureStage::Configuration);
    }
}
