//! Source compiler that shells out to a build command.
//!
//! The command receives the plasma parameters two ways: `{parameters}` in
//! any argument expands to the canonical parameter string, and every value
//! is exported as a `PLASMA_*` environment variable. `{artifact}` expands to
//! the path the command must write the shared library to.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use breeder_core::artifact::{absolutize, ArtifactDigest};
use breeder_core::{CompiledSource, PlasmaSource, SourceCompiler, SourceRef};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::RunnerError;

/// Builds the source library with an external command.
#[derive(Debug, Clone)]
pub struct CommandSourceCompiler {
    command: Vec<String>,
}

impl CommandSourceCompiler {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn expand(&self, artifact: &Path, parameters: &str) -> Vec<String> {
        let artifact = artifact.display().to_string();
        self.command
            .iter()
            .map(|arg| {
                arg.replace("{artifact}", &artifact)
                    .replace("{parameters}", parameters)
            })
            .collect()
    }

    async fn build(&self, source: &PlasmaSource, artifact: &Path) -> Result<ArtifactDigest, RunnerError> {
        let Some(program) = self.command.first() else {
            return Err(RunnerError::SourceBuild("empty build command".to_string()));
        };

        let parent = match artifact.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;
        let file_name = artifact
            .file_name()
            .ok_or_else(|| RunnerError::SourceBuild(format!("{artifact:?} has no file name")))?;

        // Build next to the target, then rename over it.
        let staging = tempfile::Builder::new()
            .prefix(".source-build")
            .tempdir_in(&parent)?;
        let staged = staging.path().join(file_name);

        let argv = self.expand(&staged, &source.parameter_string());
        debug!(program = %program, args = ?&argv[1..], "building plasma source");

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .envs(source.env_vars())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| RunnerError::SourceBuild(format!("cannot start {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RunnerError::SourceBuild(format!(
                "{program} exited with status {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        if !staged.is_file() {
            return Err(RunnerError::SourceBuild(format!(
                "{program} succeeded but wrote nothing to {{artifact}}"
            )));
        }

        std::fs::rename(&staged, artifact)?;
        ArtifactDigest::of_file(artifact).map_err(|e| RunnerError::SourceBuild(e.to_string()))
    }
}

#[async_trait]
impl SourceCompiler for CommandSourceCompiler {
    async fn compile(&self, source: &PlasmaSource, artifact: &Path) -> breeder_core::Result<CompiledSource> {
        source.validate()?;
        let digest = self.build(source, artifact).await?;
        let artifact = absolutize(artifact)?;

        info!(
            artifact = %artifact.display(),
            digest = %digest.short(),
            "built plasma source library"
        );

        Ok(CompiledSource {
            reference: SourceRef {
                library: artifact.clone(),
                parameters: None,
            },
            artifact,
            digest,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use breeder_core::{BreederError, PlasmaShape};

    fn plasma() -> PlasmaSource {
        PlasmaSource::new(PlasmaShape {
            elongation: 2.9,
            minor_radius: 1.118,
            major_radius: 1.9,
            triangularity: 0.55,
        })
    }

    fn sh(script: &str) -> CommandSourceCompiler {
        CommandSourceCompiler::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            script.to_string(),
            "build".to_string(),
            "{artifact}".to_string(),
            "{parameters}".to_string(),
        ])
    }

    #[tokio::test]
    async fn placeholders_and_env_reach_command() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("my_custom_plasma_source.so");
        let compiler = sh(r#"printf '%s|%s' "$PLASMA_ELONGATION" "$2" > "$1""#);

        let compiled = compiler.compile(&plasma(), &artifact).await.unwrap();

        let content = std::fs::read_to_string(&artifact).unwrap();
        assert!(content.starts_with("2.9|major_radius=1.9"));
        assert_eq!(compiled.reference.library, compiled.artifact);
        assert!(compiled.reference.parameters.is_none());
        assert!(compiled.artifact.is_absolute());
    }

    #[tokio::test]
    async fn rebuild_replaces_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("source.so");
        std::fs::write(&artifact, b"stale").unwrap();

        let compiled = sh(r#"printf fresh > "$1""#)
            .compile(&plasma(), &artifact)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&artifact).unwrap(), b"fresh");
        assert_eq!(compiled.digest, ArtifactDigest::compute(b"fresh"));
    }

    #[tokio::test]
    async fn failing_build_keeps_old_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = dir.path().join("source.so");
        std::fs::write(&artifact, b"old").unwrap();

        let err = sh("echo 'no compiler' >&2; exit 2")
            .compile(&plasma(), &artifact)
            .await
            .unwrap_err();
        assert!(matches!(err, BreederError::InvalidSource(ref r) if r.contains("no compiler")));
        assert_eq!(std::fs::read(&artifact).unwrap(), b"old");
    }

    #[tokio::test]
    async fn silent_build_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sh("true")
            .compile(&plasma(), &dir.path().join("source.so"))
            .await
            .unwrap_err();
        assert!(matches!(err, BreederError::InvalidSource(_)));
    }

    #[tokio::test]
    async fn empty_command_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = CommandSourceCompiler::new(vec![])
            .compile(&plasma(), &dir.path().join("source.so"))
            .await
            .unwrap_err();
        assert!(matches!(err, BreederError::InvalidSource(_)));
    }
}
