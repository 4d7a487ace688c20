//! OpenMC process invocation.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use breeder_core::config::EngineSection;
use breeder_core::geometry::DAGMC_FILE_NAME;
use breeder_core::{Model, ResultFormat, ResultHandle, TransportEngine};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::deck::InputDeck;
use crate::error::{Result, RunnerError};

/// Text tally report written when `<output><tallies>` is on.
pub const TALLIES_OUT: &str = "tallies.out";

const STDERR_TAIL_LINES: usize = 20;

/// Runs the `openmc` executable on a rendered input deck.
#[derive(Debug, Clone)]
pub struct OpenmcEngine {
    executable: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    threads: Option<u32>,
}

/// Captured output of one engine run.
#[derive(Debug, Clone)]
pub struct EngineRun {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl OpenmcEngine {
    pub fn new(executable: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
            threads: None,
        }
    }

    pub fn from_config(section: &EngineSection) -> Self {
        Self {
            executable: section.executable.clone(),
            args: section.args.clone(),
            working_dir: section.working_dir.clone(),
            threads: section.threads,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Write the input deck and stage the mesh without running anything.
    /// Reports and statepoints left by an earlier run are removed.
    pub fn prepare(&self, model: &Model) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.working_dir)?;
        self.clear_outputs()?;
        let mut written = InputDeck::render(model)?.write_to(&self.working_dir)?;
        if model.settings().dagmc() {
            written.push(self.stage_mesh(model.geometry().mesh())?);
        }
        Ok(written)
    }

    fn clear_outputs(&self) -> Result<()> {
        for entry in std::fs::read_dir(&self.working_dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let stale = name == TALLIES_OUT
                || (name.starts_with("statepoint.") && name.ends_with(".h5"));
            if stale && path.is_file() {
                std::fs::remove_file(&path)?;
                debug!(path = %path.display(), "removed previous engine output");
            }
        }
        Ok(())
    }

    /// Put the mesh where the engine expects it. Relative mesh paths are
    /// resolved against the current directory, not the working directory.
    fn stage_mesh(&self, mesh: &Path) -> Result<PathBuf> {
        if !mesh.is_file() {
            return Err(RunnerError::MeshNotFound(mesh.to_path_buf()));
        }
        let target = self.working_dir.join(DAGMC_FILE_NAME);
        let same = match (mesh.canonicalize(), target.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if !same {
            std::fs::copy(mesh, &target)?;
            debug!(from = %mesh.display(), to = %target.display(), "staged DAGMC mesh");
        }
        Ok(target)
    }

    fn command_line(&self) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(threads) = self.threads {
            args.push("-s".to_string());
            args.push(threads.to_string());
        }
        args
    }

    /// Run the executable in the working directory and wait for it.
    pub async fn invoke(&self) -> Result<EngineRun> {
        let start = Instant::now();
        let args = self.command_line();
        info!(
            executable = %self.executable.display(),
            args = ?args,
            working_dir = %self.working_dir.display(),
            "starting engine"
        );

        let child = Command::new(&self.executable)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RunnerError::Spawn {
                executable: self.executable.display().to_string(),
                reason: e.to_string(),
            })?;
        let output = child.wait_with_output().await?;

        Ok(EngineRun {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Prepare, invoke and locate the tally report.
    pub async fn run_model(&self, model: &Model) -> Result<ResultHandle> {
        self.prepare(model)?;
        let run = self.invoke().await?;

        if run.exit_code != 0 {
            let tail = if run.stderr.trim().is_empty() {
                tail_lines(&run.stdout, STDERR_TAIL_LINES)
            } else {
                tail_lines(&run.stderr, STDERR_TAIL_LINES)
            };
            return Err(RunnerError::EngineFailed {
                executable: self.executable.display().to_string(),
                code: run.exit_code,
                stderr_tail: tail,
            });
        }
        debug!(duration_ms = run.duration_ms, "engine exited cleanly");

        let statepoint = self
            .working_dir
            .join(format!("statepoint.{}.h5", model.settings().batches()));
        if statepoint.is_file() {
            info!(statepoint = %statepoint.display(), "engine wrote statepoint");
        } else {
            warn!(expected = %statepoint.display(), "no statepoint file found");
        }

        let tallies = self.working_dir.join(TALLIES_OUT);
        if !tallies.is_file() {
            return Err(RunnerError::ResultMissing(self.working_dir.clone()));
        }
        Ok(ResultHandle::new(tallies, ResultFormat::TalliesOut))
    }
}

#[async_trait]
impl TransportEngine for OpenmcEngine {
    fn name(&self) -> &str {
        "openmc"
    }

    async fn run(&self, model: Model) -> breeder_core::Result<ResultHandle> {
        Ok(self.run_model(&model).await?)
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
