//! Output artifacts: the tally summary, its published copy, and the run manifest.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::artifact::{write_atomic, ArtifactDigest};
use crate::error::{BreederError, Result};
use crate::obs::emit_summary_published;
use crate::results::TallyValue;

/// Render `{"<tally>": <value>}` as pretty JSON.
pub fn render_summary(value: &TallyValue) -> Result<String> {
    let number = serde_json::Number::from_f64(value.value).ok_or_else(|| {
        BreederError::TallyFormat {
            tally: value.tally.clone(),
            reason: format!("value {} cannot be written as JSON", value.value),
        }
    })?;
    let mut obj = Map::new();
    obj.insert(value.tally.clone(), Value::Number(number));
    Ok(serde_json::to_string_pretty(&Value::Object(obj))?)
}

/// Write the summary file.
pub fn write_summary(path: &Path, value: &TallyValue) -> Result<ArtifactDigest> {
    let content = render_summary(value)?;
    write_atomic(path, content.as_bytes())
}

/// Copy `summary` into `target_dir`, which must already exist.
///
/// Returns the path of the copy.
pub fn publish_summary(summary: &Path, target_dir: &Path) -> Result<PathBuf> {
    if !target_dir.is_dir() {
        return Err(BreederError::PublishTargetMissing(target_dir.to_path_buf()));
    }
    let file_name = summary.file_name().ok_or_else(|| {
        BreederError::Config(format!("summary path {:?} has no file name", summary))
    })?;
    let target = target_dir.join(file_name);
    std::fs::copy(summary, &target)?;
    emit_summary_published(&target);
    Ok(target)
}

/// Record of one pipeline run, written as `run_manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub schema_version: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub engine: String,
    pub batches: u32,
    pub particles: u64,
    pub materials: Vec<String>,
    pub source_artifact: PathBuf,
    pub source_digest: String,
    pub result_artifact: PathBuf,
    pub result_digest: String,
    pub tally: String,
    pub value: f64,
    pub summary: PathBuf,
    pub published_to: Option<PathBuf>,
}

pub const MANIFEST_SCHEMA_VERSION: &str = "1.0";

/// Write the manifest in pretty JSON format.
pub fn write_manifest(path: &Path, manifest: &RunManifest) -> Result<ArtifactDigest> {
    let content = serde_json::to_string_pretty(manifest)?;
    write_atomic(path, content.as_bytes())
}
