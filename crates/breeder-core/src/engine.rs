//! Transport engine seam: submit a [`Model`], receive a [`ResultHandle`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Model;

/// Layout of a result artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFormat {
    /// The engine's plain-text tally report (`tallies.out`).
    TalliesOut,
    /// JSON export: `{"tallies": [{"id", "name", "rows": [...]}]}`.
    Json,
}

impl ResultFormat {
    /// `.json` files are JSON exports; anything else is read as `tallies.out`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ResultFormat::Json,
            _ => ResultFormat::TalliesOut,
        }
    }
}

/// Where an engine left its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultHandle {
    pub path: PathBuf,
    pub format: ResultFormat,
}

impl ResultHandle {
    pub fn new(path: impl Into<PathBuf>, format: ResultFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Infer the format from the file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = ResultFormat::from_path(&path);
        Self { path, format }
    }
}

/// An external transport engine.
///
/// `run` blocks (asynchronously) until the engine finishes; there is no
/// cancellation or progress reporting. Every failure is reported as
/// [`BreederError::Engine`](crate::error::BreederError::Engine).
#[async_trait]
pub trait TransportEngine: Send + Sync {
    /// Short name for logs and the run manifest.
    fn name(&self) -> &str;

    /// Run the model to completion and return the result artifact.
    async fn run(&self, model: Model) -> Result<ResultHandle>;
}
