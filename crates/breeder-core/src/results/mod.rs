//! Result extraction: load a result artifact, find a tally, reduce its rows.

pub mod json;
pub mod sum;
pub mod tallies_out;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::engine::{ResultFormat, ResultHandle};
use crate::error::{BreederError, Result};
use crate::obs::emit_tally_extracted;
pub use sum::{exact_sum, ExactSum};

/// Column holding the tally estimate.
pub const MEAN_COLUMN: &str = "mean";
/// Column holding the standard deviation of the estimate.
pub const STD_DEV_COLUMN: &str = "std. dev.";

/// One result row: column name to value, like a data-frame row.
pub type Row = serde_json::Map<String, Value>;

/// Rows of one tally as found in a result artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct TallyTable {
    pub id: Option<u32>,
    pub name: String,
    pub rows: Vec<Row>,
}

impl TallyTable {
    /// The `mean` column; every row must carry a number.
    pub fn means(&self) -> Result<Vec<f64>> {
        if self.rows.is_empty() {
            return Err(self.format_error("no result rows".to_string()));
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| match row.get(MEAN_COLUMN) {
                Some(Value::Number(n)) => n
                    .as_f64()
                    .ok_or_else(|| self.format_error(format!("row {i}: mean {n} is not a float"))),
                Some(other) => Err(self.format_error(format!(
                    "row {i}: mean is not numeric ({other})"
                ))),
                None => Err(self.format_error(format!("row {i}: no {MEAN_COLUMN} column"))),
            })
            .collect()
    }

    /// Sum of the `mean` column over every row (all cells, bins and scores).
    pub fn sum_of_means(&self) -> Result<f64> {
        Ok(exact_sum(self.means()?))
    }

    fn format_error(&self, reason: String) -> BreederError {
        BreederError::TallyFormat {
            tally: self.name.clone(),
            reason,
        }
    }
}

/// All tallies of one result artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePoint {
    pub tallies: Vec<TallyTable>,
}

impl StatePoint {
    /// Read and parse the artifact behind `handle`.
    pub fn load(handle: &ResultHandle) -> Result<Self> {
        let raw = std::fs::read_to_string(&handle.path).map_err(|e| {
            BreederError::ResultArtifact {
                path: handle.path.clone(),
                reason: e.to_string(),
            }
        })?;

        let statepoint = match handle.format {
            ResultFormat::Json => json::parse(&raw),
            ResultFormat::TalliesOut => tallies_out::parse(&raw),
        }
        .map_err(|reason| BreederError::ResultArtifact {
            path: handle.path.clone(),
            reason,
        })?;

        debug!(
            path = %handle.path.display(),
            format = ?handle.format,
            tallies = statepoint.tallies.len(),
            "loaded result artifact"
        );
        Ok(statepoint)
    }

    /// The single tally called `name`.
    pub fn get_tally(&self, name: &str) -> Result<&TallyTable> {
        let mut matches = self.tallies.iter().filter(|t| t.name == name);
        match (matches.next(), matches.next()) {
            (Some(tally), None) => Ok(tally),
            (Some(_), Some(_)) => Err(BreederError::AmbiguousTally(name.to_string())),
            (None, _) => Err(BreederError::TallyNotFound(name.to_string())),
        }
    }
}

/// A tally reduced to one number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallyValue {
    pub tally: String,
    pub value: f64,
    pub rows: usize,
}

/// Load `handle`, find `tally`, and sum its `mean` column.
pub fn extract_tally_sum(handle: &ResultHandle, tally: &str) -> Result<TallyValue> {
    let statepoint = StatePoint::load(handle)?;
    let table = statepoint.get_tally(tally)?;
    let value = table.sum_of_means()?;

    emit_tally_extracted(tally, table.rows.len(), value);
    Ok(TallyValue {
        tally: tally.to_string(),
        value,
        rows: table.rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: Vec<Value>) -> TallyTable {
        TallyTable {
            id: Some(1),
            name: "TBR".to_string(),
            rows: rows
                .into_iter()
                .map(|v| v.as_object().cloned().unwrap())
                .collect(),
        }
    }

    #[test]
    fn sums_mean_column() {
        let t = table(vec![json!({"mean": 0.1}), json!({"mean": 0.05})]);
        let value = t.sum_of_means().unwrap();
        assert!((value - 0.15).abs() < 1e-15);
    }

    #[test]
    fn missing_mean_is_format_error() {
        let t = table(vec![json!({"mean": 0.1}), json!({"std. dev.": 0.01})]);
        let err = t.sum_of_means().unwrap_err();
        assert!(matches!(err, BreederError::TallyFormat { .. }));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn non_numeric_mean_is_format_error() {
        let t = table(vec![json!({"mean": "0.1"})]);
        assert!(matches!(
            t.sum_of_means().unwrap_err(),
            BreederError::TallyFormat { .. }
        ));
    }

    #[test]
    fn no_rows_is_format_error() {
        let t = table(vec![]);
        assert!(t.sum_of_means().is_err());
    }

    #[test]
    fn get_tally_lookup_errors() {
        let sp = StatePoint {
            tallies: vec![table(vec![json!({"mean": 1.0})])],
        };
        assert!(sp.get_tally("TBR").is_ok());
        assert!(matches!(
            sp.get_tally("heating").unwrap_err(),
            BreederError::TallyNotFound(_)
        ));

        let dup = StatePoint {
            tallies: vec![
                table(vec![json!({"mean": 1.0})]),
                table(vec![json!({"mean": 2.0})]),
            ],
        };
        assert!(matches!(
            dup.get_tally("TBR").unwrap_err(),
            BreederError::AmbiguousTally(_)
        ));
    }

    #[test]
    fn unreadable_artifact_reports_path() {
        let handle = ResultHandle::from_path("/nonexistent/tallies.out");
        let err = StatePoint::load(&handle).unwrap_err();
        assert!(matches!(err, BreederError::ResultArtifact { .. }));
    }
}
