//! JSON result export.
//!
//! ```json
//! {"tallies": [{"id": 1, "name": "TBR", "rows": [{"cell": 1, "score": "(n,Xt)", "mean": 0.1, "std. dev.": 0.002}]}]}
//! ```
//!
//! Rows are kept as raw column maps; column types are checked at extraction.

use serde::Deserialize;

use super::{Row, StatePoint, TallyTable};

#[derive(Deserialize)]
struct ExportFile {
    tallies: Vec<ExportTally>,
}

#[derive(Deserialize)]
struct ExportTally {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    rows: Vec<Row>,
}

pub(crate) fn parse(raw: &str) -> Result<StatePoint, String> {
    let file: ExportFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    Ok(StatePoint {
        tallies: file
            .tallies
            .into_iter()
            .map(|t| TallyTable {
                id: t.id,
                name: t.name,
                rows: t.rows,
            })
            .collect(),
    })
}
