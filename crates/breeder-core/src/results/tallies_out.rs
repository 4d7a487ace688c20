//! Parser for the engine's plain-text tally report (`tallies.out`).
//!
//! ```text
//!  ============================>     TALLY 1: TBR     <============================
//!
//!  Cell 2
//!    Total Material
//!      (n,Xt)                               0.701234 +/- 0.012345
//! ```
//!
//! Header lines open a tally. Lines without `+/-` are filter or nuclide
//! labels, nested by indentation. Each `score mean +/- std.dev` line becomes
//! one row with the labels in scope joined into a `bin` column.
//!
//! The engine prints each mean with six significant digits, so a sum read
//! from this report is only as precise as those rounded rows. JSON exports
//! carry full `f64` means.

use regex::Regex;
use serde_json::{Number, Value};

use super::{Row, StatePoint, TallyTable, MEAN_COLUMN, STD_DEV_COLUMN};

const HEADER: &str = r"^\s*=+>\s+TALLY\s+(?P<id>\d+)(?::\s*(?P<name>.*?))?\s+<=+\s*$";
const SCORE: &str = r"^(?P<indent>\s*)(?P<score>\S.*?)\s+(?P<mean>\S+)\s+\+/-\s+(?P<std>\S+)\s*$";

pub(crate) fn parse(raw: &str) -> Result<StatePoint, String> {
    let header = Regex::new(HEADER).map_err(|e| e.to_string())?;
    let score = Regex::new(SCORE).map_err(|e| e.to_string())?;

    let mut tallies: Vec<TallyTable> = Vec::new();
    // (indent, label) of the filter/nuclide lines enclosing the next score.
    let mut labels: Vec<(usize, String)> = Vec::new();

    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(caps) = header.captures(line) {
            let id = caps["id"]
                .parse::<u32>()
                .map_err(|e| format!("line {}: bad tally id: {e}", lineno + 1))?;
            let name = caps
                .name("name")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            tallies.push(TallyTable {
                id: Some(id),
                name,
                rows: Vec::new(),
            });
            labels.clear();
            continue;
        }

        let Some(current) = tallies.last_mut() else {
            // Preamble before the first tally.
            continue;
        };

        if let Some(caps) = score.captures(line) {
            let mut row = Row::new();
            let bin = labels
                .iter()
                .map(|(_, l)| l.as_str())
                .collect::<Vec<_>>()
                .join(" / ");
            if !bin.is_empty() {
                row.insert("bin".to_string(), Value::String(bin));
            }
            row.insert("score".to_string(), Value::String(caps["score"].to_string()));
            row.insert(MEAN_COLUMN.to_string(), numeric(&caps["mean"]));
            row.insert(STD_DEV_COLUMN.to_string(), numeric(&caps["std"]));
            current.rows.push(row);
            continue;
        }

        let indent = line.len() - line.trim_start().len();
        while labels.last().is_some_and(|(i, _)| *i >= indent) {
            labels.pop();
        }
        labels.push((indent, line.trim().to_string()));
    }

    Ok(StatePoint { tallies })
}

/// A JSON number when the text is a finite float, otherwise the raw text.
fn numeric(text: &str) -> Value {
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(text.to_string()))
}
