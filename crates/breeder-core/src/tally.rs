//! Tally requests: named sets of reaction scores with optional filters.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BreederError, Result};

/// Score identifiers the engine accepts.
pub const SCORE_VOCABULARY: &[&str] = &[
    "flux",
    "total",
    "scatter",
    "elastic",
    "absorption",
    "fission",
    "nu-fission",
    "kappa-fission",
    "heating",
    "heating-local",
    "damage-energy",
    "current",
    "events",
    "H1-production",
    "H2-production",
    "H3-production",
    "He3-production",
    "He4-production",
    "(n,gamma)",
    "(n,2n)",
    "(n,3n)",
    "(n,p)",
    "(n,d)",
    "(n,t)",
    "(n,a)",
    "(n,Xp)",
    "(n,Xd)",
    "(n,Xt)",
    "(n,X3He)",
    "(n,Xa)",
];

/// Wildcard tritium production; also counts (n,n't) and similar channels.
pub const TRITIUM_PRODUCTION: &str = "(n,Xt)";

/// Name of the breeding-ratio tally.
pub const TBR_TALLY: &str = "TBR";

/// A score from [`SCORE_VOCABULARY`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Score(String);

impl Score {
    pub fn parse(raw: &str) -> Result<Self> {
        if SCORE_VOCABULARY.contains(&raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(BreederError::InvalidTally(format!("unknown score {raw:?}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Restricts where a tally scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "bins", rename_all = "snake_case")]
pub enum TallyFilter {
    /// Engine cell ids (DAGMC volume ids).
    Cell(Vec<u32>),
    /// Material names from the model's material set.
    Material(Vec<String>),
}

impl TallyFilter {
    pub fn kind(&self) -> &'static str {
        match self {
            TallyFilter::Cell(_) => "cell",
            TallyFilter::Material(_) => "material",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            TallyFilter::Cell(bins) => bins.is_empty(),
            TallyFilter::Material(bins) => bins.is_empty(),
        }
    }
}

/// A validated tally request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tally {
    name: String,
    scores: Vec<Score>,
    filters: Vec<TallyFilter>,
}

impl Tally {
    /// Build a tally; at least one score is required.
    pub fn new<S: AsRef<str>>(name: impl Into<String>, scores: impl IntoIterator<Item = S>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BreederError::InvalidTally("tally name is empty".to_string()));
        }
        let scores = scores
            .into_iter()
            .map(|s| Score::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        if scores.is_empty() {
            return Err(BreederError::InvalidTally(format!(
                "tally {name} requests no scores"
            )));
        }
        Ok(Self {
            name,
            scores,
            filters: Vec::new(),
        })
    }

    /// The breeding-ratio tally: `TBR` scoring `(n,Xt)` everywhere.
    pub fn tbr() -> Self {
        Self {
            name: TBR_TALLY.to_string(),
            scores: vec![Score(TRITIUM_PRODUCTION.to_string())],
            filters: Vec::new(),
        }
    }

    pub fn with_filter(mut self, filter: TallyFilter) -> Result<Self> {
        if filter.is_empty() {
            return Err(BreederError::InvalidTally(format!(
                "tally {} has an empty {} filter",
                self.name,
                filter.kind()
            )));
        }
        self.filters.push(filter);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    pub fn filters(&self) -> &[TallyFilter] {
        &self.filters
    }
}

/// Tally request as written in a run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallySpec {
    pub name: String,
    pub scores: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<TallyFilter>,
}

impl TallySpec {
    pub fn build(&self) -> Result<Tally> {
        self.filters
            .iter()
            .cloned()
            .try_fold(Tally::new(self.name.clone(), &self.scores)?, Tally::with_filter)
    }
}

impl Default for TallySpec {
    fn default() -> Self {
        Self {
            name: TBR_TALLY.to_string(),
            scores: vec![TRITIUM_PRODUCTION.to_string()],
            filters: Vec::new(),
        }
    }
}

/// Tallies with unique names and engine ids `1..=n`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallySet {
    tallies: Vec<Tally>,
}

impl TallySet {
    pub fn new(tallies: Vec<Tally>) -> Result<Self> {
        if tallies.is_empty() {
            return Err(BreederError::InvalidTally(
                "at least one tally is required".to_string(),
            ));
        }
        let mut seen = std::collections::BTreeSet::new();
        for t in &tallies {
            if !seen.insert(t.name.as_str()) {
                return Err(BreederError::InvalidTally(format!(
                    "duplicate tally name {}",
                    t.name
                )));
            }
        }
        Ok(Self { tallies })
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Tally)> {
        self.tallies
            .iter()
            .enumerate()
            .map(|(i, t)| (i as u32 + 1, t))
    }

    pub fn get(&self, name: &str) -> Option<&Tally> {
        self.tallies.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}
