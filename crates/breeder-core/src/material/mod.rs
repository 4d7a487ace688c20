//! Material resolver: catalog lookup and expansion into engine-ready nuclide lists.

pub mod catalog;
pub mod nuclides;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use catalog::{CatalogEntry, FractionBasis, MaterialCatalog, MaterialDatabase};

use crate::error::{BreederError, Result};
use nuclides::{element_of, mass_number, natural_isotopes};

/// A material as requested by the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequest {
    pub name: String,

    /// Atom percent of the enrichment target nuclide (Li-6 for lithium compounds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<f64>,
}

impl MaterialRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enrichment: None,
        }
    }

    pub fn enriched(name: impl Into<String>, enrichment: f64) -> Self {
        Self {
            name: name.into(),
            enrichment: Some(enrichment),
        }
    }
}

/// One nuclide of a resolved material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NuclideFraction {
    pub nuclide: String,
    pub fraction: f64,
}

/// A fully resolved material. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    name: String,
    enrichment: Option<f64>,
    density: f64,
    basis: FractionBasis,
    nuclides: Vec<NuclideFraction>,
}

impl Material {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn enrichment(&self) -> Option<f64> {
        self.enrichment
    }

    /// Mass density in g/cm3.
    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn basis(&self) -> FractionBasis {
        self.basis
    }

    /// Nuclides sorted by name, fractions normalized to 1.
    pub fn nuclides(&self) -> &[NuclideFraction] {
        &self.nuclides
    }

    /// Fraction of one nuclide, zero if absent.
    pub fn fraction_of(&self, nuclide: &str) -> f64 {
        self.nuclides
            .iter()
            .find(|n| n.nuclide == nuclide)
            .map(|n| n.fraction)
            .unwrap_or(0.0)
    }
}

/// Resolve a material request against a database.
///
/// Deterministic: identical requests against the same database produce
/// identical materials.
pub fn resolve(db: &dyn MaterialDatabase, request: &MaterialRequest) -> Result<Material> {
    let entry = db
        .lookup(&request.name)
        .ok_or_else(|| BreederError::UnknownMaterial(request.name.clone()))?;

    if let Some(value) = request.enrichment {
        if !(value.is_finite() && (0.0..=100.0).contains(&value)) {
            return Err(BreederError::EnrichmentOutOfRange {
                material: request.name.clone(),
                value,
            });
        }
        if entry.enrichment_target.is_none() {
            return Err(BreederError::EnrichmentNotApplicable(request.name.clone()));
        }
    }

    let target = entry
        .enrichment_target
        .as_deref()
        .zip(request.enrichment.map(|e| e / 100.0));

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (component, amount) in &entry.components {
        let isotopes = isotopes_of(component, target)?;

        match entry.basis {
            FractionBasis::Atom => {
                for (nuclide, share) in isotopes {
                    *totals.entry(nuclide).or_insert(0.0) += amount * share;
                }
            }
            FractionBasis::Weight => {
                let molar: f64 = isotopes
                    .iter()
                    .map(|(n, share)| share * f64::from(mass_number(n).unwrap_or(1)))
                    .sum();
                for (nuclide, share) in isotopes {
                    let mass = f64::from(mass_number(&nuclide).unwrap_or(1));
                    *totals.entry(nuclide).or_insert(0.0) += amount * share * mass / molar;
                }
            }
        }
    }

    totals.retain(|_, f| *f > 0.0);
    let sum: f64 = totals.values().sum();
    let nuclides = totals
        .into_iter()
        .map(|(nuclide, f)| NuclideFraction {
            nuclide,
            fraction: f / sum,
        })
        .collect::<Vec<_>>();

    debug!(
        material = %entry.name,
        enrichment = ?request.enrichment,
        nuclides = nuclides.len(),
        "resolved material"
    );

    Ok(Material {
        name: entry.name.clone(),
        enrichment: request.enrichment,
        density: entry.density,
        basis: entry.basis,
        nuclides,
    })
}

/// Isotopic split of one catalog component, honouring an enrichment target.
fn isotopes_of(component: &str, target: Option<(&str, f64)>) -> Result<Vec<(String, f64)>> {
    if mass_number(component).is_some() {
        return Ok(vec![(component.to_string(), 1.0)]);
    }

    let natural = natural_isotopes(component).ok_or_else(|| {
        BreederError::InvalidCatalog(format!("unknown element {component}"))
    })?;

    match target {
        Some((nuclide, share)) if element_of(nuclide) == component => {
            let rest: f64 = natural
                .iter()
                .filter(|(n, _)| *n != nuclide)
                .map(|(_, a)| a)
                .sum();
            Ok(natural
                .iter()
                .map(|(n, a)| {
                    let f = if *n == nuclide {
                        share
                    } else {
                        (1.0 - share) * a / rest
                    };
                    (n.to_string(), f)
                })
                .collect())
        }
        _ => Ok(natural.iter().map(|(n, a)| (n.to_string(), *a)).collect()),
    }
}

/// Ordered materials with engine ids `1..=n`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialSet {
    materials: Vec<Material>,
}

impl MaterialSet {
    /// Build from resolved materials; names must be unique.
    pub fn new(materials: Vec<Material>) -> Result<Self> {
        let mut seen = std::collections::BTreeSet::new();
        for m in &materials {
            if !seen.insert(m.name.as_str()) {
                return Err(BreederError::DuplicateMaterial(m.name.clone()));
            }
        }
        Ok(Self { materials })
    }

    /// Resolve each request in order.
    pub fn resolve_all(db: &dyn MaterialDatabase, requests: &[MaterialRequest]) -> Result<Self> {
        let materials = requests
            .iter()
            .map(|r| resolve(db, r))
            .collect::<Result<Vec<_>>>()?;
        Self::new(materials)
    }

    /// `(engine id, material)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (i as u32 + 1, m))
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.iter().find(|(_, m)| m.name == name).map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
