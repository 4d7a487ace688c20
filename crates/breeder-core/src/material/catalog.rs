//! Material database: named compositions the resolver expands into nuclides.
//!
//! The built-in catalog covers the breeder, structural and coolant
//! materials of common fusion blanket studies. A JSON catalog file can
//! extend it or override entries by name.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::nuclides::{element_of, mass_number, natural_isotopes};
use crate::error::{BreederError, Result};

/// How component amounts in a catalog entry are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractionBasis {
    /// Atom (number) fractions.
    Atom,
    /// Weight (mass) fractions.
    Weight,
}

impl FractionBasis {
    /// Attribute name the engine uses for this basis.
    pub fn engine_attr(&self) -> &'static str {
        match self {
            FractionBasis::Atom => "ao",
            FractionBasis::Weight => "wo",
        }
    }
}

/// A named composition as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,

    /// Mass density in g/cm3.
    pub density: f64,

    pub basis: FractionBasis,

    /// Element symbols (`"Li"`) or nuclide names (`"Li6"`) to amounts in `basis`.
    pub components: BTreeMap<String, f64>,

    /// Nuclide whose share of its element is set by the requested enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_target: Option<String>,
}

impl CatalogEntry {
    fn new(
        name: &str,
        density: f64,
        basis: FractionBasis,
        components: &[(&str, f64)],
        enrichment_target: Option<&str>,
    ) -> Self {
        Self {
            name: name.to_string(),
            density,
            basis,
            components: components
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            enrichment_target: enrichment_target.map(str::to_string),
        }
    }

    /// Check the entry is internally consistent and only uses tabulated elements.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| {
            Err(BreederError::InvalidCatalog(format!(
                "{}: {}",
                self.name, reason
            )))
        };

        if self.name.trim().is_empty() {
            return invalid("empty material name".to_string());
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return invalid(format!("density must be positive, got {}", self.density));
        }
        if self.components.is_empty() {
            return invalid("no components".to_string());
        }
        for (component, amount) in &self.components {
            if !(amount.is_finite() && *amount > 0.0) {
                return invalid(format!("component {component} has amount {amount}"));
            }
            let element = element_of(component);
            if natural_isotopes(element).is_none() {
                return invalid(format!("unknown element {element}"));
            }
        }
        if let Some(target) = &self.enrichment_target {
            let element = element_of(target);
            let tabulated = natural_isotopes(element)
                .map(|isotopes| isotopes.iter().any(|(n, _)| n == target))
                .unwrap_or(false);
            if mass_number(target).is_none() || !tabulated {
                return invalid(format!("enrichment target {target} is not a known nuclide"));
            }
            if !self.components.contains_key(element) {
                return invalid(format!(
                    "enrichment target {target} but element {element} is not a component"
                ));
            }
        }
        Ok(())
    }
}

/// Lookup service the material resolver draws from.
pub trait MaterialDatabase: Send + Sync {
    /// Entry for an exact (case-sensitive) material name.
    fn lookup(&self, name: &str) -> Option<&CatalogEntry>;

    /// All material names, sorted.
    fn names(&self) -> Vec<String>;
}

#[derive(Deserialize)]
struct CatalogFile {
    materials: Vec<CatalogEntry>,
}

/// In-memory material catalog.
#[derive(Debug, Clone, Default)]
pub struct MaterialCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl MaterialCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in fusion materials.
    pub fn builtin() -> Self {
        use FractionBasis::{Atom, Weight};

        let entries = [
            CatalogEntry::new(
                "Li4SiO4",
                2.32,
                Atom,
                &[("Li", 4.0), ("Si", 1.0), ("O", 4.0)],
                Some("Li6"),
            ),
            CatalogEntry::new(
                "Li2TiO3",
                3.43,
                Atom,
                &[("Li", 2.0), ("Ti", 1.0), ("O", 3.0)],
                Some("Li6"),
            ),
            CatalogEntry::new("Li2O", 2.013, Atom, &[("Li", 2.0), ("O", 1.0)], Some("Li6")),
            CatalogEntry::new(
                "Pb84.2Li15.8",
                9.4,
                Atom,
                &[("Pb", 84.2), ("Li", 15.8)],
                Some("Li6"),
            ),
            CatalogEntry::new("lithium", 0.534, Atom, &[("Li", 1.0)], Some("Li6")),
            CatalogEntry::new(
                "FLiBe",
                1.94,
                Atom,
                &[("Li", 2.0), ("Be", 1.0), ("F", 4.0)],
                Some("Li6"),
            ),
            CatalogEntry::new(
                "eurofer",
                7.78,
                Weight,
                &[
                    ("Fe", 89.07),
                    ("Cr", 9.0),
                    ("W", 1.1),
                    ("Mn", 0.4),
                    ("V", 0.2),
                    ("Ta", 0.12),
                    ("C", 0.11),
                ],
                None,
            ),
            CatalogEntry::new(
                "SS316L",
                8.0,
                Weight,
                &[
                    ("Fe", 65.72),
                    ("Cr", 17.0),
                    ("Ni", 12.0),
                    ("Mo", 2.5),
                    ("Mn", 2.0),
                    ("Si", 0.75),
                    ("C", 0.03),
                ],
                None,
            ),
            CatalogEntry::new("copper", 8.96, Atom, &[("Cu", 1.0)], None),
            CatalogEntry::new("tungsten", 19.3, Atom, &[("W", 1.0)], None),
            CatalogEntry::new("beryllium", 1.85, Atom, &[("Be", 1.0)], None),
            CatalogEntry::new("water", 1.0, Atom, &[("H", 2.0), ("O", 1.0)], None),
        ];

        let mut catalog = Self::new();
        for entry in entries {
            catalog.entries.insert(entry.name.clone(), entry);
        }
        catalog
    }

    /// Parse a JSON catalog: `{"materials": [CatalogEntry, ...]}`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| BreederError::InvalidCatalog(e.to_string()))?;

        let mut catalog = Self::new();
        for entry in file.materials {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Load a JSON catalog file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        debug!(path = %path.display(), count = catalog.entries.len(), "loaded material catalog");
        Ok(catalog)
    }

    /// Add or replace an entry after validating it.
    pub fn insert(&mut self, entry: CatalogEntry) -> Result<()> {
        entry.validate()?;
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Overlay `other` on this catalog; entries in `other` win on name clashes.
    pub fn extend(&mut self, other: MaterialCatalog) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MaterialDatabase for MaterialCatalog {
    fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_entries_validate() {
        let catalog = MaterialCatalog::builtin();
        for name in catalog.names() {
            catalog.lookup(&name).unwrap().validate().unwrap();
        }
        assert!(catalog.lookup("Li4SiO4").is_some());
        assert!(catalog.lookup("eurofer").is_some());
        assert!(catalog.lookup("copper").is_some());
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let catalog = MaterialCatalog::builtin();
        assert!(catalog.lookup("Copper").is_none());
    }

    #[test]
    fn json_catalog_overrides_builtin() {
        let raw = r#"{
            "materials": [
                {
                    "name": "copper",
                    "density": 8.9,
                    "basis": "atom",
                    "components": {"Cu63": 1.0}
                }
            ]
        }"#;
        let mut catalog = MaterialCatalog::builtin();
        catalog.extend(MaterialCatalog::from_json_str(raw).unwrap());

        let copper = catalog.lookup("copper").unwrap();
        assert_eq!(copper.density, 8.9);
        assert!(copper.components.contains_key("Cu63"));
    }

    #[test]
    fn json_catalog_rejects_unknown_element() {
        let raw = r#"{"materials": [{"name": "x", "density": 1.0, "basis": "atom", "components": {"Zz": 1.0}}]}"#;
        let err = MaterialCatalog::from_json_str(raw).unwrap_err();
        assert!(matches!(err, BreederError::InvalidCatalog(_)));
    }

    #[test]
    fn enrichment_target_must_belong_to_a_component() {
        let entry = CatalogEntry::new("bad", 1.0, FractionBasis::Atom, &[("O", 1.0)], Some("Li6"));
        assert!(entry.validate().is_err());
    }
}
