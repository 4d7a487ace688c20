//! The composed model handed to a transport engine.

use serde::Serialize;

use crate::error::{BreederError, Result};
use crate::geometry::Geometry;
use crate::material::MaterialSet;
use crate::settings::RunSettings;
use crate::tally::{TallyFilter, TallySet};

/// Geometry + materials + settings + tallies. Immutable once built and
/// consumed by value by [`TransportEngine::run`](crate::engine::TransportEngine::run).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    geometry: Geometry,
    materials: MaterialSet,
    settings: RunSettings,
    tallies: TallySet,
}

impl Model {
    /// Assemble a model. Material filters must name materials in the set.
    pub fn new(
        geometry: Geometry,
        materials: MaterialSet,
        settings: RunSettings,
        tallies: TallySet,
    ) -> Result<Self> {
        for (_, tally) in tallies.iter() {
            for filter in tally.filters() {
                if let TallyFilter::Material(names) = filter {
                    if let Some(missing) = names.iter().find(|n| materials.id_of(n).is_none()) {
                        return Err(BreederError::InvalidTally(format!(
                            "tally {} filters on material {} which is not in the model",
                            tally.name(),
                            missing
                        )));
                    }
                }
            }
        }

        Ok(Self {
            geometry,
            materials,
            settings,
            tallies,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn materials(&self) -> &MaterialSet {
        &self.materials
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn tallies(&self) -> &TallySet {
        &self.tallies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{MaterialCatalog, MaterialRequest};
    use crate::source::SourceRef;
    use crate::tally::Tally;

    fn parts() -> (Geometry, MaterialSet, RunSettings) {
        let materials = MaterialSet::resolve_all(
            &MaterialCatalog::builtin(),
            &[MaterialRequest::new("copper")],
        )
        .unwrap();
        let settings = RunSettings::fixed_source(
            10,
            1000,
            SourceRef {
                library: "source.so".into(),
                parameters: None,
            },
        )
        .unwrap();
        (Geometry::default(), materials, settings)
    }

    #[test]
    fn material_filter_must_reference_known_material() {
        let (g, m, s) = parts();
        let tally = Tally::tbr()
            .with_filter(TallyFilter::Material(vec!["eurofer".to_string()]))
            .unwrap();
        let err = Model::new(g, m, s, TallySet::new(vec![tally]).unwrap()).unwrap_err();
        assert!(err.to_string().contains("eurofer"));
    }

    #[test]
    fn model_keeps_parts() {
        let (g, m, s) = parts();
        let model = Model::new(g, m, s, TallySet::new(vec![Tally::tbr()]).unwrap()).unwrap();
        assert_eq!(model.materials().len(), 1);
        assert_eq!(model.tallies().len(), 1);
        assert_eq!(model.settings().batches(), 10);
    }
}
