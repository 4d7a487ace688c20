//! Run configuration, read from TOML.
//!
//! Every field has a default; an empty file (or no file) describes the
//! reference run: a 90 % Li-6 enriched Li4SiO4 / eurofer / copper blanket
//! on a DAGMC mesh, 10 batches of 1000 particles, one `TBR` tally.
//!
//! ```toml
//! [[materials]]
//! name = "Li4SiO4"
//! enrichment = 90.0
//!
//! [source]
//! elongation = 2.9
//! minor_radius = 1.118
//! major_radius = 1.9
//! triangularity = 0.55
//!
//! [settings]
//! batches = 10
//! particles = 1000
//!
//! [output]
//! publish_dir = "/my_openmc_workshop"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BreederError, Result};
use crate::geometry::DAGMC_FILE_NAME;
use crate::material::MaterialRequest;
use crate::settings::{RunMode, DEFAULT_BATCHES, DEFAULT_PARTICLES};
use crate::source::{PlasmaProfile, PlasmaShape, PlasmaSource};
use crate::tally::{TallySpec, TBR_TALLY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub materials: Vec<MaterialRequest>,
    /// JSON catalog overlaid on the built-in materials.
    pub material_catalog: Option<PathBuf>,
    pub geometry: GeometrySection,
    pub source: SourceSection,
    pub settings: SettingsSection,
    pub tallies: Vec<TallySpec>,
    pub output: OutputSection,
    pub engine: EngineSection,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            materials: vec![
                MaterialRequest::enriched("Li4SiO4", 90.0),
                MaterialRequest::new("eurofer"),
                MaterialRequest::new("copper"),
            ],
            material_catalog: None,
            geometry: GeometrySection::default(),
            source: SourceSection::default(),
            settings: SettingsSection::default(),
            tallies: vec![TallySpec::default()],
            output: OutputSection::default(),
            engine: EngineSection::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| BreederError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BreederError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Where the summary copy goes, if anywhere.
    pub fn publish_target(&self) -> Option<&Path> {
        if self.output.publish {
            self.output.publish_dir.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeometrySection {
    pub mesh: PathBuf,
}

impl Default for GeometrySection {
    fn default() -> Self {
        Self {
            mesh: PathBuf::from(DAGMC_FILE_NAME),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSection {
    pub elongation: f64,
    pub minor_radius: f64,
    pub major_radius: f64,
    pub triangularity: f64,
    pub profile: PlasmaProfile,
    /// Where the source artifact is written.
    pub artifact: PathBuf,
    /// Generic sampler library used when no build command is configured.
    pub sampler_library: PathBuf,
    /// Command that builds a shared library at `{artifact}`.
    pub build_command: Option<Vec<String>>,
}

impl Default for SourceSection {
    fn default() -> Self {
        Self {
            elongation: 2.9,
            minor_radius: 1.118,
            major_radius: 1.9,
            triangularity: 0.55,
            profile: PlasmaProfile::default(),
            artifact: PathBuf::from("my_custom_plasma_source.so"),
            sampler_library: PathBuf::from("source_sampling.so"),
            build_command: None,
        }
    }
}

impl SourceSection {
    pub fn plasma(&self) -> PlasmaSource {
        PlasmaSource {
            shape: PlasmaShape {
                elongation: self.elongation,
                minor_radius: self.minor_radius,
                major_radius: self.major_radius,
                triangularity: self.triangularity,
            },
            profile: self.profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsSection {
    pub batches: u32,
    pub inactive: u32,
    pub particles: u64,
    pub run_mode: RunMode,
    pub dagmc: bool,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            batches: DEFAULT_BATCHES,
            inactive: 0,
            particles: DEFAULT_PARTICLES,
            run_mode: RunMode::FixedSource,
            dagmc: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    /// Tally reduced into the summary.
    pub tally: String,
    pub summary: PathBuf,
    pub publish: bool,
    pub publish_dir: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            tally: TBR_TALLY.to_string(),
            summary: PathBuf::from("cad_simulation_results.json"),
            publish: true,
            publish_dir: Some(PathBuf::from("/my_openmc_workshop")),
            manifest: Some(PathBuf::from("run_manifest.json")),
        }
    }
}

/// External engine invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSection {
    pub executable: PathBuf,
    /// Extra arguments placed before the engine's own flags.
    pub args: Vec<String>,
    /// Directory holding the input deck and engine outputs.
    pub working_dir: PathBuf,
    pub threads: Option<u32>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("openmc"),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            threads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_reference_run() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.materials.len(), 3);
        assert_eq!(config.materials[0].enrichment, Some(90.0));
        assert_eq!(config.settings.batches, 10);
        assert_eq!(config.settings.particles, 1000);
        assert_eq!(config.source.elongation, 2.9);
        assert_eq!(config.tallies[0].scores, vec!["(n,Xt)".to_string()]);
        assert_eq!(config.publish_target(), Some(Path::new("/my_openmc_workshop")));
    }

    #[test]
    fn partial_file_overrides() {
        let config = RunConfig::from_toml_str(
            r#"
            [[materials]]
            name = "Pb84.2Li15.8"
            enrichment = 60.0

            [settings]
            batches = 20
            particles = 5000
            run_mode = "fixed-source"

            [source]
            elongation = 1.7

            [source.profile]
            ion_temperature_origin = 40.0

            [output]
            publish = false

            [engine]
            threads = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.materials, vec![MaterialRequest::enriched("Pb84.2Li15.8", 60.0)]);
        assert_eq!(config.settings.batches, 20);
        assert_eq!(config.settings.inactive, 0);
        assert_eq!(config.source.elongation, 1.7);
        assert_eq!(config.source.minor_radius, 1.118);
        assert_eq!(config.source.profile.ion_temperature_origin, 40.0);
        assert_eq!(config.source.profile.ion_temperature_pedestal, 6.09);
        assert_eq!(config.publish_target(), None);
        assert_eq!(config.engine.threads, Some(8));
        assert_eq!(config.engine.executable, PathBuf::from("openmc"));
    }

    #[test]
    fn unknown_keys_rejected() {
        let err = RunConfig::from_toml_str("[settings]\nbatchez = 3\n").unwrap_err();
        assert!(matches!(err, BreederError::Config(_)));
    }

    #[test]
    fn tally_filters_from_toml() {
        let config = RunConfig::from_toml_str(
            r#"
            [[tallies]]
            name = "TBR"
            scores = ["(n,Xt)"]
            filters = [{ type = "material", bins = ["Li4SiO4"] }]
            "#,
        )
        .unwrap();
        let tally = config.tallies[0].build().unwrap();
        assert_eq!(tally.filters().len(), 1);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = RunConfig::load(Path::new("/nonexistent/tbr.toml")).unwrap_err();
        assert!(matches!(err, BreederError::Config(_)));
    }
}
