//! Plasma neutron source: shape/profile parameters and the sampling artifact.
//!
//! The sampler itself is an external library. This module turns the
//! parameters into a loadable artifact at a configured path and hands the
//! run settings a [`SourceRef`] pointing at it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact::{absolutize, write_atomic, ArtifactDigest};
use crate::error::{BreederError, Result};

/// Cross-section shape of the plasma (lengths in metres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasmaShape {
    pub elongation: f64,
    pub minor_radius: f64,
    pub major_radius: f64,
    pub triangularity: f64,
}

/// Density and temperature profile of the plasma. Defaults follow the
/// sampling library's own defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlasmaProfile {
    /// m^-3
    pub ion_density_origin: f64,
    pub ion_density_peaking_factor: f64,
    pub ion_density_pedestal: f64,
    pub ion_density_separatrix: f64,
    /// keV
    pub ion_temperature_origin: f64,
    pub ion_temperature_peaking_factor: f64,
    pub ion_temperature_pedestal: f64,
    pub ion_temperature_separatrix: f64,
    pub ion_temperature_beta: f64,
    /// Defaults to 0.8 * minor radius.
    pub pedestal_radius: Option<f64>,
    pub shafranov_shift: f64,
    pub plasma_id: u32,
    pub number_of_bins: u32,
    /// Degrees.
    pub min_toroidal_angle: f64,
    pub max_toroidal_angle: f64,
}

impl Default for PlasmaProfile {
    fn default() -> Self {
        Self {
            ion_density_origin: 1.09e20,
            ion_density_peaking_factor: 1.0,
            ion_density_pedestal: 1.09e20,
            ion_density_separatrix: 3e19,
            ion_temperature_origin: 45.9,
            ion_temperature_peaking_factor: 8.06,
            ion_temperature_pedestal: 6.09,
            ion_temperature_separatrix: 0.1,
            ion_temperature_beta: 6.0,
            pedestal_radius: None,
            shafranov_shift: 0.44789,
            plasma_id: 1,
            number_of_bins: 100,
            min_toroidal_angle: 0.0,
            max_toroidal_angle: 360.0,
        }
    }
}

/// Parametric tokamak plasma source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlasmaSource {
    pub shape: PlasmaShape,
    #[serde(default)]
    pub profile: PlasmaProfile,
}

impl PlasmaSource {
    pub fn new(shape: PlasmaShape) -> Self {
        Self {
            shape,
            profile: PlasmaProfile::default(),
        }
    }

    /// Shape and profile checks. Physical ranges of elongation and
    /// triangularity are left to the sampler.
    pub fn validate(&self) -> Result<()> {
        let s = &self.shape;
        for (name, value) in [
            ("elongation", s.elongation),
            ("minor_radius", s.minor_radius),
            ("major_radius", s.major_radius),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BreederError::InvalidSource(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !s.triangularity.is_finite() {
            return Err(BreederError::InvalidSource(format!(
                "triangularity must be finite, got {}",
                s.triangularity
            )));
        }

        for (name, value) in self.profile_values() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BreederError::InvalidSource(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.profile.number_of_bins == 0 {
            return Err(BreederError::InvalidSource(
                "number_of_bins must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pedestal_radius(&self) -> f64 {
        self.profile
            .pedestal_radius
            .unwrap_or(0.8 * self.shape.minor_radius)
    }

    fn profile_values(&self) -> [(&'static str, f64); 12] {
        let p = &self.profile;
        [
            ("ion_density_origin", p.ion_density_origin),
            ("ion_density_peaking_factor", p.ion_density_peaking_factor),
            ("ion_density_pedestal", p.ion_density_pedestal),
            ("ion_density_separatrix", p.ion_density_separatrix),
            ("ion_temperature_origin", p.ion_temperature_origin),
            ("ion_temperature_peaking_factor", p.ion_temperature_peaking_factor),
            ("ion_temperature_pedestal", p.ion_temperature_pedestal),
            ("ion_temperature_separatrix", p.ion_temperature_separatrix),
            ("ion_temperature_beta", p.ion_temperature_beta),
            ("pedestal_radius", self.pedestal_radius()),
            ("min_toroidal_angle", p.min_toroidal_angle),
            ("max_toroidal_angle", p.max_toroidal_angle),
        ]
    }

    /// Canonical `key=value` list, fixed order, shortest round-trip floats.
    pub fn parameter_string(&self) -> String {
        let s = &self.shape;
        let p = &self.profile;
        let mut pairs = vec![
            ("major_radius", format!("{:?}", s.major_radius)),
            ("minor_radius", format!("{:?}", s.minor_radius)),
            ("elongation", format!("{:?}", s.elongation)),
            ("triangularity", format!("{:?}", s.triangularity)),
            ("shafranov_shift", format!("{:?}", p.shafranov_shift)),
        ];
        pairs.extend(
            self.profile_values()
                .into_iter()
                .map(|(k, v)| (k, format!("{v:?}"))),
        );
        pairs.push(("plasma_id", p.plasma_id.to_string()));
        pairs.push(("number_of_bins", p.number_of_bins.to_string()));

        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `PLASMA_*` environment variables carrying the same values.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.parameter_string()
            .split(", ")
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (format!("PLASMA_{}", k.to_ascii_uppercase()), v.to_string()))
            .collect()
    }
}

/// How the engine loads the source at run time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Shared library implementing the engine's custom-source interface.
    pub library: PathBuf,
    /// Opaque string handed to the library on load.
    pub parameters: Option<String>,
}

/// A written source artifact.
#[derive(Debug, Clone)]
pub struct CompiledSource {
    pub reference: SourceRef,
    pub artifact: PathBuf,
    pub digest: ArtifactDigest,
}

/// Turns plasma parameters into a loadable artifact.
#[async_trait]
pub trait SourceCompiler: Send + Sync {
    /// Write the artifact for `source` at `artifact`, replacing any previous one.
    async fn compile(&self, source: &PlasmaSource, artifact: &Path) -> Result<CompiledSource>;
}

/// Writes the canonical parameter string to the artifact path and hands the
/// same string to a pre-built generic sampler library.
///
/// The artifact is a record of the parameters, not a loadable library; only
/// a build command produces a shared object at the artifact path.
#[derive(Debug, Clone)]
pub struct ParameterFileCompiler {
    sampler_library: PathBuf,
}

impl ParameterFileCompiler {
    pub fn new(sampler_library: impl Into<PathBuf>) -> Self {
        Self {
            sampler_library: sampler_library.into(),
        }
    }
}

#[async_trait]
impl SourceCompiler for ParameterFileCompiler {
    async fn compile(&self, source: &PlasmaSource, artifact: &Path) -> Result<CompiledSource> {
        source.validate()?;

        let mut content = source.parameter_string();
        content.push('\n');
        let digest = write_atomic(artifact, content.as_bytes())?;
        let artifact = absolutize(artifact)?;

        info!(
            artifact = %artifact.display(),
            digest = %digest.short(),
            "wrote plasma source parameters"
        );

        Ok(CompiledSource {
            reference: SourceRef {
                library: absolutize(&self.sampler_library)?,
                parameters: Some(source.parameter_string()),
            },
            artifact,
            digest,
        })
    }
}
