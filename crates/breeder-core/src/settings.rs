//! Run settings: batches, particles, run mode, geometry mode, source.

use serde::{Deserialize, Serialize};

use crate::error::{BreederError, Result};
use crate::source::SourceRef;

pub const DEFAULT_BATCHES: u32 = 10;
pub const DEFAULT_PARTICLES: u64 = 1000;

/// Engine run modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    FixedSource,
    Eigenvalue,
    Volume,
    Plot,
    ParticleRestart,
}

impl RunMode {
    /// Spelling used in the engine's settings file.
    pub fn engine_name(&self) -> &'static str {
        match self {
            RunMode::FixedSource => "fixed source",
            RunMode::Eigenvalue => "eigenvalue",
            RunMode::Volume => "volume",
            RunMode::Plot => "plot",
            RunMode::ParticleRestart => "particle restart",
        }
    }
}

/// Validated run settings. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSettings {
    batches: u32,
    inactive: u32,
    particles: u64,
    run_mode: RunMode,
    dagmc: bool,
    source: SourceRef,
}

impl RunSettings {
    /// Fixed-source DAGMC run with no inactive batches.
    pub fn fixed_source(batches: u32, particles: u64, source: SourceRef) -> Result<Self> {
        RunSettingsBuilder::new(source)
            .batches(batches)
            .particles(particles)
            .build()
    }

    pub fn builder(source: SourceRef) -> RunSettingsBuilder {
        RunSettingsBuilder::new(source)
    }

    pub fn batches(&self) -> u32 {
        self.batches
    }

    pub fn inactive(&self) -> u32 {
        self.inactive
    }

    pub fn particles(&self) -> u64 {
        self.particles
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Whether geometry comes from a DAGMC mesh file.
    pub fn dagmc(&self) -> bool {
        self.dagmc
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }
}

/// Builder for [`RunSettings`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct RunSettingsBuilder {
    batches: u32,
    inactive: u32,
    particles: u64,
    run_mode: RunMode,
    dagmc: bool,
    source: SourceRef,
}

impl RunSettingsBuilder {
    fn new(source: SourceRef) -> Self {
        Self {
            batches: DEFAULT_BATCHES,
            inactive: 0,
            particles: DEFAULT_PARTICLES,
            run_mode: RunMode::FixedSource,
            dagmc: true,
            source,
        }
    }

    pub fn batches(mut self, batches: u32) -> Self {
        self.batches = batches;
        self
    }

    pub fn inactive(mut self, inactive: u32) -> Self {
        self.inactive = inactive;
        self
    }

    pub fn particles(mut self, particles: u64) -> Self {
        self.particles = particles;
        self
    }

    pub fn run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    pub fn dagmc(mut self, dagmc: bool) -> Self {
        self.dagmc = dagmc;
        self
    }

    pub fn build(self) -> Result<RunSettings> {
        if self.batches == 0 {
            return Err(BreederError::InvalidSettings(
                "batches must be a positive integer".to_string(),
            ));
        }
        if self.particles == 0 {
            return Err(BreederError::InvalidSettings(
                "particles must be a positive integer".to_string(),
            ));
        }
        if self.inactive >= self.batches {
            return Err(BreederError::InvalidSettings(format!(
                "inactive batches ({}) must be fewer than batches ({})",
                self.inactive, self.batches
            )));
        }

        Ok(RunSettings {
            batches: self.batches,
            inactive: self.inactive,
            particles: self.particles,
            run_mode: self.run_mode,
            dagmc: self.dagmc,
            source: self.source,
        })
    }
}
