//! Geometry binding: an empty container pointing at an externally authored mesh.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// File name the engine looks for when DAGMC geometry is enabled.
pub const DAGMC_FILE_NAME: &str = "dagmc.h5m";

/// Handle to a CAD-derived DAGMC mesh. No geometry is built here and the
/// file is not checked; a missing or malformed mesh surfaces when the
/// engine loads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    mesh: PathBuf,
}

impl Geometry {
    /// Bind a mesh file.
    pub fn dagmc(mesh: impl Into<PathBuf>) -> Self {
        Self { mesh: mesh.into() }
    }

    /// Path of the mesh as configured.
    pub fn mesh(&self) -> &Path {
        &self.mesh
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::dagmc(DAGMC_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_does_not_touch_the_filesystem() {
        let geometry = Geometry::dagmc("/definitely/not/here.h5m");
        assert_eq!(geometry.mesh(), Path::new("/definitely/not/here.h5m"));
    }

    #[test]
    fn default_mesh_name() {
        assert_eq!(Geometry::default().mesh(), Path::new(DAGMC_FILE_NAME));
    }
}
