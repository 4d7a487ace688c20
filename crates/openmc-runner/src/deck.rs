//! OpenMC XML input deck.
//!
//! Renders `materials.xml`, `geometry.xml`, `settings.xml` and `tallies.xml`
//! from a [`Model`]. Geometry is left empty: with `<dagmc>true</dagmc>` the
//! engine reads every volume from the DAGMC mesh in its working directory
//! and binds materials by name.

use std::path::{Path, PathBuf};

use breeder_core::artifact::write_atomic;
use breeder_core::{MaterialSet, Model, RunSettings, TallyFilter, TallySet};

use crate::error::{Result, RunnerError};

const XML_HEADER: &str = "<?xml version='1.0' encoding='utf-8'?>\n";

pub const MATERIALS_XML: &str = "materials.xml";
pub const GEOMETRY_XML: &str = "geometry.xml";
pub const SETTINGS_XML: &str = "settings.xml";
pub const TALLIES_XML: &str = "tallies.xml";

/// The four rendered input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDeck {
    pub materials: String,
    pub geometry: String,
    pub settings: String,
    pub tallies: String,
}

impl InputDeck {
    pub fn render(model: &Model) -> Result<Self> {
        Ok(Self {
            materials: render_materials(model.materials()),
            geometry: render_geometry(),
            settings: render_settings(model.settings()),
            tallies: render_tallies(model.tallies(), model.materials())?,
        })
    }

    /// `(file name, content)` pairs.
    pub fn files(&self) -> [(&'static str, &str); 4] {
        [
            (MATERIALS_XML, self.materials.as_str()),
            (GEOMETRY_XML, self.geometry.as_str()),
            (SETTINGS_XML, self.settings.as_str()),
            (TALLIES_XML, self.tallies.as_str()),
        ]
    }

    /// Write every file into `dir`, replacing existing ones.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.files()
            .into_iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                write_atomic(&path, content.as_bytes())
                    .map_err(|e| RunnerError::Deck(format!("write {}: {e}", path.display())))?;
                Ok(path)
            })
            .collect()
    }
}

pub fn render_materials(materials: &MaterialSet) -> String {
    let mut out = String::from(XML_HEADER);
    out.push_str("<materials>\n");
    for (id, material) in materials.iter() {
        out.push_str(&format!(
            "  <material id=\"{id}\" name=\"{}\">\n",
            escape(material.name())
        ));
        out.push_str(&format!(
            "    <density units=\"g/cm3\" value=\"{:?}\"/>\n",
            material.density()
        ));
        let attr = material.basis().engine_attr();
        for n in material.nuclides() {
            out.push_str(&format!(
                "    <nuclide name=\"{}\" {attr}=\"{:?}\"/>\n",
                escape(&n.nuclide),
                n.fraction
            ));
        }
        out.push_str("  </material>\n");
    }
    out.push_str("</materials>\n");
    out
}

/// An empty root universe.
pub fn render_geometry() -> String {
    format!("{XML_HEADER}<geometry/>\n")
}

pub fn render_settings(settings: &RunSettings) -> String {
    let source = settings.source();
    let mut source_attrs = format!("library=\"{}\"", escape(&source.library.display().to_string()));
    if let Some(params) = &source.parameters {
        source_attrs.push_str(&format!(" parameters=\"{}\"", escape(params)));
    }

    let mut out = String::from(XML_HEADER);
    out.push_str("<settings>\n");
    out.push_str(&format!(
        "  <run_mode>{}</run_mode>\n",
        settings.run_mode().engine_name()
    ));
    out.push_str(&format!("  <particles>{}</particles>\n", settings.particles()));
    out.push_str(&format!("  <batches>{}</batches>\n", settings.batches()));
    out.push_str(&format!("  <inactive>{}</inactive>\n", settings.inactive()));
    out.push_str(&format!("  <source {source_attrs}/>\n"));
    if settings.dagmc() {
        out.push_str("  <dagmc>true</dagmc>\n");
    }
    out.push_str("  <output>\n    <tallies>true</tallies>\n  </output>\n");
    out.push_str("</settings>\n");
    out
}

/// Filters are numbered globally in tally order; material filter bins are
/// translated to material ids.
pub fn render_tallies(tallies: &TallySet, materials: &MaterialSet) -> Result<String> {
    let mut filters = String::new();
    let mut body = String::new();
    let mut filter_id = 0u32;

    for (id, tally) in tallies.iter() {
        let mut filter_ids = Vec::new();
        for filter in tally.filters() {
            filter_id += 1;
            let bins = match filter {
                TallyFilter::Cell(cells) => cells.iter().map(u32::to_string).collect::<Vec<_>>(),
                TallyFilter::Material(names) => names
                    .iter()
                    .map(|name| {
                        materials.id_of(name).map(|id| id.to_string()).ok_or_else(|| {
                            RunnerError::Deck(format!(
                                "tally {} filters on unknown material {name}",
                                tally.name()
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            };
            filters.push_str(&format!(
                "  <filter id=\"{filter_id}\" type=\"{}\">\n    <bins>{}</bins>\n  </filter>\n",
                filter.kind(),
                bins.join(" ")
            ));
            filter_ids.push(filter_id.to_string());
        }

        body.push_str(&format!(
            "  <tally id=\"{id}\" name=\"{}\">\n",
            escape(tally.name())
        ));
        if !filter_ids.is_empty() {
            body.push_str(&format!("    <filters>{}</filters>\n", filter_ids.join(" ")));
        }
        let scores = tally
            .scores()
            .iter()
            .map(|s| escape(s.as_str()))
            .collect::<Vec<_>>()
            .join(" ");
        body.push_str(&format!("    <scores>{scores}</scores>\n"));
        body.push_str("  </tally>\n");
    }

    Ok(format!("{XML_HEADER}<tallies>\n{filters}{body}</tallies>\n"))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
