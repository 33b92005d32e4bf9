//! edea - KiCad 6 file parser, schematic merger and metadata extractor
//!
//! This library reads KiCad S-expression files into a generic expression
//! tree or a strictly validated schematic model, computes board geometry,
//! merges several projects into one hierarchical schematic and extracts
//! BOM metadata from a project's sheet hierarchy.
//!
//! # Quick Start
//!
//! ```no_run
//! use edea::Project;
//! use std::path::Path;
//!
//! let mut project = Project::from_path(Path::new("ldo/ldo.kicad_pro")).unwrap();
//! project.parse().unwrap();
//!
//! let meta = project.metadata().unwrap();
//! println!("{} parts, {} unique", meta.count_part, meta.count_unique);
//! ```
//!
//! # Features
//!
//! - **Expression tree**: lossless read/write of `.kicad_sch` and `.kicad_pcb`
//! - **Typed schematic**: every KiCad 6 item, unknown fields rejected
//! - **Board geometry**: pad outlines and footprint bounding boxes
//! - **Merging**: projects placed as sub-sheets of a new top-level sheet

pub mod bbox;
pub mod core;
pub mod hierarchy;
pub mod merge;
pub mod parser;
pub mod project_file;

// Re-export main types
pub use crate::core::{discover_projects, BomPart, EdeaError, Metadata, Project};
pub use bbox::BoundingBox;
pub use merge::{merge_projects, plan_instances, MergeOptions, MergeReport, SchematicDocument};
pub use parser::kicad::{KicadError, KicadParser};
pub use parser::pcb::Pcb;
pub use parser::schema::Schematic;
pub use parser::sexp::SExp;

/// Parse a schematic file (convenience wrapper).
pub fn parse_schematic(path: &std::path::Path) -> Result<Schematic, EdeaError> {
    Ok(KicadParser::parse_schematic(path)?)
}

/// Parse a PCB file (convenience wrapper).
pub fn parse_pcb(path: &std::path::Path) -> Result<Pcb, EdeaError> {
    Ok(Pcb::load(path)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BoundingBox, EdeaError, KicadParser, MergeOptions, Metadata, Pcb, Project, SExp, Schematic,
        SchematicDocument,
    };
}
