//! Project loading and metadata extraction shared by the library and CLI.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::hierarchy::{SheetEdge, SheetHierarchy};
use crate::parser::kicad::{KicadError, KicadParser};
use crate::parser::pcb::PcbError;
use crate::parser::schema::{Schematic, SymbolPlaced};

#[derive(Debug, thiserror::Error)]
pub enum EdeaError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Kicad(#[from] KicadError),
    #[error(transparent)]
    Pcb(#[from] PcbError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Sheet hierarchy error: {0}")]
    Hierarchy(String),
    #[error("{} doesn't point to a KiCad project file or project directory", .0.display())]
    InvalidProject(PathBuf),
    #[error("Output path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("{} would be overwritten by the merged top-level schematic", .0.display())]
    NameClash(PathBuf),
    #[error("{0}")]
    Other(String),
}

/// Last path component of a directory, resolving `.` and friends.
pub(crate) fn dir_name(dir: &Path) -> Option<String> {
    let name = match dir.file_name() {
        Some(name) => name.to_os_string(),
        None => std::fs::canonicalize(dir).ok()?.file_name()?.to_os_string(),
    };
    name.into_string().ok()
}

/// Parts with the same key count once towards `count_unique`.
fn unique_key(symbol: &SymbolPlaced) -> String {
    if let Some(mpn) = symbol.property("MPN") {
        return mpn.to_string();
    }
    if let Some(lcsc) = symbol.property("LCSC") {
        return lcsc.to_string();
    }
    format!(
        "{}{}",
        symbol.property("Value").unwrap_or_default(),
        symbol.property("Footprint").unwrap_or_default()
    )
}

/// One BOM line: every property of the symbol plus its references.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BomPart {
    #[serde(flatten)]
    pub properties: BTreeMap<String, String>,
    #[serde(rename = "Reference")]
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    /// Placed parts, counted once per sheet instance.
    pub count_part: usize,
    pub count_unique: usize,
    /// symbol uuid -> BOM line
    pub parts: BTreeMap<String, BomPart>,
    /// Sheets including every instance of a reused sub-sheet.
    pub sheets: usize,
    /// Seconds spent in [`Project::parse`].
    pub parse_time: f64,
}

/// A KiCad project rooted at its top-level schematic.
#[derive(Debug, Clone)]
pub struct Project {
    root_schematic: PathBuf,
    hierarchy: SheetHierarchy,
    /// symbol uuid -> references of all its instances
    symbol_instances: BTreeMap<String, Vec<String>>,
    parse_time: f64,
}

impl Project {
    pub fn new(root_schematic: impl Into<PathBuf>) -> Self {
        Self {
            root_schematic: root_schematic.into(),
            hierarchy: SheetHierarchy::new(),
            symbol_instances: BTreeMap::new(),
            parse_time: 0.0,
        }
    }

    /// Accepts a `.kicad_pro` file, a project directory or a `.kicad_sch` file.
    pub fn from_path(path: &Path) -> Result<Self, EdeaError> {
        Ok(Self::new(resolve_root_schematic(path)?))
    }

    pub fn root_schematic(&self) -> &Path {
        &self.root_schematic
    }

    pub fn hierarchy(&self) -> &SheetHierarchy {
        &self.hierarchy
    }

    pub fn schematic(&self, file_name: &str) -> Option<&Schematic> {
        self.hierarchy.schematic(file_name)
    }

    pub fn references(&self, symbol_uuid: &str) -> Option<&[String]> {
        self.symbol_instances.get(symbol_uuid).map(Vec::as_slice)
    }

    /// Load the root schematic and every sub-sheet it places.
    pub fn parse(&mut self) -> Result<(), EdeaError> {
        let started = Instant::now();
        let root = KicadParser::parse_schematic(&self.root_schematic)?;

        let mut symbol_instances: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for instance in &root.symbol_instances.path {
            // virtual symbols such as power flags
            if instance.reference.starts_with('#') {
                continue;
            }
            let Some(symbol_id) = instance.path.split('/').filter(|s| !s.is_empty()).last() else {
                warn!("Symbol instance with empty path skipped");
                continue;
            };
            symbol_instances
                .entry(symbol_id.to_string())
                .or_default()
                .push(instance.reference.clone());
        }

        let dir = self
            .root_schematic
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let root_name = file_name_of(&self.root_schematic);

        let mut hierarchy = SheetHierarchy::new();
        let root_idx = hierarchy.add_sheet(&root_name, root);
        let mut pending = vec![root_idx];

        while let Some(idx) = pending.pop() {
            let placements: Vec<(SheetEdge, String)> = match hierarchy.node(idx) {
                Some(node) => node
                    .schematic
                    .sheet
                    .iter()
                    .map(|sheet| {
                        let file = sheet.sheet_file().ok_or_else(|| {
                            EdeaError::Parse(format!(
                                "Sheet {} in {} has no \"Sheet file\" property",
                                sheet.uuid, node.file_name
                            ))
                        })?;
                        let edge = SheetEdge {
                            sheet_uuid: sheet.uuid,
                            sheet_name: sheet.sheet_name().unwrap_or_default().to_string(),
                        };
                        Ok((edge, file.to_string()))
                    })
                    .collect::<Result<_, EdeaError>>()?,
                None => Vec::new(),
            };

            for (edge, file) in placements {
                let key = file_name_of(Path::new(&file));
                let child = match hierarchy.index_of(&key) {
                    Some(child) => child,
                    None => {
                        debug!("Reading sub-sheet {}", file);
                        let sub = KicadParser::parse_schematic(&dir.join(&file))?;
                        let child = hierarchy.add_sheet(&key, sub);
                        pending.push(child);
                        child
                    }
                };
                hierarchy.add_instance(idx, child, edge);
            }
        }

        hierarchy.check_acyclic()?;

        self.parse_time = started.elapsed().as_secs_f64();
        info!(
            "Parsed {} with {} schematic files in {:.3}s",
            root_name,
            hierarchy.file_count(),
            self.parse_time
        );
        self.hierarchy = hierarchy;
        self.symbol_instances = symbol_instances;
        Ok(())
    }

    /// BOM and sheet statistics over the whole hierarchy.
    pub fn metadata(&self) -> Result<Metadata, EdeaError> {
        if self.hierarchy.root().is_none() {
            return Err(EdeaError::Other(
                "Project has not been parsed yet".to_string(),
            ));
        }

        let mut sheets = 0;
        let mut placed: Vec<&SymbolPlaced> = Vec::new();
        self.hierarchy.walk_instances(|node, _path| {
            sheets += 1;
            placed.extend(node.schematic.symbol.iter().filter(|sym| {
                let is_virtual = sym.reference().is_some_and(|r| r.starts_with('#'));
                !is_virtual && sym.in_bom
            }));
        });

        let unique: BTreeSet<String> = placed.iter().map(|sym| unique_key(sym)).collect();

        let mut parts = BTreeMap::new();
        for sym in &placed {
            let uuid = sym.uuid.to_string();
            let references = match self.symbol_instances.get(&uuid) {
                Some(refs) => refs.clone(),
                None => sym.reference().map(|r| vec![r.to_string()]).unwrap_or_default(),
            };
            let properties = sym
                .property
                .iter()
                .filter(|p| p.key != "Reference")
                .map(|p| (p.key.clone(), p.value.clone()))
                .collect();
            parts.insert(
                uuid,
                BomPart {
                    properties,
                    references,
                },
            );
        }

        Ok(Metadata {
            count_part: placed.len(),
            count_unique: unique.len(),
            parts,
            sheets,
            parse_time: self.parse_time,
        })
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn resolve_root_schematic(path: &Path) -> Result<PathBuf, EdeaError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("kicad_pro") => Ok(path.with_extension("kicad_sch")),
        Some("kicad_sch") => Ok(path.to_path_buf()),
        _ if path.is_dir() => {
            let name = dir_name(path).ok_or_else(|| EdeaError::InvalidProject(path.to_path_buf()))?;
            Ok(path.join(format!("{}.kicad_sch", name)))
        }
        _ => Err(EdeaError::InvalidProject(path.to_path_buf())),
    }
}

/// Recursively discover KiCad project files in a directory.
pub fn discover_projects(dir: &Path) -> Result<Vec<PathBuf>, EdeaError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), EdeaError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "target" || name == "build" || name.ends_with("-backups") {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some("kicad_pro") {
            files.push(path);
        }
    }
    Ok(())
}
