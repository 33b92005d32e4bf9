//! Merging several KiCad projects into one hierarchical schematic.
//!
//! Each input schematic becomes a `(sheet ...)` box on a new top-level
//! sheet. The box gets one pin per hierarchical label of the input, so the
//! merged design can be wired up in KiCad afterwards.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::bbox::BoundingBox;
use crate::core::{dir_name, EdeaError};
use crate::parser::kicad::{KicadError, KicadParser};
use crate::parser::schema::SUPPORTED_SCHEMATIC_VERSION;
use crate::parser::sexp::SExp;
use crate::project_file::write_project_file;

const GRID: f64 = 2.54;
const CHAR_WIDTH: f64 = 1.27;
const MIN_LABEL_CHARS: usize = 4;

/// Where merged sheets are placed on the top-level schematic (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeOptions {
    pub origin: (f64, f64),
    /// Gap between neighbouring sheets and rows.
    pub spacing: f64,
    /// Start a new row once the cursor is right of this x position.
    pub wrap_width: f64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            origin: (20.0, 20.0),
            spacing: 20.0,
            wrap_width: 270.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    x: f64,
    y: f64,
    row_height: f64,
}

/// A schematic kept as an expression tree so it can be edited and written back.
#[derive(Debug, Clone)]
pub struct SchematicDocument {
    expr: SExp,
    pub name: String,
    pub file_name: String,
    cursor: Option<Cursor>,
}

fn num(v: f64) -> SExp {
    SExp::number(v)
}

fn text_effects(justify: &[&str]) -> SExp {
    SExp::list(
        "effects",
        vec![
            SExp::list(
                "font",
                vec![SExp::list("size", vec![num(CHAR_WIDTH), num(CHAR_WIDTH)])],
            ),
            SExp::list("justify", justify.iter().map(|j| SExp::atom(*j)).collect()),
        ],
    )
}

fn sheet_property(key: &str, value: &str, id: i64, x: f64, y: f64) -> SExp {
    SExp::list(
        "property",
        vec![
            SExp::string(key),
            SExp::string(value),
            SExp::list("id", vec![SExp::atom(id.to_string())]),
            SExp::list("at", vec![num(x), num(y), num(0.0)]),
            text_effects(&["left", "bottom"]),
        ],
    )
}

fn transparent() -> SExp {
    SExp::list("color", vec![num(0.0), num(0.0), num(0.0), num(0.0)])
}

impl SchematicDocument {
    pub fn new(expr: SExp, name: &str, file_name: &str) -> Result<Self, KicadError> {
        if expr.tag() != Some("kicad_sch") {
            return Err(KicadError::InvalidFormat(format!(
                "Expected kicad_sch, found {}",
                expr.tag().unwrap_or("<atom>")
            )));
        }
        Ok(Self {
            expr,
            name: name.to_string(),
            file_name: file_name.to_string(),
            cursor: None,
        })
    }

    pub fn load(path: &Path, name: &str) -> Result<Self, KicadError> {
        let expr = KicadParser::read_expr(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(expr, name, &file_name)
    }

    /// Minimal valid schematic with only the root sheet instance.
    pub fn empty() -> Self {
        let expr = SExp::list(
            "kicad_sch",
            vec![
                SExp::list("version", vec![SExp::atom(SUPPORTED_SCHEMATIC_VERSION.to_string())]),
                SExp::list("generator", vec![SExp::atom("edea")]),
                SExp::list("uuid", vec![SExp::atom(Uuid::new_v4().to_string())]),
                SExp::list("paper", vec![SExp::string("A4")]),
                SExp::list("lib_symbols", vec![]),
                root_sheet_instances(),
            ],
        );
        Self {
            expr,
            name: String::new(),
            file_name: String::new(),
            cursor: None,
        }
    }

    pub fn as_expr(&self) -> &SExp {
        &self.expr
    }

    pub fn into_expr(self) -> SExp {
        self.expr
    }

    /// Hierarchical label names and shapes, first occurrence wins.
    pub fn hierarchical_labels(&self) -> Vec<(&str, &str)> {
        let mut labels: Vec<(&str, &str)> = Vec::new();
        for label in self.expr.find_all("hierarchical_label") {
            let Some(name) = label.arg(0).and_then(SExp::as_atom) else {
                continue;
            };
            if labels.iter().any(|(seen, _)| *seen == name) {
                continue;
            }
            labels.push((name, label.value("shape").unwrap_or("bidirectional")));
        }
        labels
    }

    /// Build a sheet box for this schematic with its top-left corner at `(x, y)`.
    pub fn to_sheet(&self, sheet_name: &str, file_name: &str, x: f64, y: f64) -> (BoundingBox, SExp) {
        let labels = self.hierarchical_labels();
        let longest = labels
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);

        // one character of padding on each side
        let width = (longest.max(MIN_LABEL_CHARS) + 2) as f64 * CHAR_WIDTH;
        let height = (labels.len() + 1) as f64 * GRID;
        let bbox = BoundingBox::new(&[(x, y), (x + width, y + height)]);

        let mut sheet = SExp::list(
            "sheet",
            vec![
                SExp::list("at", vec![num(x), num(y)]),
                SExp::list("size", vec![num(width), num(height)]),
                SExp::list("fields_autoplaced", vec![]),
                SExp::list(
                    "stroke",
                    vec![
                        SExp::list("width", vec![num(0.0)]),
                        SExp::list("type", vec![SExp::atom("solid")]),
                        transparent(),
                    ],
                ),
                SExp::list("fill", vec![transparent()]),
                SExp::list("uuid", vec![SExp::atom(Uuid::new_v4().to_string())]),
                sheet_property("Sheet name", sheet_name, 0, x, y),
                sheet_property("Sheet file", file_name, 1, x, y + height + GRID),
            ],
        );

        for (i, (name, shape)) in labels.iter().enumerate() {
            sheet.push(SExp::list(
                "pin",
                vec![
                    SExp::string(*name),
                    SExp::atom(*shape),
                    SExp::list("at", vec![num(x), num(y + (i + 1) as f64 * GRID), num(0.0)]),
                    text_effects(&["right"]),
                    SExp::list("uuid", vec![SExp::atom(Uuid::new_v4().to_string())]),
                ],
            ));
        }

        (bbox, sheet)
    }

    /// Place each `(sheet name, schematic)` as a sub-sheet of this schematic.
    ///
    /// Placement continues where the previous call stopped.
    pub fn append<'a>(
        &mut self,
        schematics: impl IntoIterator<Item = (&'a str, &'a SchematicDocument)>,
        options: &MergeOptions,
    ) {
        let mut cursor = self.cursor.unwrap_or(Cursor {
            x: options.origin.0,
            y: options.origin.1,
            row_height: 0.0,
        });

        for (name, schematic) in schematics {
            let (bbox, sheet) = schematic.to_sheet(name, &schematic.file_name, cursor.x, cursor.y);
            debug!("Placing sheet {} at ({}, {})", name, cursor.x, cursor.y);

            cursor.x += bbox.width() + options.spacing;
            cursor.row_height = cursor.row_height.max(bbox.height());
            if cursor.x > options.wrap_width {
                cursor.x = options.origin.0;
                cursor.y += cursor.row_height + options.spacing;
                cursor.row_height = 0.0;
            }

            let sheet_uuid = sheet.value("uuid").unwrap_or_default().to_string();
            self.insert_sheet(sheet);
            self.ensure_sheet_instances();
            let page = self.last_page() + 1;
            self.push_sheet_instance(&format!("/{}", sheet_uuid), page);
        }

        self.cursor = Some(cursor);
    }

    fn ensure_sheet_instances(&mut self) {
        if self.expr.find("sheet_instances").is_none() {
            self.expr.push(root_sheet_instances());
        }
    }

    /// Page number of the last sheet instance, 0 if none is numbered.
    fn last_page(&self) -> u32 {
        self.expr
            .find("sheet_instances")
            .map(|si| {
                si.find_all("path")
                    .iter()
                    .filter_map(|p| p.value("page")?.parse().ok())
                    .last()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    fn push_sheet_instance(&mut self, path: &str, page: u32) {
        let entry = SExp::list(
            "path",
            vec![
                SExp::string(path),
                SExp::list("page", vec![SExp::string(page.to_string())]),
            ],
        );
        if let Some(instances) = self.expr.find_mut("sheet_instances") {
            instances.push(entry);
        }
    }

    /// Insert before the instance tables so the file keeps KiCad's item order.
    fn insert_sheet(&mut self, sheet: SExp) {
        if let Some(items) = self.expr.as_list_mut() {
            let pos = items
                .iter()
                .position(|i| matches!(i.tag(), Some("sheet_instances") | Some("symbol_instances")))
                .unwrap_or(items.len());
            items.insert(pos, sheet);
        }
    }
}

fn root_sheet_instances() -> SExp {
    SExp::list(
        "sheet_instances",
        vec![SExp::list(
            "path",
            vec![
                SExp::string("/"),
                SExp::list("page", vec![SExp::string("1")]),
            ],
        )],
    )
}

/// One merge input after argument resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInstance {
    pub project_dir: PathBuf,
    pub project_name: String,
    /// Sheet name on the merged schematic.
    pub instance_name: String,
}

impl ProjectInstance {
    pub fn root_schematic(&self) -> PathBuf {
        self.project_dir.join(self.schematic_file_name())
    }

    pub fn schematic_file_name(&self) -> String {
        format!("{}.kicad_sch", self.project_name)
    }
}

/// Resolve merge inputs (`.kicad_pro` files or project directories).
///
/// Instances of the same project are grouped together and, when there is
/// more than one, named `"<project> 1"`, `"<project> 2"` and so on.
pub fn plan_instances(paths: &[PathBuf]) -> Result<Vec<ProjectInstance>, EdeaError> {
    let mut groups: Vec<(PathBuf, String, usize)> = Vec::new();

    for path in paths {
        let (project_dir, project_name) = if path.extension().and_then(|e| e.to_str()) == Some("kicad_pro") {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| EdeaError::InvalidProject(path.clone()))?;
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            (dir, name.to_string())
        } else if path.is_dir() {
            let name = dir_name(path).ok_or_else(|| EdeaError::InvalidProject(path.clone()))?;
            (path.clone(), name)
        } else {
            return Err(EdeaError::InvalidProject(path.clone()));
        };

        match groups.iter_mut().find(|(dir, _, _)| *dir == project_dir) {
            Some((_, _, count)) => *count += 1,
            None => groups.push((project_dir, project_name, 1)),
        }
    }

    let mut instances = Vec::new();
    for (project_dir, project_name, count) in groups {
        for i in 1..=count {
            let instance_name = if count == 1 {
                project_name.clone()
            } else {
                format!("{} {}", project_name, i)
            };
            instances.push(ProjectInstance {
                project_dir: project_dir.clone(),
                project_name: project_name.clone(),
                instance_name,
            });
        }
    }
    Ok(instances)
}

/// Files written by [`merge_projects`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeReport {
    pub schematic: PathBuf,
    pub project_file: PathBuf,
    pub sheets: usize,
    pub copied: Vec<PathBuf>,
}

/// Merge projects into `output_dir`, named after the directory itself.
pub fn merge_projects(
    paths: &[PathBuf],
    output_dir: &Path,
    options: &MergeOptions,
) -> Result<MergeReport, EdeaError> {
    if !output_dir.is_dir() {
        return Err(EdeaError::NotADirectory(output_dir.to_path_buf()));
    }
    let output_name =
        dir_name(output_dir).ok_or_else(|| EdeaError::NotADirectory(output_dir.to_path_buf()))?;

    let instances = plan_instances(paths)?;

    let mut target = SchematicDocument::empty();
    for instance in &instances {
        let source = SchematicDocument::load(&instance.root_schematic(), &instance.instance_name)?;
        target.append([(instance.instance_name.as_str(), &source)], options);
    }

    let mut project_dirs: Vec<&Path> = Vec::new();
    for instance in &instances {
        if !project_dirs.contains(&instance.project_dir.as_path()) {
            project_dirs.push(&instance.project_dir);
        }
    }

    let top_file = format!("{}.kicad_sch", output_name);
    let mut sources = Vec::new();
    for dir in project_dirs {
        sources.extend(schematic_files(dir)?);
    }
    if let Some(clash) = sources
        .iter()
        .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(top_file.as_str()))
    {
        return Err(EdeaError::NameClash(clash.clone()));
    }

    let mut copied = Vec::new();
    for path in &sources {
        if let Some(dest) = copy_schematic(path, output_dir)? {
            copied.push(dest);
        }
    }

    let schematic = output_dir.join(top_file);
    std::fs::write(&schematic, target.as_expr().to_pretty_string())?;
    let project_file = write_project_file(output_dir, &output_name)?;

    info!(
        "Merged {} sheets into {}",
        instances.len(),
        schematic.display()
    );
    Ok(MergeReport {
        schematic,
        project_file,
        sheets: instances.len(),
        copied,
    })
}

fn schematic_files(dir: &Path) -> Result<Vec<PathBuf>, EdeaError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("kicad_sch") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Copy one schematic into `to`; `None` when it already is the destination.
fn copy_schematic(path: &Path, to: &Path) -> Result<Option<PathBuf>, EdeaError> {
    let Some(file_name) = path.file_name() else {
        return Ok(None);
    };
    let dest = to.join(file_name);
    if same_file(path, &dest) {
        return Ok(None);
    }
    std::fs::copy(path, &dest)?;
    debug!("Copied {} to {}", path.display(), dest.display());
    Ok(Some(dest))
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::fields::FromSExp;
    use crate::parser::schema::{LabelShape, Schematic};
    use crate::parser::sexp::from_str;

    const MODULE: &str = r#"(kicad_sch (version 20211123) (generator eeschema)
  (uuid 2d3e4f50-6172-4839-a4b5-c6d7e8f90a1b)
  (paper "A4")
  (lib_symbols)
  (hierarchical_label "VIN" (shape input) (at 10 10 180) (uuid 3e4f5061-7283-494a-b5c6-d7e8f90a1b2c))
  (hierarchical_label "VOUT" (shape output) (at 40 10 0) (uuid 4f506172-8394-4a5b-86d7-e8f90a1b2c3d))
  (hierarchical_label "VIN" (shape input) (at 10 30 180) (uuid 50617283-94a5-4b6c-97e8-f90a1b2c3d4e))
)"#;

    fn module() -> SchematicDocument {
        SchematicDocument::new(from_str(MODULE).unwrap(), "ldo", "ldo.kicad_sch").unwrap()
    }

    #[test]
    fn test_empty_schematic_is_valid() {
        let empty = SchematicDocument::empty();
        let sch = Schematic::from_sexp(empty.as_expr()).unwrap();
        assert_eq!(sch.generator, "edea");
        assert_eq!(sch.sheet_instances.path.len(), 1);
        assert_eq!(sch.sheet_instances.path[0].path, "/");
    }

    #[test]
    fn test_labels_are_deduplicated() {
        let doc = module();
        assert_eq!(doc.hierarchical_labels(), vec![("VIN", "input"), ("VOUT", "output")]);
    }

    #[test]
    fn test_to_sheet_geometry() {
        let (bbox, sheet) = module().to_sheet("ldo", "ldo.kicad_sch", 20.0, 20.0);
        // two labels, longest has 4 characters
        assert!((bbox.width() - 7.62).abs() < 1e-9);
        assert!((bbox.height() - 7.62).abs() < 1e-9);
        assert_eq!(bbox.min(), Some((20.0, 20.0)));

        assert_eq!(sheet.property("Sheet name"), Some("ldo"));
        assert_eq!(sheet.property("Sheet file"), Some("ldo.kicad_sch"));

        let pins = sheet.find_all("pin");
        assert_eq!(pins.len(), 2);
        assert_eq!(pins[1].arg(0).and_then(SExp::as_atom), Some("VOUT"));
        assert_eq!(pins[1].find("at").unwrap().to_string(), "(at 20 25.08 0)");
    }

    #[test]
    fn test_append_places_and_numbers_sheets() {
        let mut top = SchematicDocument::empty();
        let ldo = module();
        let options = MergeOptions::default();
        top.append([("ldo 1", &ldo), ("ldo 2", &ldo)], &options);

        let sch = Schematic::from_sexp(top.as_expr()).unwrap();
        assert_eq!(sch.sheet.len(), 2);
        assert_eq!(sch.sheet[0].at, (20.0, 20.0));
        assert_eq!(sch.sheet[1].at, (47.62, 20.0));
        assert_eq!(sch.sheet[0].pin[0].shape, LabelShape::Input);

        let pages: Vec<&str> = sch.sheet_instances.path.iter().map(|p| p.page.as_str()).collect();
        assert_eq!(pages, vec!["1", "2", "3"]);
        assert_eq!(sch.sheet_instances.path[1].path, format!("/{}", sch.sheet[0].uuid));
    }

    #[test]
    fn test_cursor_wraps_and_persists() {
        let mut top = SchematicDocument::empty();
        let ldo = module();
        let options = MergeOptions {
            wrap_width: 50.0,
            ..MergeOptions::default()
        };
        top.append([("a", &ldo), ("b", &ldo)], &options);
        top.append([("c", &ldo)], &options);

        let sch = Schematic::from_sexp(top.as_expr()).unwrap();
        let positions: Vec<(f64, f64)> = sch.sheet.iter().map(|s| s.at).collect();
        // a at x=20, b at 47.62; then x=75.24 > 50 wraps
        assert_eq!(positions[0], (20.0, 20.0));
        assert_eq!(positions[1], (47.62, 20.0));
        assert_eq!(positions[2], (20.0, 47.62));
    }

    #[test]
    fn test_plan_instances_renames_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let ldo = dir.path().join("ldo");
        let mcu = dir.path().join("mcu");
        std::fs::create_dir(&ldo).unwrap();
        std::fs::create_dir(&mcu).unwrap();

        let plan = plan_instances(&[ldo.clone(), mcu.join("mcu.kicad_pro"), ldo.join("ldo.kicad_pro")]).unwrap();
        let names: Vec<&str> = plan.iter().map(|i| i.instance_name.as_str()).collect();
        assert_eq!(names, vec!["ldo 1", "ldo 2", "mcu"]);
        assert_eq!(plan[2].root_schematic(), mcu.join("mcu.kicad_sch"));
    }

    #[test]
    fn test_plan_instances_rejects_other_files() {
        let err = plan_instances(&[PathBuf::from("/nonexistent/readme.md")]).unwrap_err();
        assert!(matches!(err, EdeaError::InvalidProject(_)));
    }

    #[test]
    fn test_merge_requires_output_directory() {
        let err = merge_projects(&[], Path::new("/nonexistent/out"), &MergeOptions::default()).unwrap_err();
        assert!(matches!(err, EdeaError::NotADirectory(_)));
    }
}
