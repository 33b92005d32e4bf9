//! Integration tests for edea: metadata extraction and merging

use edea::prelude::*;
use edea::{discover_projects, merge_projects};
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn metadata_of(path: &Path) -> Metadata {
    let mut project = Project::from_path(path).expect("Should resolve project");
    project.parse().expect("Should parse project");
    project.metadata().expect("Should extract metadata")
}

const U1: &str = "a759562e-cfbc-4723-92d8-7c352a2310da";
const C1: &str = "a4116ea4-431e-40cf-b350-41d6f063b54a";
const C2: &str = "454b4a5c-017a-4918-b80c-6f49fd58d9e7";
const R1: &str = "aa86e36f-d643-4165-aa51-867ae4ab2192";
const U2: &str = "3e431e25-df7a-4267-90d6-5cad629f6123";
const C10: &str = "b9aabeb3-7d12-488e-b377-0cb600784d6a";

#[test]
fn test_ldo_metadata() {
    let meta = metadata_of(&fixture_path("ldo/ldo.kicad_pro"));

    // power symbol and the not-in-BOM capacitor are left out
    assert_eq!(meta.count_part, 3);
    // C1 and C2 share value and footprint
    assert_eq!(meta.count_unique, 2);
    assert_eq!(meta.sheets, 1);
    assert_eq!(meta.parts.len(), 3);
    assert!(meta.parse_time >= 0.0);

    let u1 = &meta.parts[U1];
    assert_eq!(u1.references, vec!["U1"]);
    assert_eq!(u1.properties["MPN"], "AP2112K-3.3TRG1");
    assert!(!u1.properties.contains_key("Reference"));
    assert_eq!(meta.parts[C1].references, vec!["C1"]);
    assert_eq!(meta.parts[C2].properties["Value"], "1u");
}

#[test]
fn test_project_directory_is_accepted() {
    let from_dir = metadata_of(&fixture_path("ldo"));
    let from_pro = metadata_of(&fixture_path("ldo/ldo.kicad_pro"));
    assert_eq!(from_dir.count_part, from_pro.count_part);
    assert_eq!(
        from_dir.parts.keys().collect::<Vec<_>>(),
        from_pro.parts.keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_reused_sheet_metadata() {
    let meta = metadata_of(&fixture_path("demo/demo.kicad_pro"));

    // root + two instances of power.kicad_sch
    assert_eq!(meta.sheets, 3);
    // R1, R2 and twice (U2, C3)
    assert_eq!(meta.count_part, 6);
    // 10k resistor, LM1117 by MPN, 10u capacitor by LCSC number
    assert_eq!(meta.count_unique, 3);
    assert_eq!(meta.parts.len(), 4);

    assert_eq!(meta.parts[R1].references, vec!["R1"]);
    assert_eq!(meta.parts[U2].references, vec!["U2", "U3"]);
    assert_eq!(meta.parts[C10].references, vec!["C3", "C4"]);
    assert_eq!(meta.parts[C10].properties["LCSC"], "C15850");
}

#[test]
fn test_metadata_json_shape() {
    let meta = metadata_of(&fixture_path("demo/demo.kicad_pro"));
    let json = serde_json::to_value(&meta).unwrap();

    assert_eq!(json["count_part"], 6);
    assert_eq!(json["count_unique"], 3);
    assert_eq!(json["sheets"], 3);
    assert!(json["parse_time"].is_f64());

    let u2 = &json["parts"][U2];
    assert_eq!(u2["Value"], "LM1117-3.3");
    assert_eq!(u2["MPN"], "LM1117MPX-3.3");
    assert_eq!(u2["Reference"], serde_json::json!(["U2", "U3"]));
}

#[test]
fn test_hierarchy_loads_each_file_once() {
    let mut project = Project::from_path(&fixture_path("demo")).unwrap();
    project.parse().unwrap();

    let hierarchy = project.hierarchy();
    assert_eq!(hierarchy.file_count(), 2);
    let root = hierarchy.root().unwrap();
    let children = hierarchy.children(root);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].0.sheet_name, "power_a");
    assert_eq!(children[1].0.sheet_name, "power_b");
    assert_eq!(children[0].1, children[1].1);
    assert!(project.schematic("power.kicad_sch").is_some());
}

#[test]
fn test_metadata_before_parse_fails() {
    let project = Project::from_path(&fixture_path("ldo/ldo.kicad_pro")).unwrap();
    assert!(project.metadata().is_err());
}

#[test]
fn test_missing_sub_sheet_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(
        fixture_path("demo/demo.kicad_sch"),
        dir.path().join("demo.kicad_sch"),
    )
    .unwrap();

    let mut project = Project::new(dir.path().join("demo.kicad_sch"));
    assert!(project.parse().is_err());
}

#[test]
fn test_discover_projects() {
    let projects = discover_projects(&fixture_path("")).unwrap();
    let names: Vec<_> = projects
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .collect();
    assert_eq!(names, vec!["demo.kicad_pro", "ldo.kicad_pro"]);
}

#[test]
fn test_merge_two_projects() {
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("combined");
    std::fs::create_dir(&output).unwrap();

    let report = merge_projects(
        &[fixture_path("ldo/ldo.kicad_pro"), fixture_path("demo")],
        &output,
        &MergeOptions::default(),
    )
    .expect("Should merge");

    assert_eq!(report.sheets, 2);
    assert_eq!(report.schematic, output.join("combined.kicad_sch"));
    assert_eq!(report.project_file, output.join("combined.kicad_pro"));
    assert_eq!(report.copied.len(), 3);
    for file in ["ldo.kicad_sch", "demo.kicad_sch", "power.kicad_sch"] {
        assert!(output.join(file).is_file(), "{} not copied", file);
    }

    // the merged project is a regular project again
    let meta = metadata_of(&output);
    assert_eq!(meta.sheets, 5);
    assert_eq!(meta.count_part, 9);
    assert_eq!(meta.count_unique, 5);
    assert_eq!(meta.parts.len(), 7);

    let pro: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report.project_file).unwrap()).unwrap();
    assert_eq!(pro["meta"]["filename"], "combined.kicad_pro");
}

#[test]
fn test_merged_sheet_pins_follow_labels() {
    let out = tempfile::tempdir().unwrap();
    let report = merge_projects(
        &[fixture_path("ldo")],
        out.path(),
        &MergeOptions::default(),
    )
    .unwrap();

    let top = parse_schematic_file(&report.schematic);
    assert_eq!(top.sheet.len(), 1);

    let sheet = &top.sheet[0];
    assert_eq!(sheet.sheet_name(), Some("ldo"));
    assert_eq!(sheet.sheet_file(), Some("ldo.kicad_sch"));
    let pins: Vec<_> = sheet.pin.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(pins, vec!["VIN", "VOUT", "GND"]);
    assert_eq!(sheet.at, (20.0, 20.0));
    // 4 characters plus padding, three pins plus one grid of margin
    assert!((sheet.size.0 - 7.62).abs() < 1e-9);
    assert!((sheet.size.1 - 10.16).abs() < 1e-9);

    let pages: Vec<_> = top
        .sheet_instances
        .path
        .iter()
        .map(|p| p.page.as_str())
        .collect();
    assert_eq!(pages, vec!["1", "2"]);
}

#[test]
fn test_merge_same_project_twice() {
    let out = tempfile::tempdir().unwrap();
    let report = merge_projects(
        &[fixture_path("ldo"), fixture_path("ldo/ldo.kicad_pro")],
        out.path(),
        &MergeOptions::default(),
    )
    .unwrap();
    assert_eq!(report.sheets, 2);
    assert_eq!(report.copied.len(), 1);

    let top = parse_schematic_file(&report.schematic);
    let names: Vec<_> = top.sheet.iter().filter_map(|s| s.sheet_name()).collect();
    assert_eq!(names, vec!["ldo 1", "ldo 2"]);
    assert_ne!(top.sheet[0].uuid, top.sheet[1].uuid);
    assert!(top.sheet[1].at.0 > top.sheet[0].at.0);
}

#[test]
fn test_merge_into_missing_directory() {
    let out = tempfile::tempdir().unwrap();
    let err = merge_projects(
        &[fixture_path("ldo")],
        &out.path().join("nope"),
        &MergeOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EdeaError::NotADirectory(_)));
}

#[test]
fn test_merge_into_directory_named_like_a_project() {
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("ldo");
    std::fs::create_dir(&output).unwrap();

    let err = merge_projects(&[fixture_path("ldo")], &output, &MergeOptions::default())
        .unwrap_err();
    match err {
        EdeaError::NameClash(path) => {
            assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("ldo.kicad_sch"))
        }
        other => panic!("Unexpected error: {:?}", other),
    }

    // nothing was written
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), 0);
}

#[test]
fn test_merge_rejects_schematic_argument() {
    let out = tempfile::tempdir().unwrap();
    let err = merge_projects(
        &[fixture_path("ldo/ldo.kicad_sch")],
        out.path(),
        &MergeOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, EdeaError::InvalidProject(_)));
}

fn parse_schematic_file(path: &Path) -> Schematic {
    edea::parse_schematic(path).expect("Merged schematic should parse")
}
