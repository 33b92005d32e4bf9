//! Tests for board loading and footprint geometry

use edea::parser::{footprint_bounding_box, PcbError};
use edea::{parse_pcb, EdeaError, KicadParser};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_load_board() {
    let pcb = parse_pcb(&fixture_path("demo/demo.kicad_pcb")).expect("Should parse");
    assert_eq!(pcb.name, "demo");
    assert_eq!(pcb.file_name, "demo.kicad_pcb");
    assert_eq!(pcb.footprint_count(), 3);
}

#[test]
fn test_board_bounding_box() {
    let pcb = parse_pcb(&fixture_path("demo/demo.kicad_pcb")).unwrap();
    let bbox = pcb.bounding_box().unwrap();

    let (min_x, min_y) = bbox.min().unwrap();
    let (max_x, max_y) = bbox.max().unwrap();
    // R1 on the left, U2 rotated 90 degrees on top, H1 bottom right
    assert_close(min_x, 98.775);
    assert_close(min_y, 97.5);
    assert_close(max_x, 141.6);
    assert_close(max_y, 111.6);
    assert_close(bbox.width(), 42.825);
    assert_close(bbox.height(), 14.1);
}

#[test]
fn test_rotated_footprint() {
    let pcb = parse_pcb(&fixture_path("demo/demo.kicad_pcb")).unwrap();
    let u2 = pcb
        .as_expr()
        .find_all("footprint")
        .into_iter()
        .find(|fp| fp.arg(0).and_then(|a| a.as_atom()) == Some("Package_TO_SOT_SMD:SOT-23"))
        .expect("Should find U2");

    let bbox = footprint_bounding_box(u2).unwrap();
    let (min_x, min_y) = bbox.min().unwrap();
    let (max_x, max_y) = bbox.max().unwrap();
    assert_close(min_x, 119.0);
    assert_close(max_x, 121.0);
    assert_close(min_y, 97.5);
    assert_close(max_y, 102.5);
}

#[test]
fn test_rotation_follows_kicad_direction() {
    // single pad right of the origin, footprint turned a quarter
    let fp = KicadParser::read_expr_str(
        r#"(footprint "Test:Offset" (layer "F.Cu") (at 0 0 90)
  (pad "1" smd rect (at 2 0) (size 1 1) (layers "F.Cu")))"#,
    )
    .unwrap();

    let bbox = footprint_bounding_box(&fp).unwrap();
    let (cx, cy) = bbox.center().unwrap();
    assert_close(cx, 0.0);
    assert_close(cy, -2.0);
    assert_close(bbox.width(), 1.0);
    assert_close(bbox.height(), 1.0);
}

#[test]
fn test_translate_board() {
    let mut pcb = parse_pcb(&fixture_path("demo/demo.kicad_pcb")).unwrap();
    pcb.translate(10.0, -10.0);

    let bbox = pcb.bounding_box().unwrap();
    let (min_x, min_y) = bbox.min().unwrap();
    assert_close(min_x, 108.775);
    assert_close(min_y, 87.5);
    assert_close(bbox.width(), 42.825);

    let edge = pcb.as_expr().find("gr_line").unwrap();
    let start = edge.find("start").unwrap();
    assert_eq!(start.arg(0).and_then(|a| a.as_f64()), Some(100.0));
    assert_eq!(start.arg(1).and_then(|a| a.as_f64()), Some(80.0));

    let via = pcb.as_expr().find("via").unwrap();
    let at = via.find("at").unwrap();
    assert_eq!(at.arg(0).and_then(|a| a.as_f64()), Some(120.0));
    assert_eq!(at.arg(1).and_then(|a| a.as_f64()), Some(90.0));
}

#[test]
fn test_schematic_is_not_a_board() {
    let err = parse_pcb(&fixture_path("ldo/ldo.kicad_sch")).unwrap_err();
    assert!(
        matches!(err, EdeaError::Pcb(PcbError::InvalidFormat(_))),
        "Unexpected error: {:?}",
        err
    );
}
