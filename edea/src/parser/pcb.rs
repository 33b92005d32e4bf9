//! KiCad PCB geometry
//!
//! Boards are kept as untyped S-expression trees. This module knows just
//! enough about `footprint`/`module` and `pad` items to compute outlines:
//! - All values are in millimeters
//! - Pad positions are relative to their footprint
//! - Rotations are in degrees

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::bbox::{rotate_point, BoundingBox};
use crate::parser::format_detector::{detect_format, FileKind};
use crate::parser::kicad::KicadError;
use crate::parser::sexp::{ParseError, SExp, SExpParser};
use crate::parser::shapes::Point;

#[derive(Debug, Error)]
pub enum PcbError {
    #[error("S-expression parse error: {0}")]
    SExp(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Kicad(#[from] KicadError),
    #[error("Invalid PCB format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
    #[error("Pad shape '{0}' is not supported")]
    UnsupportedPadShape(String),
}

const FOOTPRINT_TAGS: &[&str] = &["footprint", "module"];

fn xy(sexp: &SExp, key: &str) -> Option<(f64, f64, f64)> {
    let item = sexp.find(key)?;
    let x = item.arg(0)?.as_f64()?;
    let y = item.arg(1)?.as_f64()?;
    let angle = item.arg(2).and_then(SExp::as_f64).unwrap_or(0.0);
    Some((x, y, angle))
}

/// Outline sample points of a `(pad ...)` in footprint coordinates.
pub fn pad_corners(pad: &SExp) -> Result<Vec<Point>, PcbError> {
    let shape = pad
        .arg(2)
        .and_then(SExp::as_atom)
        .ok_or_else(|| PcbError::MissingField("pad shape".to_string()))?;
    let (x, y, angle) = xy(pad, "at").ok_or_else(|| PcbError::MissingField("pad at".to_string()))?;
    let (w, h, _) = xy(pad, "size").ok_or_else(|| PcbError::MissingField("pad size".to_string()))?;
    let (hw, hh) = (w / 2.0, h / 2.0);

    let outline: Vec<Point> = match shape {
        "rect" | "roundrect" | "custom" | "trapezoid" => {
            vec![(hw, hh), (hw, -hh), (-hw, hh), (-hw, -hh)]
        }
        "oval" => vec![(hw, 0.0), (-hw, 0.0), (0.0, hh), (0.0, -hh)],
        "circle" => vec![(hw, 0.0), (-hw, 0.0), (0.0, hw), (0.0, -hw)],
        other => return Err(PcbError::UnsupportedPadShape(other.to_string())),
    };

    Ok(outline
        .into_iter()
        .map(|p| {
            let (px, py) = rotate_point(p, angle);
            (px + x, py + y)
        })
        .collect())
}

/// Box around all pads of a footprint, in board coordinates.
pub fn footprint_bounding_box(footprint: &SExp) -> Result<BoundingBox, PcbError> {
    let mut bbox = BoundingBox::empty();
    for pad in footprint.find_all("pad") {
        bbox.envelop(&pad_corners(pad)?);
    }

    if let Some((x, y, angle)) = xy(footprint, "at") {
        if angle != 0.0 {
            bbox.rotate(angle);
        }
        bbox.translate(x, y);
    }
    Ok(bbox)
}

/// A KiCad board held as an expression tree.
#[derive(Debug, Clone)]
pub struct Pcb {
    expr: SExp,
    pub name: String,
    pub file_name: String,
}

impl Pcb {
    pub fn new(expr: SExp, name: &str, file_name: &str) -> Result<Self, PcbError> {
        match expr.tag() {
            Some("kicad_pcb") => Ok(Self {
                expr,
                name: name.to_string(),
                file_name: file_name.to_string(),
            }),
            other => Err(PcbError::InvalidFormat(format!(
                "Expected kicad_pcb, found {}",
                other.unwrap_or("<atom>")
            ))),
        }
    }

    pub fn parse_str(content: &str, name: &str, file_name: &str) -> Result<Self, PcbError> {
        let format = detect_format(content)?;
        if format.kind != FileKind::Pcb {
            return Err(PcbError::InvalidFormat(format!(
                "Expected {}, found {}",
                FileKind::Pcb.root_tag(),
                format.kind.root_tag()
            )));
        }
        let expr = SExpParser::new(content).parse()?;
        Self::new(expr, name, file_name)
    }

    pub fn load(path: &Path) -> Result<Self, PcbError> {
        debug!("Parsing board {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        Self::parse_str(&content, name, file_name)
    }

    fn footprints(&self) -> impl Iterator<Item = &SExp> {
        self.expr
            .args()
            .iter()
            .filter(|item| item.tag().is_some_and(|t| FOOTPRINT_TAGS.contains(&t)))
    }

    pub fn footprint_count(&self) -> usize {
        self.footprints().count()
    }

    /// Union of all footprint boxes.
    pub fn bounding_box(&self) -> Result<BoundingBox, PcbError> {
        let mut bbox = BoundingBox::empty();
        for footprint in self.footprints() {
            let fp_box = footprint_bounding_box(footprint)?;
            if !fp_box.is_valid() {
                warn!(
                    "Footprint {} has no pads, skipped in bounding box",
                    footprint.arg(0).map(|a| a.to_string()).unwrap_or_default()
                );
                continue;
            }
            bbox.union(&fp_box);
        }
        Ok(bbox)
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.expr.translate(dx, dy);
    }

    pub fn as_expr(&self) -> &SExp {
        &self.expr
    }

    pub fn into_expr(self) -> SExp {
        self.expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sexp::from_str;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_rect_pad_corners() {
        let pad = from_str("(pad \"1\" smd rect (at 1 2) (size 2 1) (layers \"F.Cu\"))").unwrap();
        let corners = pad_corners(&pad).unwrap();
        assert_eq!(corners, vec![(2.0, 2.5), (2.0, 1.5), (0.0, 2.5), (0.0, 1.5)]);
    }

    #[test]
    fn test_rotated_pad() {
        let pad = from_str("(pad \"1\" smd roundrect (at 0 0 90) (size 2 1))").unwrap();
        let bbox = BoundingBox::new(&pad_corners(&pad).unwrap());
        assert!(approx(bbox.width(), 1.0));
        assert!(approx(bbox.height(), 2.0));
    }

    #[test]
    fn test_oval_and_circle_pads() {
        let oval = from_str("(pad \"1\" thru_hole oval (at 0 0) (size 2 4) (drill 1))").unwrap();
        assert_eq!(
            pad_corners(&oval).unwrap(),
            vec![(1.0, 0.0), (-1.0, 0.0), (0.0, 2.0), (0.0, -2.0)]
        );

        let circle = from_str("(pad \"2\" thru_hole circle (at 5 0) (size 3 3) (drill 1.5))").unwrap();
        let bbox = BoundingBox::new(&pad_corners(&circle).unwrap());
        assert_eq!(bbox.min(), Some((3.5, -1.5)));
        assert_eq!(bbox.max(), Some((6.5, 1.5)));
    }

    #[test]
    fn test_unsupported_pad_shape() {
        let pad = from_str("(pad \"1\" smd blob (at 0 0) (size 1 1))").unwrap();
        assert!(matches!(
            pad_corners(&pad),
            Err(PcbError::UnsupportedPadShape(shape)) if shape == "blob"
        ));
    }

    #[test]
    fn test_footprint_box_is_translated() {
        let fp = from_str(
            "(footprint \"R_0603\" (layer \"F.Cu\") (at 10 20)
               (pad \"1\" smd rect (at -1 0) (size 1 1))
               (pad \"2\" smd rect (at 1 0) (size 1 1)))",
        )
        .unwrap();
        let bbox = footprint_bounding_box(&fp).unwrap();
        assert_eq!(bbox.min(), Some((8.5, 19.5)));
        assert_eq!(bbox.max(), Some((11.5, 20.5)));
    }

    #[test]
    fn test_footprint_without_pads() {
        let fp = from_str("(footprint \"Logo\" (at 5 5))").unwrap();
        assert!(!footprint_bounding_box(&fp).unwrap().is_valid());
    }

    #[test]
    fn test_board_bounding_box_and_translate() {
        let mut pcb = Pcb::parse_str(
            "(kicad_pcb (version 20211014) (generator pcbnew)
               (footprint \"A\" (at 0 0) (pad \"1\" smd rect (at 0 0) (size 2 2)))
               (module \"B\" (at 10 10) (pad \"1\" smd rect (at 0 0) (size 2 2)))
               (footprint \"Logo\" (at 50 50)))",
            "board",
            "board.kicad_pcb",
        )
        .unwrap();
        assert_eq!(pcb.footprint_count(), 3);
        let bbox = pcb.bounding_box().unwrap();
        assert_eq!(bbox.area(), 144.0);

        pcb.translate(5.0, 5.0);
        let moved = pcb.bounding_box().unwrap();
        assert_eq!(moved.min(), Some((4.0, 4.0)));
    }

    #[test]
    fn test_schematic_is_not_a_board() {
        let err = Pcb::parse_str("(kicad_sch (version 20211123))", "x", "x.kicad_sch").unwrap_err();
        assert!(matches!(err, PcbError::InvalidFormat(_)));
    }
}
