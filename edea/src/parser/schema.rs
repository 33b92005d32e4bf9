//! Typed model of a `.kicad_sch` file (stable KiCad 6 format).
//!
//! Every struct mirrors one KiCad list and is built through [`FromSExp`].
//! Unknown fields are rejected, missing optional fields take KiCad's
//! defaults and missing `uuid`s are generated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::parser::fields::{keyword_enum, Color, Fields, FromSExp, Keyword, ModelError};
use crate::parser::shapes::{Fill, Point, Pts, Stroke};
use crate::parser::symbol::{Effects, Position, Symbol, SymbolProperty};

/// The only schematic file format version accepted by the typed model.
pub const SUPPORTED_SCHEMATIC_VERSION: i64 = 20211123;

keyword_enum! {
    LabelShape {
        Input => "input",
        Output => "output",
        Bidirectional => "bidirectional",
        TriState => "tri_state",
        Passive => "passive",
    } default Bidirectional
}

keyword_enum! {
    PaperFormat {
        A0 => "A0",
        A1 => "A1",
        A2 => "A2",
        A3 => "A3",
        A4 => "A4",
        A5 => "A5",
        A => "A",
        B => "B",
        C => "C",
        D => "D",
        E => "E",
        UsLetter => "USLetter",
        UsLegal => "USLegal",
        UsLedger => "USLedger",
    } default A4
}

keyword_enum! {
    Mirror {
        X => "x",
        Y => "y",
    } default X
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Paper {
    Standard { format: PaperFormat, portrait: bool },
    User { width: f64, height: f64 },
}

impl Default for Paper {
    fn default() -> Self {
        Paper::Standard {
            format: PaperFormat::A4,
            portrait: false,
        }
    }
}

impl FromSExp for Paper {
    const TAG: &'static str = "paper";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let format = f.positional_str("format")?;
        if format == "User" {
            return Ok(Paper::User {
                width: f.positional_f64("width")?,
                height: f.positional_f64("height")?,
            });
        }
        let format = PaperFormat::from_keyword(&format)
            .ok_or_else(|| f.invalid("format", &format))?;
        let portrait = match f.opt_positional() {
            None => false,
            Some(word) if word.as_atom() == Some("portrait") => true,
            Some(other) => return Err(f.invalid("orientation", other)),
        };
        Ok(Paper::Standard { format, portrait })
    }
}

/// `(pin "1" (uuid ...))` on a placed symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinAssignment {
    pub number: String,
    pub uuid: Uuid,
    pub alternate: Option<String>,
}

impl FromSExp for PinAssignment {
    const TAG: &'static str = "pin";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            number: f.positional_str("number")?,
            uuid: f.uuid()?,
            alternate: f.string("alternate")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultInstance {
    pub reference: String,
    pub unit: i64,
    pub value: String,
    pub footprint: String,
}

impl FromSExp for DefaultInstance {
    const TAG: &'static str = "default_instance";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            reference: f.string("reference")?.ok_or_else(|| f.missing("reference"))?,
            unit: f.int("unit")?.unwrap_or(1),
            value: f.string("value")?.unwrap_or_default(),
            footprint: f.string("footprint")?.unwrap_or_default(),
        })
    }
}

/// A symbol instance placed on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolPlaced {
    pub lib_id: String,
    pub lib_name: Option<String>,
    pub at: Position,
    pub unit: i64,
    pub convert: Option<i64>,
    pub in_bom: bool,
    pub on_board: bool,
    pub mirror: Option<Mirror>,
    pub uuid: Uuid,
    pub default_instance: Option<DefaultInstance>,
    pub property: Vec<SymbolProperty>,
    pub pin: Vec<PinAssignment>,
    pub fields_autoplaced: bool,
}

impl SymbolPlaced {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn reference(&self) -> Option<&str> {
        self.property("Reference")
    }
}

impl FromSExp for SymbolPlaced {
    const TAG: &'static str = "symbol";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            lib_id: f.string("lib_id")?.ok_or_else(|| f.missing("lib_id"))?,
            lib_name: f.string("lib_name")?,
            at: f.point3("at")?.unwrap_or_default(),
            unit: f.int("unit")?.unwrap_or(1),
            convert: f.int("convert")?,
            in_bom: f.yes_no("in_bom")?.unwrap_or(true),
            on_board: f.yes_no("on_board")?.unwrap_or(true),
            mirror: f.keyword("mirror")?,
            uuid: f.uuid()?,
            default_instance: f.child("default_instance")?,
            property: f.children("property")?,
            pin: f.children("pin")?,
            fields_autoplaced: f.flag("fields_autoplaced")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    pub pts: Pts,
    pub stroke: Stroke,
    pub uuid: Uuid,
}

impl FromSExp for Wire {
    const TAG: &'static str = "wire";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            pts: f.child("pts")?.unwrap_or_default(),
            stroke: f.child("stroke")?.unwrap_or_default(),
            uuid: f.uuid()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub pts: Pts,
    pub stroke: Stroke,
    pub uuid: Uuid,
}

impl FromSExp for Bus {
    const TAG: &'static str = "bus";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            pts: f.child("pts")?.unwrap_or_default(),
            stroke: f.child("stroke")?.unwrap_or_default(),
            uuid: f.uuid()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub at: Point,
    pub diameter: f64,
    pub color: Color,
    pub uuid: Uuid,
}

impl FromSExp for Junction {
    const TAG: &'static str = "junction";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            at: f.point2("at")?.ok_or_else(|| f.missing("at"))?,
            diameter: f.number("diameter")?.unwrap_or(0.0),
            color: f.color("color")?.unwrap_or(Color::TRANSPARENT),
            uuid: f.uuid()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoConnect {
    pub at: Point,
    pub uuid: Uuid,
}

impl FromSExp for NoConnect {
    const TAG: &'static str = "no_connect";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            at: f.point2("at")?.ok_or_else(|| f.missing("at"))?,
            uuid: f.uuid()?,
        })
    }
}

/// Net label local to one sheet; also used for free `text` items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalLabel {
    pub text: String,
    pub at: Position,
    pub fields_autoplaced: bool,
    pub effects: Effects,
    pub uuid: Uuid,
}

impl FromSExp for LocalLabel {
    const TAG: &'static str = "label";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            text: f.positional_str("text")?,
            at: f.point3("at")?.ok_or_else(|| f.missing("at"))?,
            fields_autoplaced: f.flag("fields_autoplaced")?,
            effects: f.child("effects")?.unwrap_or_default(),
            uuid: f.uuid()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalLabel {
    pub text: String,
    pub at: Position,
    pub shape: LabelShape,
    pub effects: Effects,
    pub uuid: Uuid,
    pub property: Vec<SymbolProperty>,
    pub fields_autoplaced: bool,
}

impl FromSExp for GlobalLabel {
    const TAG: &'static str = "global_label";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            text: f.positional_str("text")?,
            at: f.point3("at")?.ok_or_else(|| f.missing("at"))?,
            shape: f.keyword("shape")?.unwrap_or_default(),
            effects: f.child("effects")?.unwrap_or_default(),
            uuid: f.uuid()?,
            property: f.children("property")?,
            fields_autoplaced: f.flag("fields_autoplaced")?,
        })
    }
}

/// Connection point between a sub-sheet and its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalLabel {
    pub text: String,
    pub at: Position,
    pub shape: LabelShape,
    pub effects: Effects,
    pub uuid: Uuid,
    pub fields_autoplaced: bool,
}

impl FromSExp for HierarchicalLabel {
    const TAG: &'static str = "hierarchical_label";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            text: f.positional_str("text")?,
            at: f.point3("at")?.ok_or_else(|| f.missing("at"))?,
            shape: f.keyword("shape")?.unwrap_or_default(),
            effects: f.child("effects")?.unwrap_or_default(),
            uuid: f.uuid()?,
            fields_autoplaced: f.flag("fields_autoplaced")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibSymbols {
    pub symbol: Vec<Symbol>,
}

impl FromSExp for LibSymbols {
    const TAG: &'static str = "lib_symbols";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            symbol: f.children("symbol")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleBlockComment {
    pub number: i64,
    pub text: String,
}

impl FromSExp for TitleBlockComment {
    const TAG: &'static str = "comment";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let number = f.positional("number")?;
        let number = number.as_i64().ok_or_else(|| f.invalid("number", number))?;
        Ok(Self {
            number,
            text: f.positional_str("text")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleBlock {
    pub title: String,
    pub date: String,
    pub rev: String,
    pub company: String,
    pub comment: Vec<TitleBlockComment>,
}

impl FromSExp for TitleBlock {
    const TAG: &'static str = "title_block";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            title: f.string("title")?.unwrap_or_default(),
            date: f.string("date")?.unwrap_or_default(),
            rev: f.string("rev")?.unwrap_or_default(),
            company: f.string("company")?.unwrap_or_default(),
            comment: f.children("comment")?,
        })
    }
}

/// `(path "/" (page "1"))` inside `sheet_instances`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetPath {
    pub path: String,
    pub page: String,
}

impl FromSExp for SheetPath {
    const TAG: &'static str = "path";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            path: f.positional_str("path")?,
            page: f.string("page")?.unwrap_or_else(|| "1".to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetInstances {
    pub path: Vec<SheetPath>,
}

impl FromSExp for SheetInstances {
    const TAG: &'static str = "sheet_instances";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            path: f.children("path")?,
        })
    }
}

/// `(path "/<sheet>/<symbol>" (reference "R1") (unit 1) (value "10k") (footprint "..."))`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInstancesPath {
    pub path: String,
    pub reference: String,
    pub unit: i64,
    pub value: String,
    pub footprint: String,
}

impl FromSExp for SymbolInstancesPath {
    const TAG: &'static str = "path";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            path: f.positional_str("path")?,
            reference: f.string("reference")?.ok_or_else(|| f.missing("reference"))?,
            unit: f.int("unit")?.ok_or_else(|| f.missing("unit"))?,
            value: f.string("value")?.ok_or_else(|| f.missing("value"))?,
            footprint: f.string("footprint")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolInstances {
    pub path: Vec<SymbolInstancesPath>,
}

impl FromSExp for SymbolInstances {
    const TAG: &'static str = "symbol_instances";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            path: f.children("path")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolyLineTopLevel {
    pub pts: Pts,
    pub stroke: Stroke,
    pub fill: Fill,
    pub uuid: Uuid,
}

impl FromSExp for PolyLineTopLevel {
    const TAG: &'static str = "polyline";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            pts: f.child("pts")?.unwrap_or_default(),
            stroke: f.child("stroke")?.unwrap_or_default(),
            fill: f.child("fill")?.unwrap_or_default(),
            uuid: f.uuid()?,
        })
    }
}

/// Sheet background: `(fill (color r g b a))`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillColor {
    pub color: Color,
}

impl Default for FillColor {
    fn default() -> Self {
        Self {
            color: Color::TRANSPARENT,
        }
    }
}

impl FromSExp for FillColor {
    const TAG: &'static str = "fill";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            color: f.color("color")?.unwrap_or(Color::TRANSPARENT),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetPin {
    pub name: String,
    pub shape: LabelShape,
    pub at: Position,
    pub effects: Effects,
    pub uuid: Uuid,
}

impl FromSExp for SheetPin {
    const TAG: &'static str = "pin";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let name = f.positional_str("name")?;
        let shape = if f.has_positional() {
            f.positional_keyword("shape")?
        } else {
            LabelShape::default()
        };
        Ok(Self {
            name,
            shape,
            at: f.point3("at")?.unwrap_or_default(),
            effects: f.child("effects")?.unwrap_or_default(),
            uuid: f.uuid()?,
        })
    }
}

/// Hierarchical sheet box referencing another schematic file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub at: Point,
    pub size: Point,
    pub stroke: Stroke,
    pub fill: FillColor,
    pub uuid: Uuid,
    pub property: Vec<SymbolProperty>,
    pub pin: Vec<SheetPin>,
    pub fields_autoplaced: bool,
}

impl Sheet {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.property("Sheet name")
    }

    pub fn sheet_file(&self) -> Option<&str> {
        self.property("Sheet file")
    }
}

impl FromSExp for Sheet {
    const TAG: &'static str = "sheet";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            at: f.point2("at")?.ok_or_else(|| f.missing("at"))?,
            size: f.point2("size")?.ok_or_else(|| f.missing("size"))?,
            stroke: f.child("stroke")?.unwrap_or_default(),
            fill: f.child("fill")?.unwrap_or_default(),
            uuid: f.uuid()?,
            property: f.children("property")?,
            pin: f.children("pin")?,
            fields_autoplaced: f.flag("fields_autoplaced")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEntry {
    pub at: Point,
    pub size: Point,
    pub stroke: Stroke,
    pub uuid: Uuid,
}

impl FromSExp for BusEntry {
    const TAG: &'static str = "bus_entry";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            at: f.point2("at")?.ok_or_else(|| f.missing("at"))?,
            size: f.point2("size")?.ok_or_else(|| f.missing("size"))?,
            stroke: f.child("stroke")?.unwrap_or_default(),
            uuid: f.uuid()?,
        })
    }
}

/// Embedded bitmap, base64 payload split over several strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub at: Point,
    pub scale: Option<f64>,
    pub uuid: Uuid,
    pub data: Vec<String>,
}

impl FromSExp for Image {
    const TAG: &'static str = "image";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let at = f.point2("at")?.ok_or_else(|| f.missing("at"))?;
        let scale = f.number("scale")?;
        let uuid = f.uuid()?;
        let data = match f.take("data")? {
            Some(chunks) => chunks
                .iter()
                .map(|c| c.as_atom().map(str::to_string).ok_or_else(|| f.invalid("data", c)))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            at,
            scale,
            uuid,
            data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusAlias {
    pub name: String,
    pub members: Vec<String>,
}

impl FromSExp for BusAlias {
    const TAG: &'static str = "bus_alias";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let name = f.positional_str("name")?;
        let members = match f.take("members")? {
            Some(items) => items
                .iter()
                .map(|m| m.as_atom().map(str::to_string).ok_or_else(|| f.invalid("members", m)))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self { name, members })
    }
}

/// Whole schematic sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schematic {
    pub version: i64,
    pub generator: String,
    pub uuid: Uuid,
    pub title_block: Option<TitleBlock>,
    pub paper: Paper,
    pub lib_symbols: LibSymbols,
    pub sheet: Vec<Sheet>,
    pub symbol: Vec<SymbolPlaced>,
    pub polyline: Vec<PolyLineTopLevel>,
    pub wire: Vec<Wire>,
    pub bus: Vec<Bus>,
    pub image: Vec<Image>,
    pub junction: Vec<Junction>,
    pub no_connect: Vec<NoConnect>,
    pub bus_entry: Vec<BusEntry>,
    pub text: Vec<LocalLabel>,
    pub label: Vec<LocalLabel>,
    pub hierarchical_label: Vec<HierarchicalLabel>,
    pub global_label: Vec<GlobalLabel>,
    pub sheet_instances: SheetInstances,
    pub symbol_instances: SymbolInstances,
    pub bus_alias: Vec<BusAlias>,
}

impl Default for Schematic {
    fn default() -> Self {
        Self {
            version: SUPPORTED_SCHEMATIC_VERSION,
            generator: "edea".to_string(),
            uuid: Uuid::new_v4(),
            title_block: None,
            paper: Paper::default(),
            lib_symbols: LibSymbols::default(),
            sheet: Vec::new(),
            symbol: Vec::new(),
            polyline: Vec::new(),
            wire: Vec::new(),
            bus: Vec::new(),
            image: Vec::new(),
            junction: Vec::new(),
            no_connect: Vec::new(),
            bus_entry: Vec::new(),
            text: Vec::new(),
            label: Vec::new(),
            hierarchical_label: Vec::new(),
            global_label: Vec::new(),
            sheet_instances: SheetInstances::default(),
            symbol_instances: SymbolInstances::default(),
            bus_alias: Vec::new(),
        }
    }
}

impl FromSExp for Schematic {
    const TAG: &'static str = "kicad_sch";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        // version goes first so old files fail on the version, not on a field
        let version = f.int("version")?.unwrap_or(SUPPORTED_SCHEMATIC_VERSION);
        if version != SUPPORTED_SCHEMATIC_VERSION {
            return Err(ModelError::UnsupportedVersion(version));
        }

        Ok(Self {
            version,
            generator: f.string("generator")?.unwrap_or_else(|| "edea".to_string()),
            uuid: f.uuid()?,
            title_block: f.child("title_block")?,
            paper: f.child("paper")?.unwrap_or_default(),
            lib_symbols: f.child("lib_symbols")?.unwrap_or_default(),
            sheet: f.children("sheet")?,
            symbol: f.children("symbol")?,
            polyline: f.children("polyline")?,
            wire: f.children("wire")?,
            bus: f.children("bus")?,
            image: f.children("image")?,
            junction: f.children("junction")?,
            no_connect: f.children("no_connect")?,
            bus_entry: f.children("bus_entry")?,
            text: f.children("text")?,
            label: f.children("label")?,
            hierarchical_label: f.children("hierarchical_label")?,
            global_label: f.children("global_label")?,
            sheet_instances: f.child("sheet_instances")?.unwrap_or_default(),
            symbol_instances: f.child("symbol_instances")?.unwrap_or_default(),
            bus_alias: f.children("bus_alias")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::sexp::from_str;

    fn parse<T: FromSExp>(text: &str) -> Result<T, ModelError> {
        T::from_sexp(&from_str(text).unwrap())
    }

    #[test]
    fn test_paper_variants() {
        assert_eq!(parse::<Paper>("(paper \"A4\")").unwrap(), Paper::default());
        assert_eq!(
            parse::<Paper>("(paper \"A3\" portrait)").unwrap(),
            Paper::Standard {
                format: PaperFormat::A3,
                portrait: true
            }
        );
        assert_eq!(
            parse::<Paper>("(paper \"User\" 100 80)").unwrap(),
            Paper::User {
                width: 100.0,
                height: 80.0
            }
        );
        assert!(parse::<Paper>("(paper \"A9\")").is_err());
    }

    #[test]
    fn test_placed_symbol() {
        let sym: SymbolPlaced = parse(
            r#"(symbol (lib_id "Device:C") (at 63.5 45.72 90) (mirror x) (unit 1)
                (in_bom yes) (on_board no) (fields_autoplaced)
                (uuid 0b0c4e4f-5a1b-4a4e-9b3c-1d2e3f405162)
                (property "Reference" "C1" (id 0) (at 63.5 40 0))
                (property "Value" "100n" (id 1) (at 63.5 42 0))
                (pin "1" (uuid 6b1a2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d))
                (pin "2" (uuid 7c2b3d4e-5f60-4b7c-9d8e-0f1a2b3c4d5e)))"#,
        )
        .unwrap();
        assert_eq!(sym.lib_id, "Device:C");
        assert_eq!(sym.at, (63.5, 45.72, 90.0));
        assert_eq!(sym.mirror, Some(Mirror::X));
        assert!(sym.in_bom);
        assert!(!sym.on_board);
        assert!(sym.fields_autoplaced);
        assert_eq!(sym.reference(), Some("C1"));
        assert_eq!(sym.property("Value"), Some("100n"));
        assert_eq!(sym.pin.len(), 2);
    }

    #[test]
    fn test_sheet_with_pins() {
        let sheet: Sheet = parse(
            r#"(sheet (at 20 20) (size 15.24 10.16) (fields_autoplaced)
                (stroke (width 0) (type solid) (color 0 0 0 0))
                (fill (color 0 0 0 0.0000))
                (uuid 1a2b3c4d-5e6f-4a7b-8c9d-0e1f2a3b4c5d)
                (property "Sheet name" "power" (id 0) (at 20 19.5 0) (effects (font (size 1.27 1.27)) (justify left bottom)))
                (property "Sheet file" "power.kicad_sch" (id 1) (at 20 31 0) (effects (font (size 1.27 1.27)) (justify left top)))
                (pin "VIN" input (at 20 22.86 180) (effects (font (size 1.27 1.27)) (justify left)) (uuid 2b3c4d5e-6f70-4b8c-9d0e-1f2a3b4c5d6e)))"#,
        )
        .unwrap();
        assert_eq!(sheet.sheet_name(), Some("power"));
        assert_eq!(sheet.sheet_file(), Some("power.kicad_sch"));
        assert_eq!(sheet.pin[0].shape, LabelShape::Input);
        assert_eq!(sheet.stroke.stroke_type, crate::parser::shapes::StrokeType::Solid);
    }

    #[test]
    fn test_sheet_pin_shape_defaults_to_bidirectional() {
        let pin: SheetPin = parse(
            r#"(pin "SDA" (at 20 22.86 180) (uuid 3c4d5e6f-7081-4c9d-8e0f-2a3b4c5d6e7f))"#,
        )
        .unwrap();
        assert_eq!(pin.name, "SDA");
        assert_eq!(pin.shape, LabelShape::Bidirectional);
        assert_eq!(pin.at, (20.0, 22.86, 180.0));

        assert!(parse::<SheetPin>(r#"(pin "SDA" sideways (at 0 0 0))"#).is_err());
    }

    #[test]
    fn test_version_is_checked_first() {
        // the unknown field would fail too, but the version error wins
        let err = parse::<Schematic>("(kicad_sch (version 20200310) (bogus 1))").unwrap_err();
        assert_eq!(err, ModelError::UnsupportedVersion(20200310));
    }

    #[test]
    fn test_minimal_schematic_defaults() {
        let sch: Schematic = parse(
            "(kicad_sch (version 20211123) (generator eeschema) (uuid 9c1d2e3f-4a5b-4c6d-8e7f-0a1b2c3d4e5f) (paper \"A4\") (lib_symbols))",
        )
        .unwrap();
        assert_eq!(sch.generator, "eeschema");
        assert!(sch.symbol.is_empty());
        assert!(sch.title_block.is_none());
        assert!(sch.sheet_instances.path.is_empty());
    }

    #[test]
    fn test_title_block_comments() {
        let tb: TitleBlock = parse(
            "(title_block (title \"Demo\") (rev \"A\") (comment 1 \"first\") (comment 2 \"second\"))",
        )
        .unwrap();
        assert_eq!(tb.title, "Demo");
        assert_eq!(tb.comment.len(), 2);
        assert_eq!(tb.comment[1].number, 2);
        assert_eq!(tb.comment[1].text, "second");
    }

    #[test]
    fn test_bus_alias_and_image() {
        let alias: BusAlias = parse("(bus_alias \"DATA\" (members \"D0\" \"D1\"))").unwrap();
        assert_eq!(alias.members, vec!["D0", "D1"]);

        let image: Image = parse("(image (at 10 10) (scale 0.5) (data \"aGVs\" \"bG8=\"))").unwrap();
        assert_eq!(image.data.len(), 2);
        assert_eq!(image.scale, Some(0.5));
    }
}
