//! Library symbols as embedded in the `lib_symbols` section of a schematic,
//! plus the text effects shared with the rest of the sheet.

use serde::{Deserialize, Serialize};

use crate::parser::fields::{keyword_enum, Fields, FromSExp, Keyword, ModelError};
use crate::parser::sexp::SExp;
use crate::parser::shapes::{Arc, Bezier, Circle, Point, PolyLine, Rectangle};

pub type Position = (f64, f64, f64);

keyword_enum! {
    JustifyHoriz {
        Left => "left",
        Center => "center",
        Right => "right",
    } default Center
}

keyword_enum! {
    JustifyVert {
        Top => "top",
        Center => "center",
        Bottom => "bottom",
    } default Center
}

keyword_enum! {
    PinElectricalType {
        Input => "input",
        Output => "output",
        Bidirectional => "bidirectional",
        TriState => "tri_state",
        Passive => "passive",
        Free => "free",
        Unspecified => "unspecified",
        PowerIn => "power_in",
        PowerOut => "power_out",
        OpenCollector => "open_collector",
        OpenEmitter => "open_emitter",
        NoConnect => "no_connect",
    } default Unspecified
}

keyword_enum! {
    PinGraphicStyle {
        Line => "line",
        Inverted => "inverted",
        Clock => "clock",
        InvertedClock => "inverted_clock",
        InputLow => "input_low",
        ClockLow => "clock_low",
        OutputLow => "output_low",
        EdgeClockHigh => "edge_clock_high",
        NonLogic => "non_logic",
    } default Line
}

/// `(justify left bottom mirror)`; any subset, in any order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Justify {
    pub horizontal: JustifyHoriz,
    pub vertical: JustifyVert,
    pub mirror: bool,
}

impl FromSExp for Justify {
    const TAG: &'static str = "justify";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let mut justify = Justify::default();
        while let Some(word) = f.opt_positional() {
            let text = word.as_atom().unwrap_or_default();
            if text == "mirror" {
                justify.mirror = true;
            } else if let Some(h) = JustifyHoriz::from_keyword(text) {
                justify.horizontal = h;
            } else if let Some(v) = JustifyVert::from_keyword(text) {
                justify.vertical = v;
            } else {
                return Err(f.invalid("justify", word));
            }
        }
        Ok(justify)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub size: Point,
    pub thickness: Option<f64>,
    pub italic: bool,
    pub bold: bool,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            size: (1.27, 1.27),
            thickness: None,
            italic: false,
            bold: false,
        }
    }
}

impl FromSExp for Font {
    const TAG: &'static str = "font";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            size: f.point2("size")?.unwrap_or((1.27, 1.27)),
            thickness: f.number("thickness")?,
            italic: f.flag("italic")?,
            bold: f.flag("bold")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    pub font: Font,
    pub justify: Justify,
    pub hide: bool,
}

impl FromSExp for Effects {
    const TAG: &'static str = "effects";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            font: f.child("font")?.unwrap_or_default(),
            justify: f.child("justify")?.unwrap_or_default(),
            hide: f.flag("hide")?,
        })
    }
}

/// `(property "Key" "Value" (id 0) (at x y angle) (effects ...))`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SymbolProperty {
    pub key: String,
    pub value: String,
    pub id: i64,
    pub at: Position,
    pub effects: Effects,
}

impl FromSExp for SymbolProperty {
    const TAG: &'static str = "property";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            key: f.positional_str("key")?,
            value: f.positional_str("value")?,
            id: f.int("id")?.unwrap_or(0),
            at: f.point3("at")?.unwrap_or_default(),
            effects: f.child("effects")?.unwrap_or_default(),
        })
    }
}

/// Pin name or number label: `(name "~" (effects ...))`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinText {
    pub text: String,
    pub effects: Effects,
}

impl FromSExp for PinText {
    const TAG: &'static str = "name";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            text: f.positional_str("text")?,
            effects: f.child("effects")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinAlternate {
    pub name: String,
    pub electrical_type: PinElectricalType,
    pub graphic_style: PinGraphicStyle,
}

impl FromSExp for PinAlternate {
    const TAG: &'static str = "alternate";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            name: f.positional_str("name")?,
            electrical_type: f.positional_keyword("electrical_type")?,
            graphic_style: f.positional_keyword("graphic_style")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub electrical_type: PinElectricalType,
    pub graphic_style: PinGraphicStyle,
    pub at: Position,
    pub length: f64,
    pub hide: bool,
    pub name: PinText,
    pub number: PinText,
    pub alternate: Vec<PinAlternate>,
}

impl FromSExp for Pin {
    const TAG: &'static str = "pin";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let electrical_type = if f.has_positional() {
            f.positional_keyword("electrical_type")?
        } else {
            PinElectricalType::default()
        };
        let graphic_style = if f.has_positional() {
            f.positional_keyword("graphic_style")?
        } else {
            PinGraphicStyle::default()
        };
        Ok(Self {
            electrical_type,
            graphic_style,
            at: f.point3("at")?.unwrap_or_default(),
            length: f.number("length")?.unwrap_or(0.0),
            hide: f.flag("hide")?,
            name: f.child("name")?.unwrap_or_default(),
            number: f.child("number")?.unwrap_or_default(),
            alternate: f.children("alternate")?,
        })
    }
}

/// `(pin_names (offset 0.254) hide)` or just `(pin_names hide)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinNameSettings {
    pub offset: Option<f64>,
    pub hide: bool,
}

impl FromSExp for PinNameSettings {
    const TAG: &'static str = "pin_names";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let hide_positional = take_hide_word(f)?;
        Ok(Self {
            offset: f.number("offset")?,
            hide: hide_positional || f.flag("hide")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinNumberSettings {
    pub hide: bool,
}

impl FromSExp for PinNumberSettings {
    const TAG: &'static str = "pin_numbers";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let hide_positional = take_hide_word(f)?;
        Ok(Self {
            hide: hide_positional || f.flag("hide")?,
        })
    }
}

/// A leading `hide` word lands in the positional slot.
fn take_hide_word(f: &mut Fields<'_>) -> Result<bool, ModelError> {
    match f.peek_positional() {
        Some(SExp::Atom(word)) if word == "hide" => {
            f.opt_positional();
            Ok(true)
        }
        Some(other) => Err(f.invalid("hide", other)),
        None => Ok(false),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolGraphicText {
    pub text: String,
    pub at: Position,
    pub effects: Effects,
}

impl FromSExp for SymbolGraphicText {
    const TAG: &'static str = "text";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            text: f.positional_str("text")?,
            at: f.point3("at")?.ok_or_else(|| f.missing("at"))?,
            effects: f.child("effects")?.unwrap_or_default(),
        })
    }
}

/// Library symbol; units and body styles nest as child symbols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub property: Vec<SymbolProperty>,
    pub pin_names: PinNameSettings,
    pub pin_numbers: PinNumberSettings,
    pub in_bom: bool,
    pub on_board: bool,
    pub power: bool,
    pub pin: Vec<Pin>,
    pub symbol: Vec<Symbol>,
    pub polyline: Vec<PolyLine>,
    pub bezier: Vec<Bezier>,
    pub text: Vec<SymbolGraphicText>,
    pub rectangle: Vec<Rectangle>,
    pub circle: Vec<Circle>,
    pub arc: Vec<Arc>,
}

impl Symbol {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.property
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Pins of this symbol and all of its units.
    pub fn all_pins(&self) -> Vec<&Pin> {
        let mut pins: Vec<&Pin> = self.pin.iter().collect();
        for unit in &self.symbol {
            pins.extend(unit.all_pins());
        }
        pins
    }
}

impl FromSExp for Symbol {
    const TAG: &'static str = "symbol";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            name: f.positional_str("name")?,
            property: f.children("property")?,
            pin_names: f.child("pin_names")?.unwrap_or_default(),
            pin_numbers: f.child("pin_numbers")?.unwrap_or_default(),
            in_bom: f.yes_no("in_bom")?.unwrap_or(true),
            on_board: f.yes_no("on_board")?.unwrap_or(true),
            power: f.flag("power")?,
            pin: f.children("pin")?,
            symbol: f.children("symbol")?,
            polyline: f.children("polyline")?,
            bezier: f.children("bezier")?,
            text: f.children("text")?,
            rectangle: f.children("rectangle")?,
            circle: f.children("circle")?,
            arc: f.children("arc")?,
        })
    }
}
