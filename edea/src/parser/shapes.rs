//! Graphic items shared by library symbols and sheets.

use serde::{Deserialize, Serialize};

use crate::parser::fields::{keyword_enum, Color, Fields, FromSExp, ModelError};

pub type Point = (f64, f64);

keyword_enum! {
    FillType {
        None => "none",
        Outline => "outline",
        Background => "background",
    } default None
}

keyword_enum! {
    StrokeType {
        Default => "default",
        Dash => "dash",
        DashDot => "dash_dot",
        DashDotDot => "dash_dot_dot",
        Dot => "dot",
        Solid => "solid",
    } default Default
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f64,
    #[serde(rename = "type")]
    pub stroke_type: StrokeType,
    pub color: Color,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            width: 0.1524,
            stroke_type: StrokeType::Default,
            color: Color::BLACK,
        }
    }
}

impl FromSExp for Stroke {
    const TAG: &'static str = "stroke";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        let default = Stroke::default();
        Ok(Self {
            width: f.number("width")?.unwrap_or(default.width),
            stroke_type: f.keyword("type")?.unwrap_or_default(),
            color: f.color("color")?.unwrap_or(default.color),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    #[serde(rename = "type")]
    pub fill_type: FillType,
}

impl FromSExp for Fill {
    const TAG: &'static str = "fill";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            fill_type: f.keyword("type")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xy {
    pub x: f64,
    pub y: f64,
}

impl FromSExp for Xy {
    const TAG: &'static str = "xy";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            x: f.positional_f64("x")?,
            y: f.positional_f64("y")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pts {
    pub xy: Vec<Xy>,
}

impl FromSExp for Pts {
    const TAG: &'static str = "pts";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            xy: f.children("xy")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyLine {
    pub pts: Pts,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSExp for PolyLine {
    const TAG: &'static str = "polyline";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            pts: f.child("pts")?.unwrap_or_default(),
            stroke: f.child("stroke")?.unwrap_or_default(),
            fill: f.child("fill")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bezier {
    pub pts: Pts,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSExp for Bezier {
    const TAG: &'static str = "bezier";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            pts: f.child("pts")?.unwrap_or_default(),
            stroke: f.child("stroke")?.unwrap_or_default(),
            fill: f.child("fill")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub start: Point,
    pub end: Point,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSExp for Rectangle {
    const TAG: &'static str = "rectangle";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            start: f.point2("start")?.ok_or_else(|| f.missing("start"))?,
            end: f.point2("end")?.ok_or_else(|| f.missing("end"))?,
            stroke: f.child("stroke")?.unwrap_or_default(),
            fill: f.child("fill")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: f64,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSExp for Circle {
    const TAG: &'static str = "circle";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            center: f.point2("center")?.ok_or_else(|| f.missing("center"))?,
            radius: f.number("radius")?.ok_or_else(|| f.missing("radius"))?,
            stroke: f.child("stroke")?.unwrap_or_default(),
            fill: f.child("fill")?.unwrap_or_default(),
        })
    }
}

/// Older arc notation: centre, radius and start/end angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Radius {
    pub at: Point,
    pub length: f64,
    pub angles: Point,
}

impl FromSExp for Radius {
    const TAG: &'static str = "radius";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            at: f.point2("at")?.ok_or_else(|| f.missing("at"))?,
            length: f.number("length")?.ok_or_else(|| f.missing("length"))?,
            angles: f.point2("angles")?.ok_or_else(|| f.missing("angles"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub start: Point,
    pub end: Point,
    pub mid: Option<Point>,
    pub radius: Option<Radius>,
    pub stroke: Stroke,
    pub fill: Fill,
}

impl FromSExp for Arc {
    const TAG: &'static str = "arc";

    fn from_fields(f: &mut Fields<'_>) -> Result<Self, ModelError> {
        Ok(Self {
            start: f.point2("start")?.ok_or_else(|| f.missing("start"))?,
            end: f.point2("end")?.ok_or_else(|| f.missing("end"))?,
            mid: f.point2("mid")?,
            radius: f.child("radius")?,
            stroke: f.child("stroke")?.unwrap_or_default(),
            fill: f.child("fill")?.unwrap_or_default(),
        })
    }
}
