//! Loading KiCad files from disk or memory.

use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::parser::fields::{FromSExp, ModelError};
use crate::parser::format_detector::{detect_format, FileKind};
use crate::parser::schema::Schematic;
use crate::parser::sexp::{ParseError, SExp, SExpParser};

#[derive(Debug, Error)]
pub enum KicadError {
    #[error("S-expression parse error: {0}")]
    SExp(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Schematic model error: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid KiCad format: {0}")]
    InvalidFormat(String),
    #[error("Legacy KiCad format is not supported: {0}")]
    LegacyFormat(String),
}

/// Reader for KiCad 6 schematic files.
pub struct KicadParser;

impl KicadParser {
    /// Read any S-expression file into an untyped tree.
    pub fn read_expr(path: &Path) -> Result<SExp, KicadError> {
        debug!("Reading {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::read_expr_str(&content)
    }

    pub fn read_expr_str(content: &str) -> Result<SExp, KicadError> {
        let mut parser = SExpParser::new(content);
        Ok(parser.parse()?)
    }

    /// Parse a `.kicad_sch` file into the typed model.
    pub fn parse_schematic(path: &Path) -> Result<Schematic, KicadError> {
        debug!("Parsing schematic {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse_schematic_str(&content)
    }

    pub fn parse_schematic_str(content: &str) -> Result<Schematic, KicadError> {
        let format = detect_format(content)?;
        if format.kind != FileKind::Schematic {
            return Err(KicadError::InvalidFormat(format!(
                "Expected {}, found {}",
                FileKind::Schematic.root_tag(),
                format.kind.root_tag()
            )));
        }

        let root = Self::read_expr_str(content)?;
        Ok(Schematic::from_sexp(&root)?)
    }
}

impl FromStr for Schematic {
    type Err = KicadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KicadParser::parse_schematic_str(s)
    }
}
