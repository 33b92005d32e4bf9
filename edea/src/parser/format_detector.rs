//! KiCad file format detection.
//!
//! Only the S-expression formats of KiCad 6 and later are handled. Legacy
//! `EESchema`/`PCBNEW` text files are recognised so they can be rejected
//! with a clear error instead of a tokenizer failure.

use serde::Serialize;

use crate::parser::kicad::KicadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileKind {
    Schematic,
    Pcb,
}

impl FileKind {
    pub fn root_tag(self) -> &'static str {
        match self {
            FileKind::Schematic => "kicad_sch",
            FileKind::Pcb => "kicad_pcb",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileFormat {
    pub kind: FileKind,
    /// Value of the top-level `(version ...)`, when it can be found.
    pub version: Option<u32>,
}

/// How far into the file the `(version ...)` field is searched for.
const HEADER_WINDOW: usize = 256;

/// Detect the file kind and version from the file head.
pub fn detect_format(content: &str) -> Result<FileFormat, KicadError> {
    let head = content.trim_start();

    if head.starts_with("EESchema") || head.starts_with("PCBNEW") {
        let first_line = head.lines().next().unwrap_or_default();
        return Err(KicadError::LegacyFormat(first_line.to_string()));
    }

    let kind = if head.starts_with("(kicad_sch") {
        FileKind::Schematic
    } else if head.starts_with("(kicad_pcb") {
        FileKind::Pcb
    } else {
        let preview: String = head.chars().take(32).collect();
        return Err(KicadError::InvalidFormat(format!(
            "Not a KiCad schematic or board: {}",
            preview
        )));
    };

    Ok(FileFormat {
        kind,
        version: header_version(head),
    })
}

fn header_version(head: &str) -> Option<u32> {
    let mut end = head.len().min(HEADER_WINDOW);
    while !head.is_char_boundary(end) {
        end -= 1;
    }
    let window = &head[..end];
    let start = window.find("(version")? + "(version".len();
    window[start..]
        .trim_start()
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|digits| digits.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_schematic_version() {
        let format = detect_format("(kicad_sch (version 20211123) (generator eeschema))").unwrap();
        assert_eq!(format.kind, FileKind::Schematic);
        assert_eq!(format.version, Some(20211123));
    }

    #[test]
    fn test_detect_pcb_with_leading_whitespace() {
        let format = detect_format("\n  (kicad_pcb (version 20211014) (generator pcbnew)\n)").unwrap();
        assert_eq!(format.kind, FileKind::Pcb);
        assert_eq!(format.version, Some(20211014));
    }

    #[test]
    fn test_missing_version() {
        let format = detect_format("(kicad_sch (paper \"A4\"))").unwrap();
        assert_eq!(format.version, None);
    }

    #[test]
    fn test_legacy_files_rejected() {
        let err = detect_format("EESchema Schematic File Version 4\nLIBS:power\n").unwrap_err();
        assert!(matches!(err, KicadError::LegacyFormat(ref line) if line == "EESchema Schematic File Version 4"));

        let err = detect_format("PCBNEW-BOARD Version 1 date 2019\n").unwrap_err();
        assert!(matches!(err, KicadError::LegacyFormat(_)));
    }

    #[test]
    fn test_unknown_content() {
        assert!(matches!(
            detect_format("{\"meta\": {}}"),
            Err(KicadError::InvalidFormat(_))
        ));
    }
}
