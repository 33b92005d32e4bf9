//! Minimal `.kicad_pro` generation.

use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tracing::debug;

use crate::core::EdeaError;

/// Project JSON KiCad 6 opens without complaints: no sheets, no boards and
/// only the default net class.
pub fn empty_project(name: &str) -> Value {
    json!({
        "board": {
            "design_settings": {},
            "layer_presets": []
        },
        "boards": [],
        "libraries": {
            "pinned_footprint_libs": [],
            "pinned_symbol_libs": []
        },
        "meta": {
            "filename": format!("{}.kicad_pro", name),
            "version": 1
        },
        "net_settings": {
            "classes": [
                {
                    "bus_width": 12.0,
                    "clearance": 0.2,
                    "diff_pair_gap": 0.25,
                    "diff_pair_via_gap": 0.25,
                    "diff_pair_width": 0.2,
                    "line_style": 0,
                    "microvia_diameter": 0.3,
                    "microvia_drill": 0.1,
                    "name": "Default",
                    "pcb_color": "rgba(0, 0, 0, 0.000)",
                    "schematic_color": "rgba(0, 0, 0, 0.000)",
                    "track_width": 0.25,
                    "via_diameter": 0.8,
                    "via_drill": 0.4,
                    "wire_width": 6.0
                }
            ],
            "meta": {
                "version": 2
            },
            "net_colors": null
        },
        "pcbnew": {
            "page_layout_descr_file": ""
        },
        "schematic": {
            "legacy_lib_dir": "",
            "legacy_lib_list": []
        },
        "sheets": [],
        "text_variables": {}
    })
}

/// Write `<dir>/<name>.kicad_pro` and return its path.
pub fn write_project_file(dir: &Path, name: &str) -> Result<PathBuf, EdeaError> {
    let path = dir.join(format!("{}.kicad_pro", name));
    let content = serde_json::to_string_pretty(&empty_project(name))?;
    std::fs::write(&path, content + "\n")?;
    debug!("Wrote project file {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_project_names_itself() {
        let project = empty_project("merged");
        assert_eq!(project["meta"]["filename"], "merged.kicad_pro");
        assert_eq!(project["meta"]["version"], 1);
        assert_eq!(project["sheets"].as_array().map(Vec::len), Some(0));
        assert_eq!(project["net_settings"]["classes"][0]["name"], "Default");
    }

    #[test]
    fn test_write_project_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_project_file(dir.path(), "out").unwrap();
        assert_eq!(path, dir.path().join("out.kicad_pro"));

        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, empty_project("out"));
    }
}
