//! Merge example: place several KiCad projects as sub-sheets of a new one.

use edea::prelude::*;
use edea::merge_projects;
use std::path::{Path, PathBuf};

fn main() -> Result<(), EdeaError> {
    let mut args: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example merge_modules <output dir> <project>...");
        std::process::exit(1);
    }
    let output = args.remove(0);
    if !output.exists() {
        std::fs::create_dir_all(&output)?;
    }

    let report = merge_projects(&args, &output, &MergeOptions::default())?;

    println!("Merged {} sheets into {}", report.sheets, report.schematic.display());
    for file in &report.copied {
        println!("  copied {}", file.display());
    }

    summarize(&report.schematic)
}

fn summarize(schematic: &Path) -> Result<(), EdeaError> {
    let mut project = Project::new(schematic);
    project.parse()?;
    let meta = project.metadata()?;

    println!();
    println!("Sheets:       {}", meta.sheets);
    println!("Parts:        {}", meta.count_part);
    println!("Unique parts: {}", meta.count_unique);
    Ok(())
}
