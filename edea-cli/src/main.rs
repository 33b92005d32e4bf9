//! edea CLI - parse, merge and extract metadata from KiCad projects.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use edea::{merge_projects, EdeaError, MergeOptions, Pcb, Project, Schematic};
use std::path::{Path, PathBuf};
use std::process;
use tracing::level_filters::LevelFilter;

/// Invalid argument (EINVAL).
const EXIT_INVALID_ARGUMENT: i32 = 22;
/// Output path is not a directory (ENOTDIR).
const EXIT_NOT_A_DIRECTORY: i32 = 20;
/// No such file or directory (ENOENT).
const EXIT_NO_SUCH_FILE: i32 = 2;

#[derive(Parser)]
#[command(name = "edea")]
#[command(about = "Tool to parse, merge and extract metadata from KiCad projects", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract metadata from a KiCad project as JSON
    ExtractMeta {
        /// Project file (.kicad_pro) or project directory
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Write the JSON to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Merge KiCad projects into one hierarchical project
    Merge {
        /// Project files (.kicad_pro) or project directories
        #[arg(value_name = "PROJECTS", required = true)]
        projects: Vec<PathBuf>,

        /// Existing output directory; the merged project is named after it
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Gap between placed sheets in mm
        #[arg(long, default_value_t = 20.0)]
        spacing: f64,

        /// Start a new row of sheets right of this x position (mm)
        #[arg(long, default_value_t = 270.0)]
        wrap_width: f64,
    },

    /// Parse a schematic or board file
    Parse {
        /// Path to .kicad_sch or .kicad_pcb file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Summary,
    /// Full JSON dump
    Json,
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn init_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::ExtractMeta { project, output } => handle_extract_meta(&project, output.as_deref()),
        Commands::Merge {
            projects,
            output,
            spacing,
            wrap_width,
        } => {
            let options = MergeOptions {
                spacing,
                wrap_width,
                ..MergeOptions::default()
            };
            handle_merge(&projects, &output, &options)
        }
        Commands::Parse { file, format } => handle_parse(&file, format),
    };

    process::exit(exit_code);
}

fn handle_extract_meta(project: &Path, output: Option<&Path>) -> i32 {
    match extract_meta(project, output) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<EdeaError>() {
                Some(EdeaError::InvalidProject(_)) => EXIT_INVALID_ARGUMENT,
                _ => 1,
            }
        }
    }
}

fn extract_meta(project: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    if !is_project_argument(project) {
        return Err(EdeaError::InvalidProject(project.to_path_buf()).into());
    }

    let mut project = Project::from_path(project)?;
    project.parse()?;
    let metadata = project.metadata()?;
    let json = serde_json::to_string(&metadata)?;

    match output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

/// A `.kicad_pro` file or a directory, like the merge inputs.
fn is_project_argument(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("kicad_pro") || path.is_dir()
}

fn handle_merge(projects: &[PathBuf], output: &Path, options: &MergeOptions) -> i32 {
    match merge_projects(projects, output, options) {
        Ok(report) => {
            println!(
                "Merged {} sheets into {}",
                report.sheets,
                report.schematic.display()
            );
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                EdeaError::NotADirectory(_) => EXIT_NOT_A_DIRECTORY,
                EdeaError::InvalidProject(_) => EXIT_NO_SUCH_FILE,
                _ => 1,
            }
        }
    }
}

fn handle_parse(file: &Path, format: OutputFormat) -> i32 {
    let result = match file.extension().and_then(|s| s.to_str()) {
        Some("kicad_sch") => parse_schematic(file, &format),
        Some("kicad_pcb") => parse_board(file, &format),
        _ => {
            eprintln!("Error: File must be .kicad_sch or .kicad_pcb");
            return 1;
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn parse_schematic(file: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let schematic = edea::parse_schematic(file)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schematic)?),
        OutputFormat::Summary => output_schematic_summary(file, &schematic),
    }
    Ok(())
}

fn output_schematic_summary(file: &Path, sch: &Schematic) {
    println!("File: {}", file.display());
    println!("{}", "─".repeat(60));
    println!("  Version:       {}", sch.version);
    println!("  Generator:     {}", sch.generator);
    if let Some(title) = sch.title_block.as_ref().filter(|t| !t.title.is_empty()) {
        println!("  Title:         {}", title.title);
    }
    println!("  Symbols:       {}", sch.symbol.len());
    println!("  Library parts: {}", sch.lib_symbols.symbol.len());
    println!("  Sheets:        {}", sch.sheet.len());
    println!("  Wires:         {}", sch.wire.len());
    println!(
        "  Labels:        {} local, {} global, {} hierarchical",
        sch.label.len(),
        sch.global_label.len(),
        sch.hierarchical_label.len()
    );

    let mut references: Vec<&str> = sch
        .symbol
        .iter()
        .filter_map(|s| s.reference())
        .filter(|r| !r.starts_with('#'))
        .collect();
    references.sort_unstable();
    if !references.is_empty() {
        println!("  References:    {}", references.join(", "));
    }
}

fn parse_board(file: &Path, format: &OutputFormat) -> anyhow::Result<()> {
    let pcb = Pcb::load(file)?;
    let bbox = pcb.bounding_box()?;
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "footprints": pcb.footprint_count(),
                "bounding_box": {
                    "min": bbox.min(),
                    "max": bbox.max(),
                    "width": bbox.width(),
                    "height": bbox.height(),
                    "area": bbox.area(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Summary => {
            println!("File: {}", file.display());
            println!("{}", "─".repeat(60));
            println!("  Footprints:    {}", pcb.footprint_count());
            println!("  Bounding box:  {}", bbox);
            println!("  Size:          {:.3} x {:.3} mm", bbox.width(), bbox.height());
        }
    }
    Ok(())
}
