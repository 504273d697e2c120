//! ndpa: read and write Hamamatsu NDP.view annotation files.
//!
//! NDP.view stores slide annotations next to the `.ndpi` image in a
//! `<slide>.ndpi.ndpa` XML file, with coordinates in nanometres measured from
//! the centre of the glass slide. This crate converts those records to and
//! from pixel-space annotations, so that other viewers can show and edit
//! them and write them back in a form NDP.view accepts.
//!
//! # Modules
//!
//! - [`ir`]: Annotation types plus the NDPA XML and annotation JSON formats
//! - [`slide`]: Slide calibration and centre-offset resolution
//! - [`transform`]: Physical ⇄ pixel coordinate mapping
//! - [`geometry`]: Simplification and ring extraction before export
//! - [`conversion`]: Record decoding/encoding and conversion reports
//! - [`session`]: File-level import and export with backups
//! - [`error`]: Error types for ndpa operations
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use ndpa::ir::AnnotationSet;
//! use ndpa::session::NdpaSession;
//! use ndpa::slide::SlideCalibration;
//!
//! let calibration = SlideCalibration::new(51200, 38400).with_pixel_size_um(0.2275, 0.2275);
//! let session = NdpaSession::new("slide.ndpi", calibration, BTreeMap::<String, String>::new());
//!
//! let mut annotations = AnnotationSet::new();
//! let report = session.import(&mut annotations, Some("Tumor"))?;
//! println!("{report}");
//! # Ok::<(), ndpa::NdpaError>(())
//! ```

pub mod conversion;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod session;
pub mod slide;
pub mod transform;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use conversion::{ConversionOptions, ConversionReport};
pub use error::NdpaError;
use session::NdpaSession;

/// The ndpa CLI application.
#[derive(Parser)]
#[command(name = "ndpa")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Read a slide's .ndpa file into annotation JSON.
    Import(ImportArgs),
    /// Write annotation JSON to a slide's .ndpa file.
    Export(ExportArgs),
}

/// Slide arguments shared by both subcommands.
#[derive(clap::Args)]
struct SlideArgs {
    /// Path to the .ndpi slide. The annotation file is <SLIDE>.ndpa.
    slide: PathBuf,

    /// JSON or YAML file with the slide's size, pixel size and properties.
    #[arg(long, env = "NDPA_SLIDE_INFO")]
    slide_info: PathBuf,

    /// Report format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Exit non-zero if the conversion produced any warning.
    #[arg(long)]
    strict: bool,
}

/// Arguments for the import subcommand.
#[derive(clap::Args)]
struct ImportArgs {
    #[command(flatten)]
    common: SlideArgs,

    /// Classification assigned to every imported annotation.
    #[arg(long = "class")]
    classification: Option<String>,

    /// Write annotation JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Mirror freehand coordinates vertically (for rotated scans).
    #[arg(long)]
    rotated: bool,
}

/// Arguments for the export subcommand.
#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    common: SlideArgs,

    /// Annotation JSON to export.
    #[arg(short, long)]
    input: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the ndpa CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), NdpaError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Import(args)) => run_import(args),
        Some(Commands::Export(args)) => run_export(args),
        None => {
            println!("ndpa {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Read and write Hamamatsu NDP.view annotation files.");
            println!();
            println!("Run 'ndpa --help' for usage information.");
            Ok(())
        }
    }
}

fn open_session(
    args: &SlideArgs,
    options: ConversionOptions,
) -> Result<NdpaSession<slide::SlideInfo>, NdpaError> {
    let info = slide::read_slide_info(&args.slide_info)?;
    let calibration = info.calibration();
    Ok(NdpaSession::new(&args.slide, calibration, info).with_options(options))
}

fn run_import(args: ImportArgs) -> Result<(), NdpaError> {
    let options = ConversionOptions {
        rotated: args.rotated,
        ..ConversionOptions::default()
    };
    let session = open_session(&args.common, options)?;

    let mut annotations = ir::AnnotationSet::new();
    let report = session.import(&mut annotations, args.classification.as_deref())?;

    match &args.output {
        Some(path) => {
            ir::io_json::write_annotations_json(path, &annotations)?;
            print_report(&report, args.common.report, false)?;
        }
        None => {
            // stdout carries the annotations, so the report goes to stderr.
            let json = ir::io_json::to_json_string(&annotations).map_err(|source| {
                NdpaError::AnnotationJsonWrite {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            println!("{json}");
            print_report(&report, args.common.report, true)?;
        }
    }

    finish(&report, args.common.strict)
}

fn run_export(args: ExportArgs) -> Result<(), NdpaError> {
    let session = open_session(&args.common, ConversionOptions::default())?;
    let annotations = ir::io_json::read_annotations_json(&args.input)?;

    let report = session.export(&annotations)?;
    print_report(&report, args.common.report, false)?;

    finish(&report, args.common.strict)
}

fn print_report(
    report: &ConversionReport,
    format: ReportFormat,
    to_stderr: bool,
) -> Result<(), NdpaError> {
    let text = match format {
        ReportFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(report).map_err(NdpaError::ReportSerialize)?;
            json.push('\n');
            json
        }
        ReportFormat::Text => format!("Converted:\n{report}"),
    };

    if to_stderr {
        eprint!("{text}");
    } else {
        print!("{text}");
    }
    Ok(())
}

fn finish(report: &ConversionReport, strict: bool) -> Result<(), NdpaError> {
    let warning_count = report.warning_count();
    if strict && warning_count > 0 {
        Err(NdpaError::StrictWarnings { warning_count })
    } else {
        Ok(())
    }
}
