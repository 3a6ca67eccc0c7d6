//! Labelcrop: crop LabelMe datasets around parent annotations.
//!
//! Given a parent label such as `person`, labelcrop finds every parent
//! instance in a directory of LabelMe-annotated images, crops each image
//! around the padded parent box and rewrites the overlapping child
//! annotations into the crop's coordinate space. The result is a new,
//! smaller dataset in the same format.
//!
//! # Modules
//!
//! - [`ir`]: Typed shapes, boxes and the LabelMe reader/writer
//! - [`scan`]: Dataset discovery
//! - [`matcher`]: Parent/child association
//! - [`geometry`]: Padded, clipped crop rectangles
//! - [`remap`]: Source-to-crop coordinate remapping
//! - [`crop`]: The batch crop-and-remap pipeline
//! - [`preview`]: Annotation overlays for inspection
//! - [`error`]: Error types

pub mod crop;
pub mod error;
pub mod geometry;
pub mod ir;
pub mod matcher;
pub mod preview;
pub mod remap;
pub mod report;
pub mod scan;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use crop::{crop_and_remap, CropOptions, CropReport};
pub use error::LabelcropError;
pub use preview::{generate_annotated_previews, PreviewOptions, PreviewReport};

use matcher::ChildRetention;

/// The labelcrop CLI application.
#[derive(Parser)]
#[command(name = "labelcrop")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Crop every parent instance and remap its child annotations.
    Crop(CropArgs),
    /// Render annotation overlays for a random sample of images.
    Preview(PreviewArgs),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(clap::Args)]
struct CropArgs {
    /// Directory of images with sibling LabelMe JSON files.
    source: PathBuf,

    /// Directory to write cropped images and annotations into.
    output: PathBuf,

    /// Label of the shapes to crop around.
    #[arg(long, short = 'p', env = "LABELCROP_PARENT")]
    parent: String,

    /// Only keep parents overlapping at least one of these labels (repeatable).
    #[arg(long = "require", short = 'r', value_name = "LABEL")]
    required: Vec<String>,

    /// Multiplicative padding around the parent box (1.0 = tight).
    #[arg(long, default_value_t = crop::DEFAULT_PADDING_FACTOR)]
    padding: f64,

    /// Do not write the parent shape into the cropped annotation.
    #[arg(long)]
    exclude_parent: bool,

    /// Keep only children whose label is one of the required labels.
    #[arg(long, requires = "required")]
    required_only: bool,

    /// Descend into subdirectories, mirroring them under the output.
    #[arg(long)]
    recursive: bool,

    /// Report format.
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

#[derive(clap::Args)]
struct PreviewArgs {
    /// Directory of images with sibling LabelMe JSON files.
    source: PathBuf,

    /// Directory to write rendered previews into.
    temp_dir: PathBuf,

    /// Number of images to render.
    #[arg(long, short = 'n', default_value_t = 4)]
    num_previews: usize,

    /// Seed for a reproducible sample.
    #[arg(long)]
    seed: Option<u64>,

    /// TrueType/OpenType font for label text.
    #[arg(long, env = "LABELCROP_FONT")]
    font: Option<PathBuf>,

    /// Descend into subdirectories.
    #[arg(long)]
    recursive: bool,

    /// Report format.
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

/// Run the labelcrop CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelcropError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Crop(args)) => run_crop(args),
        Some(Commands::Preview(args)) => run_preview(args),
        None => {
            println!("labelcrop {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Crop LabelMe datasets around parent annotations.");
            println!();
            println!("Run 'labelcrop --help' for usage information.");
            Ok(())
        }
    }
}

fn run_crop(args: CropArgs) -> Result<(), LabelcropError> {
    let mut opts = CropOptions::new(args.source, args.output, args.parent)
        .with_required(args.required)
        .with_padding(args.padding);
    opts.include_parent = !args.exclude_parent;
    opts.recursive = args.recursive;
    if args.required_only {
        opts.child_retention = ChildRetention::RequiredOnly;
    }

    let report = crop_and_remap(&opts)?;
    emit(&report, args.output_format)
}

fn run_preview(args: PreviewArgs) -> Result<(), LabelcropError> {
    let mut opts = PreviewOptions::new(args.source, args.temp_dir, args.num_previews);
    opts.seed = args.seed;
    opts.font_path = args.font;
    opts.recursive = args.recursive;

    let report = generate_annotated_previews(&opts)?;
    emit(&report, args.output_format)
}

fn emit<T: Serialize + std::fmt::Display>(
    report: &T,
    format: OutputFormat,
) -> Result<(), LabelcropError> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}
