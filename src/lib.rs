//! tfshard: JSON-lines box annotations to sharded TFRecords.
//!
//! tfshard reads an object-annotation dataset stored as JSON lines (image
//! path, one box, one class per line) and writes it as `tf.train.Example`
//! records spread over fixed-size TFRecord shards, plus a label map
//! descriptor. It can also read the shards back for inspection.
//!
//! # Modules
//!
//! - [`annotation`]: JSON-lines input and typed bounding boxes
//! - [`labels`]: Label map construction and the `.pbtxt` descriptor
//! - [`record`]: Annotation to `Example` encoding and decoding
//! - [`tfrecord`]: Record framing, the `Example` schema, sharded output
//! - [`convert`]: The conversion driver
//! - [`inspect`]: Shard inspection
//! - [`error`]: Error types for tfshard operations

pub mod annotation;
pub mod convert;
pub mod error;
pub mod inspect;
pub mod labels;
pub mod record;
pub mod tfrecord;

#[cfg(test)]
mod testutil;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::TfshardError;

use annotation::BboxUnits;
use convert::{ConvertConfig, DEFAULT_BATCH_SIZE};
use inspect::InspectOptions;
use labels::DuplicatePolicy;

/// The tfshard CLI application.
///
/// Without a subcommand the top-level flags describe a conversion run;
/// `inspect` reads shards back.
#[derive(Parser)]
#[command(name = "tfshard")]
#[command(version, author, about)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    convert: ConvertArgs,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Decode shard files and summarize their records.
    Inspect(InspectArgs),
}

/// Conversion flags.
///
/// The paths are `Option` only so that clap can leave them unset when a
/// subcommand runs instead; without one, clap enforces them.
#[derive(clap::Args)]
struct ConvertArgs {
    /// JSON-lines annotation file (image paths are relative to its directory).
    #[arg(long, required = true)]
    annotations_file: Option<PathBuf>,

    /// Number of records per shard.
    #[arg(long, env = "TFSHARD_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Directory for the shards and label map (created if missing).
    #[arg(long, required = true)]
    out_dir: Option<PathBuf>,

    /// Class list, one name per line, in label id order.
    #[arg(long, required = true)]
    labels_file: Option<PathBuf>,

    /// Convert at most this many records (default: all).
    #[arg(long)]
    limit: Option<usize>,

    /// Units of the annotation boxes.
    #[arg(long, value_enum, default_value_t = BboxUnitsArg::Pixel)]
    bbox_units: BboxUnitsArg,

    /// What to do with repeated names in the labels file.
    #[arg(long, value_enum, default_value_t = DuplicateLabelsArg::Reject)]
    duplicate_labels: DuplicateLabelsArg,

    /// Output format for the summary.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

impl ConvertArgs {
    fn into_config(self) -> Result<ConvertConfig, TfshardError> {
        let (Some(annotations_file), Some(out_dir), Some(labels_file)) =
            (self.annotations_file, self.out_dir, self.labels_file)
        else {
            return Err(TfshardError::Usage);
        };

        Ok(ConvertConfig {
            annotations_file,
            out_dir,
            labels_file,
            batch_size: self.batch_size,
            limit: self.limit,
            bbox_units: self.bbox_units.into(),
            duplicate_labels: self.duplicate_labels.into(),
        })
    }
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Shard files, or directories containing `images.record-*` shards.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Label map descriptor to cross-check class labels against.
    #[arg(long)]
    label_map: Option<PathBuf>,

    /// Write each record's encoded image into this directory.
    #[arg(long)]
    extract_dir: Option<PathBuf>,

    /// Stop after this many records.
    #[arg(long)]
    max_records: Option<usize>,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BboxUnitsArg {
    /// Pixel values, divided by the image size when encoded.
    Pixel,
    /// Values already in [0, 1], stored unchanged.
    Normalized,
}

impl From<BboxUnitsArg> for BboxUnits {
    fn from(arg: BboxUnitsArg) -> Self {
        match arg {
            BboxUnitsArg::Pixel => BboxUnits::Pixel,
            BboxUnitsArg::Normalized => BboxUnits::Normalized,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DuplicateLabelsArg {
    /// Fail on the first repeated name.
    Reject,
    /// A repeated name takes the id of its last position.
    Overwrite,
}

impl From<DuplicateLabelsArg> for DuplicatePolicy {
    fn from(arg: DuplicateLabelsArg) -> Self {
        match arg {
            DuplicateLabelsArg::Reject => DuplicatePolicy::Reject,
            DuplicateLabelsArg::Overwrite => DuplicatePolicy::Overwrite,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Run the tfshard CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
/// Argument errors print clap's usage message and return
/// [`TfshardError::Usage`] so the process exits with status 1.
pub fn run() -> Result<(), TfshardError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also arrive here, on stdout.
            err.print().map_err(TfshardError::Io)?;
            return if err.use_stderr() {
                Err(TfshardError::Usage)
            } else {
                Ok(())
            };
        }
    };

    match cli.command {
        Some(Commands::Inspect(args)) => run_inspect(args),
        None => run_convert(cli.convert),
    }
}

/// Execute a conversion run from the top-level flags.
fn run_convert(args: ConvertArgs) -> Result<(), TfshardError> {
    let output = args.output;
    let config = args.into_config()?;

    let summary = convert::convert(&config)?;

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summary).map_err(TfshardError::ReportJson)?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", summary),
    }
    Ok(())
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), TfshardError> {
    let label_map = match &args.label_map {
        Some(path) => Some(labels::read_label_map(path)?),
        None => None,
    };
    let opts = InspectOptions {
        label_map,
        extract_dir: args.extract_dir,
        max_records: args.max_records,
    };

    let paths = inspect::collect_shard_paths(&args.inputs)?;
    let report = inspect::inspect_shards(&paths, &opts)?;

    match args.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(TfshardError::ReportJson)?;
            println!("{}", json);
        }
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}
