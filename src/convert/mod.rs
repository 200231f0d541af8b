//! The conversion driver: JSON-lines annotations in, sharded TFRecords out.
//!
//! A run goes through these steps, in order:
//!
//! 1. create the output directory;
//! 2. count the records in the annotation file and clamp the count to the
//!    limit, if one is set. This single total names the shards *and* ends
//!    the loop, so file names always agree with what was written;
//! 3. build the label map and write `label_map.pbtxt`;
//! 4. encode and write every annotation, in file order.
//!
//! Any error aborts the run. The open shard is still closed (and flushed)
//! on the way out, so partial output is left on disk in a readable state.

mod report;

pub use report::ConversionSummary;

use std::fs;
use std::path::PathBuf;

use crate::annotation::{count_records, AnnotationReader, BboxUnits};
use crate::error::TfshardError;
use crate::labels::{write_label_map, DuplicatePolicy, LabelMap};
use crate::record::RecordEncoder;
use crate::tfrecord::ShardedRecordWriter;

/// Default number of records per shard.
pub const DEFAULT_BATCH_SIZE: usize = 250;

/// Everything a conversion run needs, parsed once from the command line.
#[derive(Clone, Debug)]
pub struct ConvertConfig {
    /// JSON-lines annotation file. Image paths resolve against its directory.
    pub annotations_file: PathBuf,
    /// Directory for the shards and the label map descriptor.
    pub out_dir: PathBuf,
    /// Plain-text class list, one name per line.
    pub labels_file: PathBuf,
    /// Records per shard.
    pub batch_size: usize,
    /// Stop after this many records.
    pub limit: Option<usize>,
    pub bbox_units: BboxUnits,
    pub duplicate_labels: DuplicatePolicy,
}

impl ConvertConfig {
    /// A config with default batch size, no limit, pixel boxes, and
    /// duplicate labels rejected.
    pub fn new(
        annotations_file: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        labels_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            annotations_file: annotations_file.into(),
            out_dir: out_dir.into(),
            labels_file: labels_file.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            limit: None,
            bbox_units: BboxUnits::default(),
            duplicate_labels: DuplicatePolicy::default(),
        }
    }
}

/// Runs a conversion.
pub fn convert(config: &ConvertConfig) -> Result<ConversionSummary, TfshardError> {
    fs::create_dir_all(&config.out_dir).map_err(TfshardError::Io)?;

    let available = count_records(&config.annotations_file)?;
    let total = match config.limit {
        Some(limit) => limit.min(available),
        None => available,
    };
    log::info!(
        "{} annotation(s) in {}, converting {}",
        available,
        config.annotations_file.display(),
        total
    );

    let labels = LabelMap::read_label_list(&config.labels_file, config.duplicate_labels)?;
    let label_map_path = write_label_map(&labels, &config.out_dir)?;
    log::info!(
        "wrote {} class(es) to {}",
        labels.len(),
        label_map_path.display()
    );

    let mut writer = ShardedRecordWriter::create(&config.out_dir, config.batch_size, total)?;

    let written = write_records(config, &labels, total, &mut writer);
    let closed = writer.close();
    written?;
    closed?;

    let summary = ConversionSummary {
        records_written: writer.records_written(),
        shard_count: writer.shard_count(),
        shards: writer.shard_paths().to_vec(),
        label_map: label_map_path,
        classes: labels.len(),
    };
    log::info!(
        "wrote {} record(s) into {} shard file(s)",
        summary.records_written,
        summary.shards.len()
    );
    Ok(summary)
}

fn write_records(
    config: &ConvertConfig,
    labels: &LabelMap,
    total: usize,
    writer: &mut ShardedRecordWriter,
) -> Result<(), TfshardError> {
    if total == 0 {
        return Ok(());
    }

    let reader = AnnotationReader::open(&config.annotations_file)?;
    let dataset_dir = reader.dataset_dir().to_path_buf();
    let encoder = RecordEncoder::new(
        &dataset_dir,
        &config.annotations_file,
        labels,
        config.bbox_units,
    );

    for item in reader.take(total) {
        let (line, annotation) = item?;
        let record = encoder.encode(line, &annotation)?;
        log::debug!(
            "line {}: {} ({}x{}) as {}",
            line,
            record.filename,
            record.width,
            record.height,
            annotation.class_name
        );
        writer.write(&record.to_bytes())?;
    }

    Ok(())
}
