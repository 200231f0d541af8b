//! Shard inspection.
//!
//! Reads shard files back, verifies their framing, decodes every record and
//! summarizes it: image name and size, and each box as a pixel rectangle
//! (`x = xmin * width`, `y = ymin * height`, and so on), which is what a
//! plotting tool would draw. Optionally cross-checks class text against a
//! label map and extracts the embedded images to disk.

mod report;

pub use report::{
    InspectReport, LabelMismatch, ObjectSummary, PixelRect, RecordSummary, ShardSummary,
};

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::TfshardError;
use crate::labels::LabelMap;
use crate::record::ObjectRecord;
use crate::tfrecord::{RecordReader, SHARD_PREFIX};

/// Options for shard inspection.
#[derive(Clone, Debug, Default)]
pub struct InspectOptions {
    /// Label map to check decoded class text/label pairs against.
    pub label_map: Option<LabelMap>,
    /// Write each record's encoded image into this directory.
    pub extract_dir: Option<PathBuf>,
    /// Stop after this many records in total.
    pub max_records: Option<usize>,
}

/// Expands the inputs into a list of shard files.
///
/// Files are taken as given. Directories contribute their direct children
/// named `images.record-*`, sorted by name so shards come out in index
/// order.
pub fn collect_shard_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, TfshardError> {
    let prefix = format!("{}-", SHARD_PREFIX);
    let mut paths = Vec::new();

    for input in inputs {
        if !input.is_dir() {
            paths.push(input.clone());
            continue;
        }

        for entry in WalkDir::new(input)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| TfshardError::FileRead {
                path: input.clone(),
                source: err.into(),
            })?;
            let is_shard = entry.file_type().is_file()
                && entry.file_name().to_string_lossy().starts_with(&prefix);
            if is_shard {
                paths.push(entry.into_path());
            }
        }
    }

    Ok(paths)
}

/// Decodes every record in `paths` and builds a report.
pub fn inspect_shards(
    paths: &[PathBuf],
    opts: &InspectOptions,
) -> Result<InspectReport, TfshardError> {
    if let Some(dir) = &opts.extract_dir {
        fs::create_dir_all(dir).map_err(TfshardError::Io)?;
    }

    let mut report = InspectReport::default();
    let limit = opts.max_records.unwrap_or(usize::MAX);

    for path in paths {
        if report.total_records >= limit {
            break;
        }
        let shard = inspect_shard(path, opts, &mut report, limit)?;
        report.shards.push(shard);
    }

    Ok(report)
}

fn inspect_shard(
    path: &Path,
    opts: &InspectOptions,
    report: &mut InspectReport,
    limit: usize,
) -> Result<ShardSummary, TfshardError> {
    let file = File::open(path).map_err(|source| TfshardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = RecordReader::new(BufReader::new(file));
    let mut shard = ShardSummary {
        path: path.to_path_buf(),
        records: Vec::new(),
    };

    let mut index_in_shard = 0;
    while report.total_records < limit {
        let bytes = match reader.read_record() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(source) => {
                return Err(TfshardError::ShardRead {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let record = ObjectRecord::from_bytes(&bytes, path, index_in_shard)?;
        let index = report.total_records;

        if let Some(labels) = &opts.label_map {
            check_labels(labels, index, &record, &mut report.mismatches);
        }

        let extracted_to = match &opts.extract_dir {
            Some(dir) => Some(extract_image(dir, index, &record)?),
            None => None,
        };

        shard.records.push(RecordSummary::new(index, &record, extracted_to));
        report.total_records += 1;
        index_in_shard += 1;
    }

    log::debug!(
        "{}: {} record(s) in {} byte(s)",
        path.display(),
        shard.records.len(),
        reader.offset()
    );
    Ok(shard)
}

fn check_labels(
    labels: &LabelMap,
    index: usize,
    record: &ObjectRecord,
    mismatches: &mut Vec<LabelMismatch>,
) {
    for object in &record.objects {
        let expected = labels.get(&object.class_text);
        if expected != Some(object.class_label) {
            mismatches.push(LabelMismatch {
                record: index,
                class_text: object.class_text.clone(),
                class_label: object.class_label.as_i64(),
                expected: expected.map(|id| id.as_i64()),
            });
        }
    }
}

fn extract_image(
    dir: &Path,
    index: usize,
    record: &ObjectRecord,
) -> Result<PathBuf, TfshardError> {
    let name = Path::new(&record.filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let path = dir.join(format!("{:05}-{}", index, name));
    fs::write(&path, &record.encoded).map_err(TfshardError::Io)?;
    Ok(path)
}
