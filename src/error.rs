use std::path::PathBuf;
use thiserror::Error;

use crate::tfrecord::FrameError;

/// The main error type for tfshard operations.
#[derive(Debug, Error)]
pub enum TfshardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid command-line arguments")]
    Usage,

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse annotation at {path}:{line}: {source}")]
    AnnotationParse {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensions {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Unknown class '{name}' at {path}:{line} (not present in the label map)")]
    UnknownClass {
        name: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Duplicate label '{name}' at position {position} (first seen at position {first_position})")]
    DuplicateLabel {
        name: String,
        first_position: usize,
        position: usize,
    },

    #[error("Failed to parse label map {path}: {message}")]
    LabelMapParse { path: PathBuf, message: String },

    #[error("Shard capacity must be positive, got {0}")]
    InvalidShardCapacity(usize),

    #[error("Shard writer is already closed")]
    WriterClosed,

    #[error("Failed to write shard {path}: {source}")]
    ShardWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read shard {path}: {source}")]
    ShardRead {
        path: PathBuf,
        #[source]
        source: FrameError,
    },

    #[error("Failed to decode record {index} in {path}: {source}")]
    ExampleDecode {
        path: PathBuf,
        index: usize,
        #[source]
        source: prost::DecodeError,
    },

    #[error("Invalid record: {message}")]
    RecordInvalid { message: String },

    #[error("Failed to write JSON report: {0}")]
    ReportJson(#[source] serde_json::Error),
}
