//! Sharded TFRecord output.
//!
//! [`ShardedRecordWriter`] spreads a stream of serialized records over a
//! fixed number of files. The number of shards is decided once, from the
//! total the caller declares up front, and is baked into every file name:
//!
//! ```text
//! images.record-00000-of-00003
//! images.record-00001-of-00003
//! images.record-00002-of-00003
//! ```
//!
//! Every shard but the last holds exactly `capacity` records.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::framing::RecordWriter;
use crate::error::TfshardError;

/// File name prefix shared by all shards.
pub const SHARD_PREFIX: &str = "images.record";

/// Number of shards needed for `total` records at `capacity` per shard.
///
/// # Panics
/// Panics if `capacity` is zero; [`ShardedRecordWriter::create`] checks this
/// before calling.
pub fn shard_count(total: usize, capacity: usize) -> usize {
    total.div_ceil(capacity)
}

/// `images.record-<index>-of-<count>`, both zero padded to five digits.
pub fn shard_file_name(index: usize, count: usize) -> String {
    format!("{}-{:05}-of-{:05}", SHARD_PREFIX, index, count)
}

/// Writes records into successive shard files, rolling over at capacity.
///
/// The currently open shard is owned by the writer. It is flushed and closed
/// when the writer rolls to the next shard, on [`close`](Self::close), and
/// (best effort, errors ignored) when the writer is dropped.
pub struct ShardedRecordWriter {
    dir: PathBuf,
    capacity: usize,
    shard_count: usize,
    current_index: usize,
    in_current: usize,
    records_written: u64,
    current: Option<RecordWriter<BufWriter<File>>>,
    paths: Vec<PathBuf>,
}

impl ShardedRecordWriter {
    /// Creates the writer and opens shard 0 immediately, so the first shard
    /// exists even if no record is ever written.
    pub fn create(dir: &Path, capacity: usize, total: usize) -> Result<Self, TfshardError> {
        if capacity == 0 {
            return Err(TfshardError::InvalidShardCapacity(capacity));
        }

        let mut writer = Self {
            dir: dir.to_path_buf(),
            capacity,
            shard_count: shard_count(total, capacity),
            current_index: 0,
            in_current: 0,
            records_written: 0,
            current: None,
            paths: Vec::new(),
        };
        log::info!(
            "writing {} record(s) into {} shard(s) of up to {} in {}",
            total,
            writer.shard_count,
            capacity,
            dir.display()
        );
        writer.open_current()?;
        Ok(writer)
    }

    /// Number of shards baked into the file names. Fixed at construction.
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Paths of every shard opened so far, in order.
    pub fn shard_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Appends one serialized record, rolling to a new shard first if the
    /// current one is full.
    pub fn write(&mut self, record: &[u8]) -> Result<(), TfshardError> {
        if self.current.is_none() {
            return Err(TfshardError::WriterClosed);
        }

        if self.in_current >= self.capacity {
            self.close_current()?;
            self.current_index += 1;
            self.in_current = 0;
            if self.current_index == self.shard_count {
                log::warn!(
                    "more records than the declared total; shard index {} exceeds shard count {}",
                    self.current_index,
                    self.shard_count
                );
            }
            self.open_current()?;
        }

        let path = self.current_path();
        let writer = self.current.as_mut().ok_or(TfshardError::WriterClosed)?;
        writer
            .write_record(record)
            .map_err(|source| TfshardError::ShardWrite { path, source })?;

        self.in_current += 1;
        self.records_written += 1;
        Ok(())
    }

    /// Flushes and closes the open shard. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<(), TfshardError> {
        self.close_current()
    }

    fn current_path(&self) -> PathBuf {
        self.dir
            .join(shard_file_name(self.current_index, self.shard_count))
    }

    fn open_current(&mut self) -> Result<(), TfshardError> {
        let path = self.current_path();
        let file = File::create(&path).map_err(|source| TfshardError::ShardWrite {
            path: path.clone(),
            source,
        })?;
        log::info!("opened shard {}", path.display());
        self.current = Some(RecordWriter::new(BufWriter::new(file)));
        self.paths.push(path);
        Ok(())
    }

    fn close_current(&mut self) -> Result<(), TfshardError> {
        if let Some(writer) = self.current.take() {
            let path = self.current_path();
            writer
                .into_inner()
                .map_err(|source| TfshardError::ShardWrite {
                    path: path.clone(),
                    source,
                })?;
            log::debug!("closed shard {} ({} record(s))", path.display(), self.in_current);
        }
        Ok(())
    }
}

impl Drop for ShardedRecordWriter {
    fn drop(&mut self) {
        if let Some(mut writer) = self.current.take() {
            let _ = writer.flush();
        }
    }
}
