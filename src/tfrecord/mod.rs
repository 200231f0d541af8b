//! TFRecord output: record framing, the `tf.train.Example` schema, and
//! sharded files.

pub mod example;
mod framing;
pub mod shard;

pub use example::{Example, Feature};
pub use framing::{masked_crc32c, FrameError, RecordReader, RecordWriter};
pub use shard::{shard_count, shard_file_name, ShardedRecordWriter, SHARD_PREFIX};
