//! Conversion summary and its terminal rendering.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What a conversion run produced.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionSummary {
    /// Records written across all shards.
    pub records_written: u64,
    /// Shard count baked into the file names.
    pub shard_count: usize,
    /// Shard files, in write order.
    pub shards: Vec<PathBuf>,
    /// Path of the label map descriptor.
    pub label_map: PathBuf,
    /// Number of classes in the label map.
    pub classes: usize,
}

impl fmt::Display for ConversionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Converted {} record(s) into {} shard(s)",
            self.records_written,
            self.shards.len()
        )?;
        writeln!(
            f,
            "Label map: {} ({} class(es))",
            self.label_map.display(),
            self.classes
        )?;
        for shard in &self.shards {
            writeln!(f, "  {}", shard.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> ConversionSummary {
        ConversionSummary {
            records_written: 3,
            shard_count: 2,
            shards: vec![
                PathBuf::from("out/images.record-00000-of-00002"),
                PathBuf::from("out/images.record-00001-of-00002"),
            ],
            label_map: PathBuf::from("out/label_map.pbtxt"),
            classes: 2,
        }
    }

    #[test]
    fn text_lists_every_shard() {
        let text = summary().to_string();
        assert!(text.starts_with("Converted 3 record(s) into 2 shard(s)\n"));
        assert!(text.contains("out/label_map.pbtxt (2 class(es))"));
        assert!(text.contains("  out/images.record-00001-of-00002\n"));
    }

    #[test]
    fn json_has_counts() {
        let json = serde_json::to_string(&summary()).expect("json");
        assert!(json.contains("\"records_written\":3"));
        assert!(json.contains("\"shard_count\":2"));
    }
}
