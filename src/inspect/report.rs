//! Inspect report types and terminal formatting.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::record::ObjectRecord;

/// The result of inspecting one or more shards.
#[derive(Clone, Debug, Default, Serialize)]
pub struct InspectReport {
    pub shards: Vec<ShardSummary>,
    /// Records decoded across all shards.
    pub total_records: usize,
    /// Objects whose class label disagrees with the supplied label map.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mismatches: Vec<LabelMismatch>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ShardSummary {
    pub path: PathBuf,
    pub records: Vec<RecordSummary>,
}

/// One decoded record.
#[derive(Clone, Debug, Serialize)]
pub struct RecordSummary {
    /// Position across all inspected shards, starting at 0.
    pub index: usize,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub encoded_bytes: usize,
    pub objects: Vec<ObjectSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_to: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ObjectSummary {
    pub class_text: String,
    pub class_label: i64,
    /// Box in pixels, top-left corner plus size.
    pub rect: PixelRect,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct LabelMismatch {
    /// Global record index.
    pub record: usize,
    pub class_text: String,
    pub class_label: i64,
    /// Id the label map assigns to `class_text`, if it knows the name.
    pub expected: Option<i64>,
}

impl RecordSummary {
    pub(crate) fn new(
        index: usize,
        record: &ObjectRecord,
        extracted_to: Option<PathBuf>,
    ) -> Self {
        let (w, h) = (record.width as f64, record.height as f64);
        let objects = record
            .objects
            .iter()
            .map(|object| {
                let px = object.bbox.to_pixel(w, h);
                ObjectSummary {
                    class_text: object.class_text.clone(),
                    class_label: object.class_label.as_i64(),
                    rect: PixelRect {
                        x: px.xmin(),
                        y: px.ymin(),
                        width: px.width(),
                        height: px.height(),
                    },
                }
            })
            .collect();

        Self {
            index,
            filename: record.filename.clone(),
            width: record.width,
            height: record.height,
            format: record.format.clone(),
            encoded_bytes: record.encoded.len(),
            objects,
            extracted_to,
        }
    }
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for shard in &self.shards {
            writeln!(
                f,
                "{} ({} record(s))",
                shard.path.display(),
                shard.records.len()
            )?;
            for record in &shard.records {
                writeln!(
                    f,
                    "  #{:<5} {} {}x{} {} {} bytes",
                    record.index,
                    record.filename,
                    record.width,
                    record.height,
                    record.format,
                    record.encoded_bytes
                )?;
                for object in &record.objects {
                    writeln!(
                        f,
                        "         {} [{}] x={:.1} y={:.1} w={:.1} h={:.1}",
                        object.class_text,
                        object.class_label,
                        object.rect.x,
                        object.rect.y,
                        object.rect.width,
                        object.rect.height
                    )?;
                }
                if let Some(path) = &record.extracted_to {
                    writeln!(f, "         -> {}", path.display())?;
                }
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Total: {} record(s) in {} shard(s)",
            self.total_records,
            self.shards.len()
        )?;

        if !self.mismatches.is_empty() {
            writeln!(f, "Label mismatches: {}", self.mismatches.len())?;
            for m in &self.mismatches {
                match m.expected {
                    Some(expected) => writeln!(
                        f,
                        "  record {}: '{}' has label {}, label map says {}",
                        m.record, m.class_text, m.class_label, expected
                    )?,
                    None => writeln!(
                        f,
                        "  record {}: '{}' (label {}) is not in the label map",
                        m.record, m.class_text, m.class_label
                    )?,
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::BBoxXYXY;
    use crate::labels::ClassId;
    use crate::record::RecordObject;

    fn report() -> InspectReport {
        let record = ObjectRecord {
            height: 10,
            width: 20,
            filename: "car.jpg".into(),
            source_id: "car.jpg".into(),
            encoded: vec![1, 2, 3],
            format: "jpeg".into(),
            objects: vec![RecordObject {
                bbox: BBoxXYXY::from_xyxy(0.5, 0.5, 1.0, 1.0),
                class_text: "BMW".into(),
                class_label: ClassId(0),
            }],
        };
        InspectReport {
            shards: vec![ShardSummary {
                path: PathBuf::from("images.record-00000-of-00001"),
                records: vec![RecordSummary::new(0, &record, None)],
            }],
            total_records: 1,
            mismatches: vec![LabelMismatch {
                record: 0,
                class_text: "BMW".into(),
                class_label: 0,
                expected: None,
            }],
        }
    }

    #[test]
    fn text_output() {
        let text = report().to_string();
        assert!(text.contains("images.record-00000-of-00001 (1 record(s))"));
        assert!(text.contains("car.jpg 20x10 jpeg 3 bytes"));
        assert!(text.contains("BMW [0] x=10.0 y=5.0 w=10.0 h=5.0"));
        assert!(text.contains("Total: 1 record(s) in 1 shard(s)"));
        assert!(text.contains("'BMW' (label 0) is not in the label map"));
    }

    #[test]
    fn json_output() {
        let json = serde_json::to_value(report()).expect("json");
        assert_eq!(json["total_records"], 1);
        assert_eq!(json["shards"][0]["records"][0]["objects"][0]["rect"]["x"], 10.0);
        assert!(json["shards"][0]["records"][0].get("extracted_to").is_none());
    }
}
