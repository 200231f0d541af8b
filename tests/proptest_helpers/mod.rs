#![allow(dead_code)]

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

use tfshard::annotation::BBoxXYXY;
use tfshard::labels::ClassId;
use tfshard::record::{ObjectRecord, RecordObject, IMAGE_FORMAT};

/// Tolerance for coordinates that pass through an f32 feature.
pub const EPS_F32: f64 = 1e-6;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Class names without surrounding whitespace, including quotes and
/// backslashes that the descriptor has to escape.
pub fn arb_class_name() -> BoxedStrategy<String> {
    "[A-Za-z0-9'\"\\\\ _-]{0,11}[A-Za-z0-9'\"\\\\_-]"
        .prop_map(|s| s.trim().to_string())
        .prop_filter("non-empty", |s| !s.is_empty())
        .boxed()
}

/// Distinct class names, in the order they would appear in a labels file.
pub fn arb_class_names(max: usize) -> BoxedStrategy<Vec<String>> {
    prop::collection::btree_set(arb_class_name(), 1..=max)
        .prop_map(|set| set.into_iter().collect())
        .boxed()
}

fn arb_unit_interval_pair() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(a, b)| if a <= b { (a, b) } else { (b, a) })
}

pub fn arb_object_record() -> BoxedStrategy<ObjectRecord> {
    (
        1u32..5000,
        1u32..5000,
        "[a-z0-9_]{1,12}\\.(jpg|png)",
        prop::collection::vec(any::<u8>(), 0..256),
        arb_unit_interval_pair(),
        arb_unit_interval_pair(),
        arb_class_name(),
        0i64..1000,
    )
        .prop_map(
            |(width, height, filename, encoded, (xmin, xmax), (ymin, ymax), class_text, label)| {
                ObjectRecord {
                    height,
                    width,
                    source_id: filename.clone(),
                    filename,
                    encoded,
                    format: IMAGE_FORMAT.to_string(),
                    objects: vec![RecordObject {
                        bbox: BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax),
                        class_text,
                        class_label: ClassId::new(label),
                    }],
                }
            },
        )
        .boxed()
}

/// Compares two records field by field, allowing f32 error on box corners.
pub fn assert_records_equivalent(a: &ObjectRecord, b: &ObjectRecord) -> Result<(), String> {
    if (a.height, a.width) != (b.height, b.width) {
        return Err(format!(
            "size mismatch: {}x{} vs {}x{}",
            a.width, a.height, b.width, b.height
        ));
    }
    if a.filename != b.filename || a.source_id != b.source_id || a.format != b.format {
        return Err(format!("metadata mismatch: {:?} vs {:?}", a.filename, b.filename));
    }
    if a.encoded != b.encoded {
        return Err("encoded image bytes differ".to_string());
    }
    if a.objects.len() != b.objects.len() {
        return Err(format!(
            "object count mismatch: {} vs {}",
            a.objects.len(),
            b.objects.len()
        ));
    }

    for (i, (x, y)) in a.objects.iter().zip(&b.objects).enumerate() {
        if x.class_text != y.class_text || x.class_label != y.class_label {
            return Err(format!(
                "object {i}: class {:?}/{} vs {:?}/{}",
                x.class_text, x.class_label, y.class_text, y.class_label
            ));
        }
        let corners = [
            (x.bbox.xmin(), y.bbox.xmin()),
            (x.bbox.ymin(), y.bbox.ymin()),
            (x.bbox.xmax(), y.bbox.xmax()),
            (x.bbox.ymax(), y.bbox.ymax()),
        ];
        for (expected, actual) in corners {
            if (expected - actual).abs() > EPS_F32 {
                return Err(format!(
                    "object {i}: corner {expected} decoded as {actual}"
                ));
            }
        }
    }

    Ok(())
}
