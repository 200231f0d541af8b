//! Object-detection records.
//!
//! An [`ObjectRecord`] is one annotated image: the raw encoded image bytes,
//! its dimensions, and the labelled boxes in normalized corner form. It maps
//! to a `tf.train.Example` with the feature layout used by the TensorFlow
//! Object Detection API:
//!
//! | key                          | type        |
//! |------------------------------|-------------|
//! | `image/height`               | int64       |
//! | `image/width`                | int64       |
//! | `image/filename`             | bytes       |
//! | `image/source_id`            | bytes       |
//! | `image/encoded`              | bytes       |
//! | `image/format`               | bytes       |
//! | `image/object/bbox/xmin` ... | float list  |
//! | `image/object/class/text`    | bytes list  |
//! | `image/object/class/label`   | int64 list  |

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use prost::Message;

use crate::annotation::{Annotation, BBoxXYXY, BboxUnits, Normalized};
use crate::error::TfshardError;
use crate::labels::{ClassId, LabelMap};
use crate::tfrecord::{Example, Feature};

/// Format tag written to `image/format`.
pub const IMAGE_FORMAT: &str = "jpeg";

/// Feature keys.
pub mod keys {
    pub const HEIGHT: &str = "image/height";
    pub const WIDTH: &str = "image/width";
    pub const FILENAME: &str = "image/filename";
    pub const SOURCE_ID: &str = "image/source_id";
    pub const ENCODED: &str = "image/encoded";
    pub const FORMAT: &str = "image/format";
    pub const XMIN: &str = "image/object/bbox/xmin";
    pub const XMAX: &str = "image/object/bbox/xmax";
    pub const YMIN: &str = "image/object/bbox/ymin";
    pub const YMAX: &str = "image/object/bbox/ymax";
    pub const CLASS_TEXT: &str = "image/object/class/text";
    pub const CLASS_LABEL: &str = "image/object/class/label";
}

/// One labelled box inside a record.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordObject {
    pub bbox: BBoxXYXY<Normalized>,
    pub class_text: String,
    pub class_label: ClassId,
}

/// An annotated image ready to be serialized.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectRecord {
    pub height: u32,
    pub width: u32,
    pub filename: String,
    pub source_id: String,
    pub encoded: Vec<u8>,
    pub format: String,
    pub objects: Vec<RecordObject>,
}

/// Turns annotations into [`ObjectRecord`]s.
///
/// Holds what every record of one conversion run shares: where images
/// live, the label map, and the units of the source boxes.
pub struct RecordEncoder<'a> {
    dataset_dir: &'a Path,
    annotations_path: &'a Path,
    labels: &'a LabelMap,
    units: BboxUnits,
}

impl<'a> RecordEncoder<'a> {
    /// `annotations_path` is only used to point error messages at the
    /// offending input line.
    pub fn new(
        dataset_dir: &'a Path,
        annotations_path: &'a Path,
        labels: &'a LabelMap,
        units: BboxUnits,
    ) -> Self {
        Self {
            dataset_dir,
            annotations_path,
            labels,
            units,
        }
    }

    /// Reads the referenced image and builds its record.
    ///
    /// The class is looked up first so an unknown class fails before any
    /// image I/O happens.
    pub fn encode(
        &self,
        line: usize,
        annotation: &Annotation,
    ) -> Result<ObjectRecord, TfshardError> {
        let class_label = self.labels.get(&annotation.class_name).ok_or_else(|| {
            TfshardError::UnknownClass {
                name: annotation.class_name.clone(),
                path: self.annotations_path.to_path_buf(),
                line,
            }
        })?;

        let image_path = self.dataset_dir.join(&annotation.image);
        let encoded = fs::read(&image_path).map_err(|source| TfshardError::ImageRead {
            path: image_path.clone(),
            source,
        })?;
        let (width, height) = image_dimensions(&image_path, &encoded)?;

        let filename = base_name(&image_path);
        let bbox = self.units.normalize(annotation.corners(), width, height);
        if !bbox.is_finite() || !bbox.is_ordered() {
            log::warn!(
                "{}:{}: degenerate box {:?} for {}",
                self.annotations_path.display(),
                line,
                annotation.bbox,
                image_path.display()
            );
        }

        Ok(ObjectRecord {
            height,
            width,
            source_id: filename.clone(),
            filename,
            encoded,
            format: IMAGE_FORMAT.to_string(),
            objects: vec![RecordObject {
                bbox,
                class_text: annotation.class_name.clone(),
                class_label,
            }],
        })
    }
}

fn image_dimensions(path: &Path, bytes: &[u8]) -> Result<(u32, u32), TfshardError> {
    let size = imagesize::blob_size(bytes).map_err(|source| TfshardError::ImageDimensions {
        path: path.to_path_buf(),
        source,
    })?;

    let to_u32 = |value: usize, what: &str| {
        u32::try_from(value).map_err(|_| TfshardError::RecordInvalid {
            message: format!(
                "image {} in {} does not fit in u32: {}",
                what,
                path.display(),
                value
            ),
        })
    };

    let (width, height) = (to_u32(size.width, "width")?, to_u32(size.height, "height")?);
    if width == 0 || height == 0 {
        return Err(TfshardError::RecordInvalid {
            message: format!(
                "image {} reports a zero dimension ({}x{})",
                path.display(),
                width,
                height
            ),
        });
    }
    Ok((width, height))
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl ObjectRecord {
    /// Builds the `tf.train.Example` for this record.
    pub fn to_example(&self) -> Example {
        let corner = |f: fn(&BBoxXYXY<Normalized>) -> f64| {
            Feature::float_list(self.objects.iter().map(|o| f(&o.bbox) as f32).collect())
        };

        let mut features = BTreeMap::new();
        features.insert(keys::HEIGHT.to_string(), Feature::int64(self.height as i64));
        features.insert(keys::WIDTH.to_string(), Feature::int64(self.width as i64));
        features.insert(keys::FILENAME.to_string(), Feature::bytes(self.filename.as_bytes()));
        features.insert(keys::SOURCE_ID.to_string(), Feature::bytes(self.source_id.as_bytes()));
        features.insert(keys::ENCODED.to_string(), Feature::bytes(self.encoded.clone()));
        features.insert(keys::FORMAT.to_string(), Feature::bytes(self.format.as_bytes()));
        features.insert(keys::XMIN.to_string(), corner(BBoxXYXY::xmin));
        features.insert(keys::XMAX.to_string(), corner(BBoxXYXY::xmax));
        features.insert(keys::YMIN.to_string(), corner(BBoxXYXY::ymin));
        features.insert(keys::YMAX.to_string(), corner(BBoxXYXY::ymax));
        features.insert(
            keys::CLASS_TEXT.to_string(),
            Feature::bytes_list(
                self.objects
                    .iter()
                    .map(|o| o.class_text.as_bytes().to_vec())
                    .collect(),
            ),
        );
        features.insert(
            keys::CLASS_LABEL.to_string(),
            Feature::int64_list(self.objects.iter().map(|o| o.class_label.as_i64()).collect()),
        );

        Example::from_features(features)
    }

    /// Serialized `Example` bytes, ready for a record writer.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_example().encode_to_vec()
    }

    /// Rebuilds a record from a decoded `Example`.
    pub fn from_example(example: &Example) -> Result<Self, TfshardError> {
        let xmin = floats(example, keys::XMIN)?;
        let xmax = floats(example, keys::XMAX)?;
        let ymin = floats(example, keys::YMIN)?;
        let ymax = floats(example, keys::YMAX)?;
        let texts = bytes_list(example, keys::CLASS_TEXT)?;
        let labels = int64s(example, keys::CLASS_LABEL)?;

        let n = xmin.len();
        let lengths = [xmax.len(), ymin.len(), ymax.len(), texts.len(), labels.len()];
        if lengths.iter().any(|&len| len != n) {
            return Err(invalid(format!(
                "object lists have different lengths: xmin={}, xmax={}, ymin={}, ymax={}, text={}, label={}",
                n, lengths[0], lengths[1], lengths[2], lengths[3], lengths[4]
            )));
        }

        let mut objects = Vec::with_capacity(n);
        for i in 0..n {
            objects.push(RecordObject {
                bbox: BBoxXYXY::from_xyxy(
                    xmin[i] as f64,
                    ymin[i] as f64,
                    xmax[i] as f64,
                    ymax[i] as f64,
                ),
                class_text: utf8(keys::CLASS_TEXT, &texts[i])?,
                class_label: ClassId::new(labels[i]),
            });
        }

        Ok(Self {
            height: dimension(example, keys::HEIGHT)?,
            width: dimension(example, keys::WIDTH)?,
            filename: single_string(example, keys::FILENAME)?,
            source_id: single_string(example, keys::SOURCE_ID)?,
            encoded: single_bytes(example, keys::ENCODED)?.to_vec(),
            format: single_string(example, keys::FORMAT)?,
            objects,
        })
    }

    /// Decodes serialized `Example` bytes. `path` and `index` locate the
    /// record for error messages.
    pub fn from_bytes(bytes: &[u8], path: &Path, index: usize) -> Result<Self, TfshardError> {
        let example = Example::decode(bytes).map_err(|source| TfshardError::ExampleDecode {
            path: path.to_path_buf(),
            index,
            source,
        })?;
        Self::from_example(&example)
    }
}

fn invalid(message: String) -> TfshardError {
    TfshardError::RecordInvalid { message }
}

fn feature<'e>(example: &'e Example, key: &str) -> Result<&'e Feature, TfshardError> {
    example
        .feature(key)
        .ok_or_else(|| invalid(format!("missing feature '{}'", key)))
}

fn wrong_kind(key: &str, expected: &str, found: &Feature) -> TfshardError {
    invalid(format!(
        "feature '{}' should be {}, found {}",
        key,
        expected,
        found.kind_name()
    ))
}

fn floats<'e>(example: &'e Example, key: &str) -> Result<&'e [f32], TfshardError> {
    let f = feature(example, key)?;
    f.as_float_list().ok_or_else(|| wrong_kind(key, "float_list", f))
}

fn int64s<'e>(example: &'e Example, key: &str) -> Result<&'e [i64], TfshardError> {
    let f = feature(example, key)?;
    f.as_int64_list().ok_or_else(|| wrong_kind(key, "int64_list", f))
}

fn bytes_list<'e>(example: &'e Example, key: &str) -> Result<&'e [Vec<u8>], TfshardError> {
    let f = feature(example, key)?;
    f.as_bytes_list().ok_or_else(|| wrong_kind(key, "bytes_list", f))
}

fn single_bytes<'e>(example: &'e Example, key: &str) -> Result<&'e [u8], TfshardError> {
    match bytes_list(example, key)? {
        [value] => Ok(value),
        other => Err(invalid(format!(
            "feature '{}' should hold one value, found {}",
            key,
            other.len()
        ))),
    }
}

fn single_string(example: &Example, key: &str) -> Result<String, TfshardError> {
    utf8(key, single_bytes(example, key)?)
}

fn dimension(example: &Example, key: &str) -> Result<u32, TfshardError> {
    match int64s(example, key)? {
        [value] => u32::try_from(*value)
            .map_err(|_| invalid(format!("feature '{}' out of range: {}", key, value))),
        other => Err(invalid(format!(
            "feature '{}' should hold one value, found {}",
            key,
            other.len()
        ))),
    }
}

fn utf8(key: &str, bytes: &[u8]) -> Result<String, TfshardError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| invalid(format!("feature '{}' is not valid UTF-8", key)))
}
