//! JSON-lines annotation input.
//!
//! Each non-blank line of an annotation file describes one image with a
//! single box:
//!
//! ```json
//! {"image": "cars/0001.jpg", "bbox": [120.0, 80.0, 60.0, 40.0], "make": "BMW"}
//! ```
//!
//! `bbox` is `[center_x, center_y, width, height]`; `image` is relative to
//! the directory holding the annotation file. Unknown fields are ignored.

mod bbox;

pub use bbox::{BBoxXYXY, Normalized, Pixel};

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::TfshardError;

/// One parsed annotation line.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Annotation {
    /// Image path relative to the dataset root.
    pub image: String,
    /// `[center_x, center_y, width, height]`.
    pub bbox: [f64; 4],
    /// Class name, looked up in the label map.
    #[serde(rename = "make")]
    pub class_name: String,
}

impl Annotation {
    /// Parses a single JSON line.
    pub fn from_json_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// The annotated box in the units the source used.
    ///
    /// The type says `Pixel`; callers with normalized sources reinterpret it
    /// with [`BBoxXYXY::assume_normalized`].
    pub fn corners(&self) -> BBoxXYXY<Pixel> {
        let [cx, cy, w, h] = self.bbox;
        BBoxXYXY::from_center_size(cx, cy, w, h)
    }
}

/// Units of the `bbox` values in the annotation source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BboxUnits {
    /// Pixel values; corners are divided by the image size when encoded.
    #[default]
    Pixel,
    /// Already fractions of the image size; stored unchanged.
    Normalized,
}

impl BboxUnits {
    /// Produces the normalized corners stored in a record.
    pub fn normalize(
        self,
        corners: BBoxXYXY<Pixel>,
        image_width: u32,
        image_height: u32,
    ) -> BBoxXYXY<Normalized> {
        match self {
            BboxUnits::Pixel => corners.to_normalized(image_width as f64, image_height as f64),
            BboxUnits::Normalized => BBoxXYXY::assume_normalized(corners),
        }
    }
}

/// Streams annotations from a JSON-lines file, one per non-blank line.
///
/// Yields `(line_number, annotation)` pairs; line numbers are 1-based and
/// count blank lines so error messages point at the right place.
pub struct AnnotationReader {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl AnnotationReader {
    pub fn open(path: &Path) -> Result<Self, TfshardError> {
        let file = File::open(path).map_err(|source| TfshardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }

    /// Directory that image paths are resolved against.
    pub fn dataset_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

impl Iterator for AnnotationReader {
    type Item = Result<(usize, Annotation), TfshardError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(TfshardError::FileRead {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let parsed = Annotation::from_json_line(&line)
                .map(|annotation| (self.line_number, annotation))
                .map_err(|source| TfshardError::AnnotationParse {
                    path: self.path.clone(),
                    line: self.line_number,
                    source,
                });
            return Some(parsed);
        }
    }
}

/// Counts the records in an annotation file without parsing them.
pub fn count_records(path: &Path) -> Result<usize, TfshardError> {
    let file = File::open(path).map_err(|source| TfshardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut count = 0;
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| TfshardError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        if !line.trim().is_empty() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parses_line_and_ignores_extra_fields() {
        let ann = Annotation::from_json_line(
            r#"{"image":"a/b.jpg","bbox":[10,20,4,6],"make":"BMW","model":"M3"}"#,
        )
        .expect("parse");
        assert_eq!(ann.image, "a/b.jpg");
        assert_eq!(ann.class_name, "BMW");

        let corners = ann.corners();
        assert_eq!(corners.xmin(), 8.0);
        assert_eq!(corners.xmax(), 12.0);
        assert_eq!(corners.ymin(), 17.0);
        assert_eq!(corners.ymax(), 23.0);
    }

    #[test]
    fn rejects_short_bbox() {
        let result = Annotation::from_json_line(r#"{"image":"a.jpg","bbox":[1,2,3],"make":"BMW"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn units_control_normalization() {
        let corners = BBoxXYXY::<Pixel>::from_xyxy(10.0, 20.0, 30.0, 40.0);

        let from_pixels = BboxUnits::Pixel.normalize(corners, 100, 200);
        assert_eq!(from_pixels.xmin(), 0.1);
        assert_eq!(from_pixels.ymax(), 0.2);

        let unchanged = BboxUnits::Normalized.normalize(corners, 100, 200);
        assert_eq!(unchanged.xmin(), 10.0);
        assert_eq!(unchanged.ymax(), 40.0);
    }

    #[test]
    fn reader_skips_blank_lines_and_reports_line_numbers() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("feed.json");
        fs::write(
            &path,
            "{\"image\":\"1.jpg\",\"bbox\":[1,1,1,1],\"make\":\"A\"}\n\n\
             {\"image\":\"2.jpg\",\"bbox\":[1,1,1,1],\"make\":\"B\"}\n\
             not json\n",
        )
        .expect("write");

        assert_eq!(count_records(&path).expect("count"), 3);

        let reader = AnnotationReader::open(&path).expect("open");
        assert_eq!(reader.dataset_dir(), temp.path());

        let items: Vec<_> = reader.collect();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().expect("first").0, 1);
        assert_eq!(items[1].as_ref().expect("second").0, 3);
        match &items[2] {
            Err(TfshardError::AnnotationParse { line, .. }) => assert_eq!(*line, 4),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = count_records(Path::new("definitely/not/here.json"));
        assert!(matches!(result, Err(TfshardError::FileRead { .. })));
    }
}
