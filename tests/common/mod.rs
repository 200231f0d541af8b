#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// One annotation line: image, center/size box in pixels, class name.
pub struct Row<'a> {
    pub image: &'a str,
    pub bbox: [f64; 4],
    pub make: &'a str,
}

/// Lays out a dataset under `root`: `data.jsonl`, `labels.txt` and one
/// 100x50 BMP per distinct image. Returns `(annotations, labels)` paths.
pub fn write_dataset(root: &Path, labels: &[&str], rows: &[Row<'_>]) -> (PathBuf, PathBuf) {
    fs::create_dir_all(root).expect("create dataset dir");

    let mut jsonl = String::new();
    for row in rows {
        let line = serde_json::json!({
            "image": row.image,
            "bbox": row.bbox,
            "make": row.make,
        });
        jsonl.push_str(&line.to_string());
        jsonl.push('\n');

        let image_path = root.join(row.image);
        if !image_path.exists() {
            write_bmp(&image_path, 100, 50);
        }
    }

    let annotations = root.join("data.jsonl");
    fs::write(&annotations, jsonl).expect("write annotations");

    let labels_path = root.join("labels.txt");
    fs::write(&labels_path, labels.join("\n")).expect("write labels");

    (annotations, labels_path)
}

/// The five-record BMW/Audi dataset used across the CLI tests.
pub fn cars(root: &Path) -> (PathBuf, PathBuf) {
    let rows = [
        ("images/0.bmp", [50.0, 25.0, 20.0, 10.0], "BMW"),
        ("images/1.bmp", [10.0, 10.0, 4.0, 4.0], "Audi"),
        ("images/2.bmp", [80.0, 40.0, 10.0, 10.0], "BMW"),
        ("images/3.bmp", [50.0, 25.0, 100.0, 50.0], "Audi"),
        ("images/4.bmp", [30.0, 20.0, 6.0, 8.0], "BMW"),
    ];
    let rows: Vec<Row<'_>> = rows
        .iter()
        .map(|&(image, bbox, make)| Row { image, bbox, make })
        .collect();
    write_dataset(root, &["BMW", "Audi"], &rows)
}

/// Shard file names in `dir`, sorted.
pub fn shard_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read out dir")
        .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("images.record-"))
        .collect();
    names.sort();
    names
}
