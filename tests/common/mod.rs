#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use serde_json::{json, Value};

/// Writes an RGB image whose pixel at (x, y) is `(x % 256, y % 256, 0)`, so
/// crop offsets can be read back from the output pixels.
pub fn write_gradient(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 0]));
    img.save(path).expect("write image");
}

pub fn rect(label: &str, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Value {
    json!({
        "label": label,
        "points": [[xmin, ymin], [xmax, ymax]],
        "group_id": null,
        "shape_type": "rectangle",
        "flags": {}
    })
}

pub fn polygon(label: &str, points: &[(f64, f64)]) -> Value {
    let points: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
    json!({
        "label": label,
        "points": points,
        "group_id": null,
        "shape_type": "polygon",
        "flags": {}
    })
}

/// Writes a LabelMe annotation next to `image_path`.
pub fn write_labelme(image_path: &Path, width: u32, height: u32, shapes: Vec<Value>) -> PathBuf {
    let json_path = image_path.with_extension("json");
    let file_name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let doc = json!({
        "version": "5.2.1",
        "flags": {},
        "shapes": shapes,
        "imagePath": file_name,
        "imageData": null,
        "imageHeight": height,
        "imageWidth": width
    });
    fs::write(&json_path, serde_json::to_vec_pretty(&doc).expect("serialize")).expect("write json");
    json_path
}

/// Writes an image plus its annotation in one go.
pub fn write_annotated(
    dir: &Path,
    name: &str,
    width: u32,
    height: u32,
    shapes: Vec<Value>,
) -> PathBuf {
    let image_path = dir.join(name);
    write_gradient(&image_path, width, height);
    write_labelme(&image_path, width, height, shapes);
    image_path
}

pub fn read_json(path: &Path) -> Value {
    let bytes = fs::read(path).expect("read json");
    serde_json::from_slice(&bytes).expect("parse json")
}

/// File names in `dir`, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Every point of every shape in a LabelMe document.
pub fn all_points(doc: &Value) -> Vec<(f64, f64)> {
    doc["shapes"]
        .as_array()
        .into_iter()
        .flatten()
        .flat_map(|shape| shape["points"].as_array().cloned().unwrap_or_default())
        .map(|p| (p[0].as_f64().unwrap_or(f64::NAN), p[1].as_f64().unwrap_or(f64::NAN)))
        .collect()
}
