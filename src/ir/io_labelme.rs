//! LabelMe JSON reading and writing.
//!
//! LabelMe stores one JSON document per image:
//!
//! ```json
//! {
//!   "version": "5.2.1",
//!   "flags": {},
//!   "shapes": [
//!     {"label": "person", "points": [[100, 100], [300, 500]],
//!      "group_id": null, "shape_type": "rectangle", "flags": {}}
//!   ],
//!   "imagePath": "img001.jpg",
//!   "imageData": null,
//!   "imageHeight": 600,
//!   "imageWidth": 800
//! }
//! ```
//!
//! Unknown fields are ignored. Shapes are decoded here, once, into
//! [`Shape<Source>`]; nothing past this module sees raw JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{AnnotationMeta, Shape, ShapeType};
use super::space::{Crop, Source};
use super::Coord;
use crate::error::LabelcropError;

/// Version written when the source annotation carries none.
pub const DEFAULT_LABELME_VERSION: &str = "5.2.1";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LabelMeFileIn {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    flags: Option<BTreeMap<String, bool>>,
    shapes: Vec<LabelMeShapeIn>,
    #[serde(default)]
    image_path: Option<String>,
    // Some tools write `64.0`; anything numeric is accepted here and
    // checked against the image header by the scanner.
    #[serde(default)]
    image_width: Option<serde_json::Value>,
    #[serde(default)]
    image_height: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct LabelMeShapeIn {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    points: Option<Vec<Coord<Source>>>,
    #[serde(default)]
    shape_type: Option<String>,
    #[serde(default)]
    group_id: Option<serde_json::Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    flags: Option<BTreeMap<String, bool>>,
}

/// Something noteworthy about an individual shape that did not prevent the
/// file from being read.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeNote {
    /// The shape's type cannot be cropped (point, line, circle, ...) and was
    /// dropped.
    UnsupportedShapeType {
        index: usize,
        label: String,
        shape_type: String,
    },
    /// The shape was kept but has fewer points than its type needs.
    TooFewPoints {
        index: usize,
        label: String,
        shape_type: ShapeType,
        count: usize,
    },
}

impl std::fmt::Display for ShapeNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShapeNote::UnsupportedShapeType {
                index,
                label,
                shape_type,
            } => write!(
                f,
                "shape {} ('{}') has unsupported shape_type '{}' and was dropped",
                index, label, shape_type
            ),
            ShapeNote::TooFewPoints {
                index,
                label,
                shape_type,
                count,
            } => write!(
                f,
                "{} {} ('{}') has only {} point(s)",
                shape_type, index, label, count
            ),
        }
    }
}

/// A decoded LabelMe annotation file.
#[derive(Clone, Debug)]
pub struct LabelMeAnnotation {
    pub shapes: Vec<Shape<Source>>,
    pub meta: AnnotationMeta,
    pub image_path: Option<String>,
    pub image_width: Option<f64>,
    pub image_height: Option<f64>,
    pub notes: Vec<ShapeNote>,
}

/// A LabelMe document ready to be written for a cropped image.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelMeDocument {
    pub version: String,
    pub flags: BTreeMap<String, bool>,
    pub shapes: Vec<Shape<Crop>>,
    pub image_path: String,
    pub image_data: Option<String>,
    pub image_height: u32,
    pub image_width: u32,
}

impl LabelMeDocument {
    /// Builds a document for a cropped image, carrying over source metadata.
    pub fn for_crop(
        meta: &AnnotationMeta,
        image_file_name: impl Into<String>,
        width: u32,
        height: u32,
        shapes: Vec<Shape<Crop>>,
    ) -> Self {
        Self {
            version: meta
                .version
                .clone()
                .unwrap_or_else(|| DEFAULT_LABELME_VERSION.to_string()),
            flags: meta.flags.clone(),
            shapes,
            image_path: image_file_name.into(),
            image_data: None,
            image_height: height,
            image_width: width,
        }
    }
}

/// Reads and decodes a LabelMe JSON file.
///
/// # Errors
/// Returns [`LabelcropError::LabelMeParse`] for malformed JSON and
/// [`LabelcropError::InvalidShape`] when a shape lacks `label` or `points`.
pub fn read_labelme_json(path: &Path) -> Result<LabelMeAnnotation, LabelcropError> {
    let file = File::open(path).map_err(LabelcropError::Io)?;
    let reader = BufReader::new(file);

    let raw: LabelMeFileIn =
        serde_json::from_reader(reader).map_err(|source| LabelcropError::LabelMeParse {
            path: path.to_path_buf(),
            source,
        })?;
    decode(raw, path)
}

/// Decodes a LabelMe document from bytes. `path` is only used in errors.
pub fn from_labelme_slice(bytes: &[u8], path: &Path) -> Result<LabelMeAnnotation, LabelcropError> {
    let raw: LabelMeFileIn =
        serde_json::from_slice(bytes).map_err(|source| LabelcropError::LabelMeParse {
            path: path.to_path_buf(),
            source,
        })?;
    decode(raw, path)
}

/// Decodes a LabelMe document from a string. Useful for tests.
pub fn from_labelme_str(json: &str) -> Result<LabelMeAnnotation, LabelcropError> {
    from_labelme_slice(json.as_bytes(), Path::new("<string>"))
}

/// Writes a LabelMe document as pretty-printed JSON.
pub fn write_labelme_json(path: &Path, document: &LabelMeDocument) -> Result<(), LabelcropError> {
    let file = File::create(path).map_err(LabelcropError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, document).map_err(|source| {
        LabelcropError::LabelMeWrite {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(LabelcropError::Io)
}

/// Fuzz-only entrypoint: decode, then serialize the shapes back out as a
/// crop-space document.
#[cfg(feature = "fuzzing")]
pub fn fuzz_roundtrip(bytes: &[u8]) -> Result<(), LabelcropError> {
    let path = Path::new("<fuzz>");
    let ann = from_labelme_slice(bytes, path)?;
    let shapes: Vec<Shape<Crop>> = ann
        .shapes
        .iter()
        .map(|shape| shape.with_points(shape.points.iter().map(|p| Coord::new(p.x, p.y)).collect()))
        .collect();
    let doc = LabelMeDocument::for_crop(
        &ann.meta,
        "fuzz.png",
        ann.image_width.map_or(1, |w| w as u32),
        ann.image_height.map_or(1, |h| h as u32),
        shapes,
    );
    serde_json::to_vec(&doc).map_err(|source| LabelcropError::LabelMeWrite {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn decode(raw: LabelMeFileIn, path: &Path) -> Result<LabelMeAnnotation, LabelcropError> {
    let mut shapes = Vec::with_capacity(raw.shapes.len());
    let mut notes = Vec::new();

    for (index, shape) in raw.shapes.into_iter().enumerate() {
        let label = shape.label.ok_or_else(|| LabelcropError::InvalidShape {
            path: path.to_path_buf(),
            message: format!("shape {} is missing 'label'", index),
        })?;
        let points = shape.points.ok_or_else(|| LabelcropError::InvalidShape {
            path: path.to_path_buf(),
            message: format!("shape {} ('{}') is missing 'points'", index, label),
        })?;

        // LabelMe itself treats a missing shape_type as a polygon.
        let type_name = shape.shape_type.unwrap_or_else(|| "polygon".to_string());
        let parsed_type = match type_name.as_str() {
            "rectangle" => Some(ShapeType::Rectangle),
            "polygon" => Some(ShapeType::Polygon),
            _ => None,
        };
        let Some(shape_type) = parsed_type else {
            notes.push(ShapeNote::UnsupportedShapeType {
                index,
                label,
                shape_type: type_name,
            });
            continue;
        };

        let min_points = match shape_type {
            ShapeType::Rectangle => 2,
            ShapeType::Polygon => 3,
        };
        if points.len() < min_points {
            notes.push(ShapeNote::TooFewPoints {
                index,
                label: label.clone(),
                shape_type,
                count: points.len(),
            });
        }

        shapes.push(Shape {
            label,
            points,
            group_id: shape.group_id.as_ref().and_then(serde_json::Value::as_i64),
            description: shape.description.filter(|d| !d.is_empty()),
            shape_type,
            flags: shape.flags.unwrap_or_default(),
        });
    }

    Ok(LabelMeAnnotation {
        shapes,
        meta: AnnotationMeta {
            version: raw.version,
            flags: raw.flags.unwrap_or_default(),
        },
        image_path: raw.image_path,
        image_width: raw.image_width.as_ref().and_then(serde_json::Value::as_f64),
        image_height: raw.image_height.as_ref().and_then(serde_json::Value::as_f64),
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE: &str = r#"{
        "version": "5.4.1",
        "flags": {"reviewed": true},
        "shapes": [
            {"label": "person", "points": [[100, 100], [300, 500]],
             "group_id": null, "shape_type": "rectangle", "flags": {}},
            {"label": "helmet", "points": [[150, 80], [250, 80], [200, 140]],
             "group_id": 3, "shape_type": "polygon", "flags": null,
             "mask": null, "other_tool_field": [1, 2, 3]}
        ],
        "imagePath": "img001.jpg",
        "imageData": null,
        "imageHeight": 600,
        "imageWidth": 800,
        "customTopLevel": {"anything": "goes"}
    }"#;

    #[test]
    fn decodes_rectangles_and_polygons() {
        let ann = from_labelme_str(SAMPLE).expect("parse");
        assert_eq!(ann.shapes.len(), 2);
        assert_eq!(ann.shapes[0].shape_type, ShapeType::Rectangle);
        assert_eq!(ann.shapes[1].shape_type, ShapeType::Polygon);
        assert_eq!(ann.shapes[1].group_id, Some(3));
        assert_eq!(ann.shapes[1].points[2], Coord::new(200.0, 140.0));
        assert_eq!(ann.image_width, Some(800.0));
        assert_eq!(ann.image_height, Some(600.0));
        assert_eq!(ann.meta.version.as_deref(), Some("5.4.1"));
        assert_eq!(ann.meta.flags.get("reviewed"), Some(&true));
        assert!(ann.notes.is_empty());
    }

    #[test]
    fn missing_shape_type_defaults_to_polygon() {
        let json = r#"{"shapes": [{"label": "a", "points": [[0,0],[1,0],[1,1]]}]}"#;
        let ann = from_labelme_str(json).expect("parse");
        assert_eq!(ann.shapes[0].shape_type, ShapeType::Polygon);
        assert_eq!(ann.image_width, None);
    }

    #[test]
    fn float_dimensions_are_accepted() {
        let json = r#"{"shapes": [], "imageWidth": 64.0, "imageHeight": 48.5}"#;
        let ann = from_labelme_str(json).expect("parse");
        assert_eq!(ann.image_width, Some(64.0));
        assert_eq!(ann.image_height, Some(48.5));

        let json = r#"{"shapes": [], "imageWidth": "wide", "imageHeight": null}"#;
        let ann = from_labelme_str(json).expect("parse");
        assert_eq!(ann.image_width, None);
        assert_eq!(ann.image_height, None);
    }

    #[test]
    fn unsupported_shape_types_are_dropped_with_note() {
        let json = r#"{"shapes": [
            {"label": "nose", "points": [[5,5]], "shape_type": "point"},
            {"label": "vest", "points": [[0,0],[10,10]], "shape_type": "rectangle"}
        ]}"#;
        let ann = from_labelme_str(json).expect("parse");
        assert_eq!(ann.shapes.len(), 1);
        assert_eq!(ann.shapes[0].label, "vest");
        assert!(matches!(
            &ann.notes[0],
            ShapeNote::UnsupportedShapeType { index: 0, shape_type, .. } if shape_type == "point"
        ));
    }

    #[test]
    fn short_shapes_are_kept_with_note() {
        let json = r#"{"shapes": [{"label": "r", "points": [[3,3]], "shape_type": "rectangle"}]}"#;
        let ann = from_labelme_str(json).expect("parse");
        assert_eq!(ann.shapes.len(), 1);
        assert!(matches!(ann.notes[0], ShapeNote::TooFewPoints { count: 1, .. }));
    }

    #[test]
    fn missing_label_is_a_data_error() {
        let json = r#"{"shapes": [{"points": [[0,0],[1,1]], "shape_type": "rectangle"}]}"#;
        let err = from_labelme_str(json).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(err.to_string().contains("missing 'label'"));
    }

    #[test]
    fn missing_points_is_a_data_error() {
        let json = r#"{"shapes": [{"label": "x", "shape_type": "rectangle"}]}"#;
        let err = from_labelme_str(json).unwrap_err();
        assert!(matches!(err, LabelcropError::InvalidShape { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = from_labelme_str("{\"shapes\": [").unwrap_err();
        assert!(matches!(err, LabelcropError::LabelMeParse { .. }));
        let err = from_labelme_str(r#"{"shapes": [{"label": "x", "points": [[1]]}]}"#).unwrap_err();
        assert!(matches!(err, LabelcropError::LabelMeParse { .. }));
    }

    #[test]
    fn document_uses_labelme_field_names() {
        let meta = AnnotationMeta {
            version: None,
            flags: BTreeMap::new(),
        };
        let doc = LabelMeDocument::for_crop(
            &meta,
            "img001_person_0.jpg",
            240,
            480,
            vec![Shape::rectangle("helmet", 70.0, 20.0, 170.0, 80.0)],
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["version"], DEFAULT_LABELME_VERSION);
        assert_eq!(value["imagePath"], "img001_person_0.jpg");
        assert_eq!(value["imageWidth"], 240);
        assert_eq!(value["imageHeight"], 480);
        assert!(value["imageData"].is_null());
        assert_eq!(value["shapes"][0]["label"], "helmet");
    }
}
