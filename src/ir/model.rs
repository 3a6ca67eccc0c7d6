//! Core data model for a LabelMe dataset.
//!
//! Shapes are decoded once at the IO boundary into [`Shape`] and never
//! carried around as loose JSON. Everything downstream (matcher, geometry,
//! remapper) works on these types.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use super::bbox::BBoxXYXY;
use super::coord::Coord;
use super::space::Source;

/// The geometric kind of a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Axis-aligned box, normally stored as two corner points.
    Rectangle,
    /// Closed polygon with three or more vertices.
    Polygon,
}

impl ShapeType {
    /// The LabelMe `shape_type` string for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeType::Rectangle => "rectangle",
            ShapeType::Polygon => "polygon",
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled rectangle or polygon in the `TSpace` coordinate space.
///
/// Serializes in LabelMe's shape layout.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(bound = "")]
pub struct Shape<TSpace> {
    pub label: String,
    pub points: Vec<Coord<TSpace>>,
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub shape_type: ShapeType,
    pub flags: BTreeMap<String, bool>,
}

impl<TSpace> Shape<TSpace> {
    /// Creates a shape with no group, description or flags.
    pub fn new(label: impl Into<String>, shape_type: ShapeType, points: Vec<Coord<TSpace>>) -> Self {
        Self {
            label: label.into(),
            points,
            group_id: None,
            description: None,
            shape_type,
            flags: BTreeMap::new(),
        }
    }

    /// Convenience constructor for a two-corner rectangle.
    pub fn rectangle(label: impl Into<String>, xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self::new(
            label,
            ShapeType::Rectangle,
            vec![Coord::new(xmin, ymin), Coord::new(xmax, ymax)],
        )
    }

    /// Convenience constructor for a polygon from `(x, y)` pairs.
    pub fn polygon(label: impl Into<String>, points: &[(f64, f64)]) -> Self {
        Self::new(
            label,
            ShapeType::Polygon,
            points.iter().copied().map(Coord::from).collect(),
        )
    }

    /// The tightest box around this shape's points, or `None` if it has none.
    pub fn bbox(&self) -> Option<BBoxXYXY<TSpace>> {
        BBoxXYXY::from_points(&self.points)
    }

    /// Copies label and metadata onto a new set of points in another space.
    pub fn with_points<TOther>(&self, points: Vec<Coord<TOther>>) -> Shape<TOther> {
        Shape {
            label: self.label.clone(),
            points,
            group_id: self.group_id,
            description: self.description.clone(),
            shape_type: self.shape_type,
            flags: self.flags.clone(),
        }
    }
}

/// Top-level annotation fields carried from a source file into its crops.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationMeta {
    pub version: Option<String>,
    pub flags: BTreeMap<String, bool>,
}

/// One source image together with its decoded annotation.
#[derive(Clone, Debug)]
pub struct ImageRecord {
    /// Path of the image file.
    pub image_path: PathBuf,
    /// Path of the sibling `.json` annotation.
    pub annotation_path: PathBuf,
    /// Width in pixels, as read from the image header.
    pub width: u32,
    /// Height in pixels, as read from the image header.
    pub height: u32,
    pub shapes: Vec<Shape<Source>>,
    pub meta: AnnotationMeta,
}

impl ImageRecord {
    /// The image file name without its extension.
    pub fn stem(&self) -> String {
        self.image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The lower-cased image extension, defaulting to `png`.
    pub fn extension(&self) -> String {
        self.image_path
            .extension()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "png".to_string())
    }
}

/// A parent-labeled shape with the child shapes that overlap it.
#[derive(Clone, Debug)]
pub struct ParentInstance {
    /// Position among the image's parent-labeled shapes (0-based). Used as
    /// the instance index in output file names.
    pub ordinal: usize,
    pub parent: Shape<Source>,
    pub bbox: BBoxXYXY<Source>,
    pub children: Vec<Shape<Source>>,
}

/// An integer pixel rectangle inside a source image.
///
/// Always satisfies `x0 < x1 <= width` and `y0 < y1 <= height` for the image
/// it was computed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CropRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl CropRect {
    #[inline]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

impl fmt::Display for CropRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})-({}, {}) {}x{}",
            self.x0,
            self.y0,
            self.x1,
            self.y1,
            self.width(),
            self.height()
        )
    }
}

/// Everything needed to produce one cropped output pair.
#[derive(Clone, Debug)]
pub struct CropSpec {
    pub source_image: PathBuf,
    pub rect: CropRect,
    /// Output file name without extension, e.g. `img001_person_0`.
    pub output_stem: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Crop;

    #[test]
    fn shape_serializes_in_labelme_layout() {
        let shape: Shape<Crop> = Shape::rectangle("helmet", 1.0, 2.0, 3.0, 4.0);
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["label"], "helmet");
        assert_eq!(value["shape_type"], "rectangle");
        assert_eq!(value["points"], serde_json::json!([[1.0, 2.0], [3.0, 4.0]]));
        assert!(value["group_id"].is_null());
        assert!(value.get("description").is_none());
        assert_eq!(value["flags"], serde_json::json!({}));
    }

    #[test]
    fn with_points_keeps_metadata() {
        let mut shape: Shape<Source> = Shape::polygon("vest", &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0)]);
        shape.group_id = Some(7);
        shape.flags.insert("occluded".into(), true);

        let moved: Shape<Crop> = shape.with_points(vec![Coord::new(1.0, 1.0)]);
        assert_eq!(moved.label, "vest");
        assert_eq!(moved.group_id, Some(7));
        assert_eq!(moved.shape_type, ShapeType::Polygon);
        assert_eq!(moved.flags.get("occluded"), Some(&true));
        assert_eq!(moved.points.len(), 1);
    }

    #[test]
    fn crop_rect_dimensions() {
        let rect = CropRect {
            x0: 80,
            y0: 60,
            x1: 320,
            y1: 540,
        };
        assert_eq!(rect.width(), 240);
        assert_eq!(rect.height(), 480);
        assert_eq!(rect.to_string(), "(80, 60)-(320, 540) 240x480");
    }

    #[test]
    fn record_stem_and_extension() {
        let record = ImageRecord {
            image_path: PathBuf::from("/data/site_A/IMG_001.JPG"),
            annotation_path: PathBuf::from("/data/site_A/IMG_001.json"),
            width: 10,
            height: 10,
            shapes: Vec::new(),
            meta: AnnotationMeta::default(),
        };
        assert_eq!(record.stem(), "IMG_001");
        assert_eq!(record.extension(), "jpg");
    }
}
