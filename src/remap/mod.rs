//! Coordinate remapping from source-image space into crop space.
//!
//! [`ClampRemapper`] translates every point by the crop origin and clamps
//! each coordinate independently into the crop. For polygons that cross the
//! crop boundary this is an approximation: vertices slide along the edge
//! instead of the polygon being clipped, so the clamped outline can cover
//! area the original did not. A true polygon clipper can be dropped in by
//! implementing [`Remapper`].

use crate::ir::{BBoxXYXY, Coord, Crop, CropRect, Shape, ShapeType, Source};

/// Moves shapes from a source image into one of its crops.
pub trait Remapper: Send + Sync {
    /// Remaps `shape` into the local space of `rect`.
    ///
    /// Returns `None` when nothing of the shape survives (no points, or a
    /// zero-area result). Every returned coordinate lies within
    /// `[0, rect.width()] x [0, rect.height()]`.
    fn remap(&self, shape: &Shape<Source>, rect: &CropRect) -> Option<Shape<Crop>>;
}

/// Translate-and-clamp remapping.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClampRemapper;

impl Remapper for ClampRemapper {
    fn remap(&self, shape: &Shape<Source>, rect: &CropRect) -> Option<Shape<Crop>> {
        let (w, h) = (rect.width() as f64, rect.height() as f64);
        let (ox, oy) = (rect.x0 as f64, rect.y0 as f64);

        let points: Vec<Coord<Crop>> = shape
            .points
            .iter()
            .map(|p| Coord::new(clamp(p.x - ox, w), clamp(p.y - oy, h)))
            .collect();

        let bbox = BBoxXYXY::from_points(&points)?;
        if bbox.area() <= 0.0 {
            return None;
        }

        let points = match shape.shape_type {
            ShapeType::Rectangle => vec![bbox.min, bbox.max],
            ShapeType::Polygon => points,
        };
        Some(shape.with_points(points))
    }
}

/// Clamps into `[0, max]`, mapping NaN to 0.
fn clamp(v: f64, max: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, max)
    }
}

/// Remaps a batch of shapes, returning the survivors and the number dropped.
pub fn remap_all<R: Remapper + ?Sized>(
    remapper: &R,
    shapes: &[Shape<Source>],
    rect: &CropRect,
) -> (Vec<Shape<Crop>>, usize) {
    let remapped: Vec<Shape<Crop>> = shapes
        .iter()
        .filter_map(|shape| remapper.remap(shape, rect))
        .collect();
    let dropped = shapes.len() - remapped.len();
    (remapped, dropped)
}
