//! Crop geometry: padding a parent box and clipping it to the image.
//!
//! The padded box is clipped to `[0, W] x [0, H]` and snapped outward to
//! whole pixels, so a crop never fails at an image edge; it just gets
//! narrower. The resulting [`CropRect`] always satisfies
//! `0 <= x0 < x1 <= W` and `0 <= y0 < y1 <= H`.

use std::fmt;

use log::warn;
use thiserror::Error;

use crate::ir::{BBoxXYXY, CropRect, Source};

/// Values this close to an integer are treated as that integer before
/// flooring/ceiling, so `80.00000000000001` does not widen a crop by a pixel.
const SNAP_EPS: f64 = 1e-9;

/// Why a crop could not be computed at all.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("padding factor must be finite and > 0 (got {0})")]
    InvalidPadding(f64),
    #[error("image has zero size ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("parent box has non-finite coordinates: {0:?}")]
    NonFiniteBox(BBoxXYXY<Source>),
}

/// A recoverable oddity noticed while computing a crop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometryWarning {
    /// The parent box had zero width and/or height; a 1-pixel extent was
    /// substituted on that axis.
    DegenerateParent { zero_width: bool, zero_height: bool },
    /// The padded parent box does not intersect the image; the crop was
    /// snapped to the nearest 1-pixel strip along the image edge.
    ParentOutsideImage,
}

impl fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryWarning::DegenerateParent {
                zero_width,
                zero_height,
            } => {
                let axes = match (zero_width, zero_height) {
                    (true, true) => "width and height",
                    (true, false) => "width",
                    _ => "height",
                };
                write!(f, "parent box has zero {}; using a 1-pixel extent", axes)
            }
            GeometryWarning::ParentOutsideImage => {
                write!(f, "parent box lies outside the image; crop snapped to the edge")
            }
        }
    }
}

/// A computed crop rectangle plus anything worth reporting about it.
#[derive(Clone, Debug, PartialEq)]
pub struct CropGeometry {
    pub rect: CropRect,
    pub warnings: Vec<GeometryWarning>,
}

/// Checks a padding factor without computing anything.
pub fn validate_padding(padding_factor: f64) -> Result<(), GeometryError> {
    if padding_factor.is_finite() && padding_factor > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidPadding(padding_factor))
    }
}

/// Expands `bbox` about its center by `padding_factor` and clips it to an
/// image of `(width, height)` pixels.
///
/// A factor of 1.2 makes the box 20% larger on each axis; factors below 1
/// shrink it.
pub fn compute_crop(
    bbox: &BBoxXYXY<Source>,
    padding_factor: f64,
    (width, height): (u32, u32),
) -> Result<CropGeometry, GeometryError> {
    validate_padding(padding_factor)?;
    if width == 0 || height == 0 {
        return Err(GeometryError::EmptyImage { width, height });
    }
    if !bbox.is_finite() {
        return Err(GeometryError::NonFiniteBox(*bbox));
    }

    let mut warnings = Vec::new();
    let (base, degenerate) = with_min_extent(bbox);
    if let Some(w) = degenerate {
        warn!("Degenerate parent box {}: {}", bbox, w);
        warnings.push(w);
    }

    // Judged on the box as annotated, before the 1-pixel substitution.
    let annotated = bbox.scaled_about_center(padding_factor);
    let x_outside = misses_axis(annotated.xmin(), annotated.xmax(), width);
    let y_outside = misses_axis(annotated.ymin(), annotated.ymax(), height);

    let padded = base.scaled_about_center(padding_factor);
    let (x0, x1) = clip_span(padded.xmin(), padded.xmax(), width);
    let (y0, y1) = clip_span(padded.ymin(), padded.ymax(), height);
    if x_outside || y_outside {
        warn!(
            "Parent box {} is outside the {}x{} image",
            bbox, width, height
        );
        warnings.push(GeometryWarning::ParentOutsideImage);
    }

    Ok(CropGeometry {
        rect: CropRect { x0, y0, x1, y1 },
        warnings,
    })
}

/// Replaces a zero extent on either axis with the 1-pixel extent of the
/// pixel containing the original coordinate.
fn with_min_extent(bbox: &BBoxXYXY<Source>) -> (BBoxXYXY<Source>, Option<GeometryWarning>) {
    let zero_width = bbox.width() <= 0.0;
    let zero_height = bbox.height() <= 0.0;
    if !zero_width && !zero_height {
        return (*bbox, None);
    }

    let c = bbox.center();
    let (xmin, xmax) = if zero_width {
        (c.x.floor(), c.x.floor() + 1.0)
    } else {
        (bbox.xmin(), bbox.xmax())
    };
    let (ymin, ymax) = if zero_height {
        (c.y.floor(), c.y.floor() + 1.0)
    } else {
        (bbox.ymin(), bbox.ymax())
    };

    (
        BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax),
        Some(GeometryWarning::DegenerateParent {
            zero_width,
            zero_height,
        }),
    )
}

/// Whether `[lo, hi]` misses `[0, limit]`. A span with positive length must
/// overlap the interior; a zero-length one only has to touch the closed range.
fn misses_axis(lo: f64, hi: f64, limit: u32) -> bool {
    let limit_f = limit as f64;
    if hi - lo > 0.0 {
        hi <= 0.0 || lo >= limit_f
    } else {
        hi < 0.0 || lo > limit_f
    }
}

/// Clips `[lo, hi]` to `[0, limit]` in whole pixels, guaranteeing a span of
/// at least one pixel.
fn clip_span(lo: f64, hi: f64, limit: u32) -> (u32, u32) {
    let limit_f = limit as f64;
    let start = (lo.max(0.0) + SNAP_EPS).floor().min(limit_f - 1.0);
    let end = (hi.min(limit_f) - SNAP_EPS).ceil().max(start + 1.0).min(limit_f);

    (start as u32, end as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    type B = BBoxXYXY<Source>;

    fn rect(x0: u32, y0: u32, x1: u32, y1: u32) -> CropRect {
        CropRect { x0, y0, x1, y1 }
    }

    #[test]
    fn padding_is_centered_and_proportional() {
        let bbox = B::from_xyxy(100.0, 100.0, 300.0, 500.0);
        let geom = compute_crop(&bbox, 1.2, (800, 600)).unwrap();
        assert_eq!(geom.rect, rect(80, 60, 320, 540));
        assert_eq!(geom.rect.width(), 240);
        assert_eq!(geom.rect.height(), 480);
        assert!(geom.warnings.is_empty());
    }

    #[test]
    fn unit_padding_snaps_outward() {
        let bbox = B::from_xyxy(10.4, 20.6, 30.2, 40.0);
        let geom = compute_crop(&bbox, 1.0, (100, 100)).unwrap();
        assert_eq!(geom.rect, rect(10, 20, 31, 40));
    }

    #[test]
    fn crop_is_clipped_at_image_edges() {
        let bbox = B::from_xyxy(0.0, 0.0, 100.0, 100.0);
        let geom = compute_crop(&bbox, 2.0, (120, 80)).unwrap();
        assert_eq!(geom.rect, rect(0, 0, 120, 80));
        assert!(geom.warnings.is_empty());
    }

    #[test]
    fn degenerate_box_gets_one_pixel_extent() {
        let bbox = B::from_xyxy(50.0, 10.0, 50.0, 30.0);
        let geom = compute_crop(&bbox, 1.0, (100, 100)).unwrap();
        assert_eq!(geom.rect.width(), 1);
        assert_eq!(geom.rect.height(), 20);
        assert_eq!(
            geom.warnings,
            vec![GeometryWarning::DegenerateParent {
                zero_width: true,
                zero_height: false
            }]
        );
    }

    #[test]
    fn point_box_at_origin_stays_inside() {
        let bbox = B::from_xyxy(0.0, 0.0, 0.0, 0.0);
        let geom = compute_crop(&bbox, 1.0, (10, 10)).unwrap();
        assert_eq!(geom.rect, rect(0, 0, 1, 1));

        let padded = compute_crop(&bbox, 1.5, (10, 10)).unwrap();
        assert_eq!(padded.rect, rect(0, 0, 2, 2));
    }

    #[test]
    fn box_outside_image_snaps_to_edge() {
        let bbox = B::from_xyxy(500.0, 10.0, 600.0, 20.0);
        let geom = compute_crop(&bbox, 1.0, (100, 100)).unwrap();
        assert_eq!(geom.rect, rect(99, 10, 100, 20));
        assert!(geom.warnings.contains(&GeometryWarning::ParentOutsideImage));

        let bbox = B::from_xyxy(-50.0, -50.0, -10.0, -10.0);
        let geom = compute_crop(&bbox, 1.0, (100, 100)).unwrap();
        assert_eq!(geom.rect, rect(0, 0, 1, 1));
    }

    #[test]
    fn degenerate_box_on_far_edge_is_not_outside() {
        let bbox = B::from_xyxy(100.0, 10.0, 100.0, 30.0);
        let geom = compute_crop(&bbox, 1.0, (100, 100)).unwrap();
        assert_eq!(geom.rect, rect(99, 10, 100, 30));
        assert_eq!(
            geom.warnings,
            vec![GeometryWarning::DegenerateParent {
                zero_width: true,
                zero_height: false
            }]
        );

        let corner = B::from_xyxy(100.0, 100.0, 100.0, 100.0);
        let geom = compute_crop(&corner, 1.5, (100, 100)).unwrap();
        assert_eq!(geom.rect, rect(99, 99, 100, 100));
        assert!(!geom.warnings.contains(&GeometryWarning::ParentOutsideImage));
    }

    #[test]
    fn degenerate_box_past_the_edge_is_outside() {
        let bbox = B::from_xyxy(140.0, 10.0, 140.0, 30.0);
        let geom = compute_crop(&bbox, 1.0, (100, 100)).unwrap();
        assert_eq!(geom.rect, rect(99, 10, 100, 30));
        assert!(geom.warnings.contains(&GeometryWarning::ParentOutsideImage));
    }

    #[test]
    fn shrinking_padding_is_allowed() {
        let bbox = B::from_xyxy(0.0, 0.0, 100.0, 100.0);
        let geom = compute_crop(&bbox, 0.5, (200, 200)).unwrap();
        assert_eq!(geom.rect, rect(25, 25, 75, 75));
    }

    #[test]
    fn invalid_inputs_are_errors() {
        let bbox = B::from_xyxy(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            compute_crop(&bbox, 0.0, (10, 10)),
            Err(GeometryError::InvalidPadding(0.0))
        );
        assert!(compute_crop(&bbox, f64::NAN, (10, 10)).is_err());
        assert_eq!(
            compute_crop(&bbox, 1.0, (0, 10)),
            Err(GeometryError::EmptyImage {
                width: 0,
                height: 10
            })
        );
        let nan = B::from_xyxy(f64::NAN, 0.0, 10.0, 10.0);
        assert!(matches!(
            compute_crop(&nan, 1.0, (10, 10)),
            Err(GeometryError::NonFiniteBox(_))
        ));
    }
}
