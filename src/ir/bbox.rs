//! Axis-aligned bounding boxes in XYXY format.

use super::coord::Coord;

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `TSpace` parameter should be either [`Source`](super::Source) or
/// [`Crop`](super::Crop).
///
/// Boxes derived from points with [`BBoxXYXY::from_points`] are always
/// ordered. A box may still be degenerate (zero width or height), which
/// happens for single-point or collinear annotations; callers decide how
/// to treat those.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    /// Creates a new bounding box from min and max coordinates.
    #[inline]
    pub fn new(min: Coord<TSpace>, max: Coord<TSpace>) -> Self {
        Self { min, max }
    }

    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Computes the tightest box around a set of points.
    ///
    /// Returns `None` for an empty slice.
    pub fn from_points(points: &[Coord<TSpace>]) -> Option<Self> {
        let first = points.first()?;
        let (xmin, ymin, xmax, ymax) = points.iter().skip(1).fold(
            (first.x, first.y, first.x, first.y),
            |(xmin, ymin, xmax, ymax), p| (xmin.min(p.x), ymin.min(p.y), xmax.max(p.x), ymax.max(p.y)),
        );
        Some(Self::from_xyxy(xmin, ymin, xmax, ymax))
    }

    /// Returns the minimum x coordinate.
    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    /// Returns the minimum y coordinate.
    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    /// Returns the maximum x coordinate.
    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    /// Returns the maximum y coordinate.
    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Returns the center point of the box.
    #[inline]
    pub fn center(&self) -> Coord<TSpace> {
        Coord::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Returns true if the box has zero (or negative) width or height.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Returns true if the interiors of the two boxes intersect.
    ///
    /// Boxes that only share an edge or a corner do not overlap. A
    /// degenerate box still overlaps a box whose interior it crosses.
    pub fn overlaps(&self, other: &Self) -> bool {
        let x_overlap = if self.width() == 0.0 || other.width() == 0.0 {
            self.min.x <= other.max.x && self.max.x >= other.min.x
        } else {
            self.min.x < other.max.x && self.max.x > other.min.x
        };
        let y_overlap = if self.height() == 0.0 || other.height() == 0.0 {
            self.min.y <= other.max.y && self.max.y >= other.min.y
        } else {
            self.min.y < other.max.y && self.max.y > other.min.y
        };
        x_overlap && y_overlap
    }

    /// Returns true if `other` lies entirely within this box (edges inclusive).
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// Scales the box about its center by `factor` on both axes.
    pub fn scaled_about_center(&self, factor: f64) -> Self {
        let c = self.center();
        let half_w = self.width() * factor / 2.0;
        let half_h = self.height() * factor / 2.0;
        Self::from_xyxy(c.x - half_w, c.y - half_h, c.x + half_w, c.y + half_h)
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> std::fmt::Display for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.1}, {:.1}, {:.1}, {:.1}]",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}
