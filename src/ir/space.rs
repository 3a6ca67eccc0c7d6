//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! source-image pixels from cropped-image pixels at compile time. The only
//! way to move a shape from one space to the other is through a
//! [`Remapper`](crate::remap::Remapper).

use std::fmt;

/// Marker type for pixel coordinates in the original, uncropped image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {}

/// Marker type for pixel coordinates local to a cropped output image,
/// where (0, 0) is the crop's top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crop {}

impl fmt::Debug for Source {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Source has no variants
    }
}

impl fmt::Debug for Crop {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {} // This is unreachable since Crop has no variants
    }
}
