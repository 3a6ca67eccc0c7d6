//! Typed annotation model for LabelMe datasets.
//!
//! # Design Principles
//!
//! 1. **Typed spaces**: coordinates carry a marker for the image they belong
//!    to ([`Source`] or [`Crop`]), so a shape cannot reach a cropped
//!    annotation without being remapped first.
//!
//! 2. **Decode once**: LabelMe JSON is decoded into [`Shape`] at the IO
//!    boundary ([`io_labelme`]); the pipeline never handles raw JSON.
//!
//! 3. **Permissive construction**: degenerate shapes (zero-area, too few
//!    points) are representable so later stages can report them instead of
//!    the reader rejecting a whole file.
//!
//! # Example
//!
//! ```
//! use labelcrop::ir::{BBoxXYXY, Shape, Source};
//!
//! let person: Shape<Source> = Shape::rectangle("person", 100.0, 100.0, 300.0, 500.0);
//! let helmet: Shape<Source> = Shape::polygon("helmet", &[(150.0, 60.0), (250.0, 60.0), (200.0, 140.0)]);
//!
//! let body = person.bbox().unwrap();
//! assert!(body.overlaps(&helmet.bbox().unwrap()));
//! assert_eq!(body, BBoxXYXY::from_xyxy(100.0, 100.0, 300.0, 500.0));
//! ```

mod bbox;
mod coord;
pub mod io_labelme;
mod model;
mod space;

// Re-export core types for convenient access
pub use bbox::BBoxXYXY;
pub use coord::Coord;
pub use model::{
    AnnotationMeta, CropRect, CropSpec, ImageRecord, ParentInstance, Shape, ShapeType,
};
pub use space::{Crop, Source};
