//! Fuzz target for crop computation and remapping.
//!
//! Interprets the input as a parent box, a padding factor, image dimensions
//! and one child point, then checks that the crop fits the image and the
//! remapped point fits the crop.
//!
//! Run with:
//!   cargo +nightly fuzz run crop_geometry

#![no_main]

use libfuzzer_sys::fuzz_target;
use labelcrop::geometry::compute_crop;
use labelcrop::ir::{BBoxXYXY, Shape};
use labelcrop::remap::{ClampRemapper, Remapper};

fn f64_at(data: &[u8], i: usize) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[i * 8..i * 8 + 8]);
    f64::from_le_bytes(buf)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 7 * 8 + 4 {
        return;
    }
    let bbox = BBoxXYXY::from_xyxy(f64_at(data, 0), f64_at(data, 1), f64_at(data, 2), f64_at(data, 3));
    let padding = f64_at(data, 4);
    let tail = &data[7 * 8..];
    let width = u16::from_le_bytes([tail[0], tail[1]]) as u32;
    let height = u16::from_le_bytes([tail[2], tail[3]]) as u32;

    let Ok(geometry) = compute_crop(&bbox, padding, (width, height)) else {
        return;
    };
    let rect = geometry.rect;
    assert!(rect.x0 < rect.x1 && rect.x1 <= width);
    assert!(rect.y0 < rect.y1 && rect.y1 <= height);

    let child = Shape::polygon(
        "child",
        &[(f64_at(data, 5), f64_at(data, 6)), (bbox.xmin(), bbox.ymin()), (bbox.xmax(), bbox.ymax())],
    );
    if let Some(remapped) = ClampRemapper.remap(&child, &rect) {
        for p in &remapped.points {
            assert!(p.x >= 0.0 && p.x <= rect.width() as f64);
            assert!(p.y >= 0.0 && p.y <= rect.height() as f64);
        }
    }
});
