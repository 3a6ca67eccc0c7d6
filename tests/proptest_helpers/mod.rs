#![allow(dead_code)]

use labelcrop::ir::{BBoxXYXY, CropRect, Shape, Source};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Slack allowed when comparing crop rectangles to the float boxes they
/// came from.
pub const EPS_CONTAIN: f64 = 1e-6;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(128);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_image_dims() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=2000, 1u32..=2000)
}

pub fn arb_padding() -> impl Strategy<Value = f64> {
    prop_oneof![Just(1.0), 0.25f64..1.0, 1.0f64..3.0]
}

/// A box anywhere within `[-0.5w, 1.5w] x [-0.5h, 1.5h]`, possibly
/// degenerate or fully outside the image.
pub fn arb_bbox_near((w, h): (u32, u32)) -> impl Strategy<Value = BBoxXYXY<Source>> {
    let (w, h) = (w as f64, h as f64);
    (
        -0.5 * w..1.5 * w,
        -0.5 * h..1.5 * h,
        0.0..w,
        0.0..h,
    )
        .prop_map(|(x, y, bw, bh)| BBoxXYXY::from_xyxy(x, y, x + bw, y + bh))
}

/// A box fully inside a `(w, h)` image.
pub fn arb_bbox_inside((w, h): (u32, u32)) -> impl Strategy<Value = BBoxXYXY<Source>> {
    let (w, h) = (w as f64, h as f64);
    (0.0..=w, 0.0..=w, 0.0..=h, 0.0..=h).prop_map(|(x0, x1, y0, y1)| {
        BBoxXYXY::from_xyxy(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    })
}

/// A crop rectangle inside an image of at most 2000x2000.
pub fn arb_crop_rect() -> impl Strategy<Value = CropRect> {
    (0u32..1500, 0u32..1500, 1u32..500, 1u32..500).prop_map(|(x0, y0, w, h)| CropRect {
        x0,
        y0,
        x1: x0 + w,
        y1: y0 + h,
    })
}

pub fn arb_shape() -> impl Strategy<Value = Shape<Source>> {
    let coord = (-500.0f64..2500.0, -500.0f64..2500.0);
    prop_oneof![
        (coord.clone(), coord.clone()).prop_map(|((x0, y0), (x1, y1))| {
            Shape::rectangle("r", x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
        }),
        proptest::collection::vec(coord, 3..8).prop_map(|pts| Shape::polygon("p", &pts)),
    ]
}
