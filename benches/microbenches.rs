//! Criterion microbenches for the per-instance hot path.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - LabelMe JSON parsing (from_labelme_str)
//! - Parent/child matching (match_shapes)
//! - Crop computation (compute_crop)
//! - Shape remapping (remap_all with ClampRemapper)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use labelcrop::geometry::compute_crop;
use labelcrop::ir::io_labelme::from_labelme_str;
use labelcrop::ir::{BBoxXYXY, CropRect, Shape, Source};
use labelcrop::matcher::{match_shapes, MatchOptions};
use labelcrop::remap::{remap_all, ClampRemapper};

/// A crowded scene: a grid of parents, each with a few children.
fn crowded_scene(parents: usize) -> Vec<Shape<Source>> {
    let mut shapes = Vec::with_capacity(parents * 4);
    for i in 0..parents {
        let x = (i % 10) as f64 * 100.0;
        let y = (i / 10) as f64 * 200.0;
        shapes.push(Shape::rectangle("person", x, y, x + 80.0, y + 180.0));
        shapes.push(Shape::rectangle("helmet", x + 20.0, y - 10.0, x + 60.0, y + 30.0));
        shapes.push(Shape::rectangle("vest", x + 10.0, y + 60.0, x + 70.0, y + 120.0));
        shapes.push(Shape::polygon(
            "shadow",
            &[(x - 20.0, y + 170.0), (x + 100.0, y + 170.0), (x + 110.0, y + 200.0), (x - 30.0, y + 200.0)],
        ));
    }
    shapes
}

fn scene_json(shapes: &[Shape<Source>]) -> String {
    let shapes = serde_json::to_value(shapes).unwrap();
    serde_json::json!({
        "version": "5.2.1",
        "flags": {},
        "shapes": shapes,
        "imagePath": "scene.jpg",
        "imageData": null,
        "imageHeight": 2000,
        "imageWidth": 1000
    })
    .to_string()
}

fn bench_labelme_parse(c: &mut Criterion) {
    let json = scene_json(&crowded_scene(50));
    let mut group = c.benchmark_group("labelme_parse");
    group.throughput(Throughput::Bytes(json.len() as u64));

    group.bench_function("from_labelme_str", |b| {
        b.iter(|| {
            let ann = from_labelme_str(black_box(&json)).unwrap();
            black_box(ann)
        })
    });

    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let shapes = crowded_scene(100);
    let opts = MatchOptions::new("person").with_required(["helmet", "vest"]);
    let mut group = c.benchmark_group("match");
    group.throughput(Throughput::Elements(shapes.len() as u64));

    group.bench_function("match_shapes_100_parents", |b| {
        b.iter(|| black_box(match_shapes(black_box(&shapes), &opts)))
    });

    group.finish();
}

fn bench_geometry(c: &mut Criterion) {
    let boxes: Vec<BBoxXYXY<Source>> = (0..256)
        .map(|i| {
            let x = (i % 16) as f64 * 60.0 - 40.0;
            let y = (i / 16) as f64 * 40.0 - 20.0;
            BBoxXYXY::from_xyxy(x, y, x + 75.5, y + 150.25)
        })
        .collect();

    c.bench_function("compute_crop_256", |b| {
        b.iter(|| {
            for bbox in &boxes {
                black_box(compute_crop(black_box(bbox), 1.2, (800, 600)).unwrap());
            }
        })
    });
}

fn bench_remap(c: &mut Criterion) {
    let shapes = crowded_scene(100);
    let rect = CropRect {
        x0: 180,
        y0: 150,
        x1: 420,
        y1: 630,
    };

    c.bench_function("remap_all_400_shapes", |b| {
        b.iter(|| black_box(remap_all(&ClampRemapper, black_box(&shapes), &rect)))
    });
}

criterion_group!(
    benches,
    bench_labelme_parse,
    bench_match,
    bench_geometry,
    bench_remap
);
criterion_main!(benches);
