//! Annotation previews.
//!
//! Samples a few annotated images, draws their shapes onto copies of the
//! bitmaps and writes the copies to a scratch directory. The source dataset
//! is never touched and the crop pipeline is not involved.

mod report;

pub use report::{PreviewEntry, PreviewReport};

use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::error::LabelcropError;
use crate::ir::{ImageRecord, Shape, ShapeType, Source};
use crate::report::{sort_issues, Issue, IssueCode};
use crate::scan::{scan_dataset, ScanOptions};

/// Golden-angle hue step, in degrees, between consecutive shapes.
const HUE_STEP: f64 = 137.508;
const OUTLINE_THICKNESS: i32 = 2;
const FONT_SCALE: f32 = 16.0;

const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Options for [`generate_annotated_previews`].
#[derive(Clone, Debug)]
pub struct PreviewOptions {
    pub source_dir: PathBuf,
    /// Upper bound on rendered images; must be at least 1.
    pub num_previews: usize,
    /// Where rendered PNGs go. Created if missing.
    pub temp_dir: PathBuf,
    /// Fixes the sample for reproducible runs.
    pub seed: Option<u64>,
    pub recursive: bool,
    /// Font for label text. System fonts are tried when absent.
    pub font_path: Option<PathBuf>,
}

impl PreviewOptions {
    pub fn new(source_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>, num_previews: usize) -> Self {
        Self {
            source_dir: source_dir.into(),
            num_previews,
            temp_dir: temp_dir.into(),
            seed: None,
            recursive: false,
            font_path: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), LabelcropError> {
        if self.num_previews == 0 {
            return Err(LabelcropError::config("number of previews must be at least 1"));
        }
        if self.source_dir.as_os_str().is_empty() {
            return Err(LabelcropError::config("source directory must not be empty"));
        }
        if self.temp_dir.as_os_str().is_empty() {
            return Err(LabelcropError::config("preview directory must not be empty"));
        }
        Ok(())
    }
}

/// Renders up to `num_previews` randomly chosen annotated images.
///
/// Having fewer annotated images than requested is not an error; all of
/// them are rendered. Per-image failures become issues.
pub fn generate_annotated_previews(opts: &PreviewOptions) -> Result<PreviewReport, LabelcropError> {
    opts.validate()?;

    let scan = scan_dataset(
        &opts.source_dir,
        &ScanOptions {
            recursive: opts.recursive,
        },
    )?;
    fs::create_dir_all(&opts.temp_dir).map_err(|source| LabelcropError::OutputDirCreate {
        path: opts.temp_dir.clone(),
        source,
    })?;

    let annotated: Vec<&ImageRecord> = scan
        .records
        .iter()
        .filter(|record| !record.shapes.is_empty())
        .collect();
    let sample = sample_records(annotated, opts.num_previews, opts.seed);
    info!(
        "Rendering {} preview(s) into {}",
        sample.len(),
        opts.temp_dir.display()
    );

    let font = load_font(opts.font_path.as_deref());
    let mut report = PreviewReport {
        issues: scan.issues,
        ..Default::default()
    };

    for (id, record) in sample.into_iter().enumerate() {
        let out_path = opts
            .temp_dir
            .join(format!("preview_{}_{}.png", id, record.stem()));
        match render_preview(record, font.as_ref(), &out_path) {
            Ok(()) => report.previews.push(PreviewEntry {
                id,
                source_path: record.image_path.clone(),
                path: out_path,
                annotations: record.shapes.clone(),
            }),
            Err(err) => {
                warn!("Preview of {} failed: {}", record.image_path.display(), err);
                report.issues.push(Issue::error(
                    IssueCode::PreviewFailed,
                    &record.image_path,
                    err.to_string(),
                ));
            }
        }
    }

    report.preview_count = report.previews.len();
    sort_issues(&mut report.issues);
    Ok(report)
}

/// Picks up to `count` records without replacement.
fn sample_records<'a>(
    mut records: Vec<&'a ImageRecord>,
    count: usize,
    seed: Option<u64>,
) -> Vec<&'a ImageRecord> {
    records.sort_by(|a, b| a.image_path.cmp(&b.image_path));
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        records.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        records.shuffle(&mut rng);
    }
    records.truncate(count);
    records
}

fn render_preview(
    record: &ImageRecord,
    font: Option<&FontVec>,
    out_path: &Path,
) -> Result<(), LabelcropError> {
    let mut canvas = image::open(&record.image_path)
        .map_err(|source| LabelcropError::ImageDecode {
            path: record.image_path.clone(),
            source,
        })?
        .to_rgb8();

    for (index, shape) in record.shapes.iter().enumerate() {
        let color = shape_color(index);
        draw_shape(&mut canvas, shape, color);
        if let Some(font) = font {
            draw_label(&mut canvas, shape, color, font);
        }
    }

    canvas
        .save(out_path)
        .map_err(|source| LabelcropError::ImageWrite {
            path: out_path.to_path_buf(),
            source,
        })
}

/// Outline colour for the shape at `index`: fully saturated, hue rotated by
/// the golden angle per shape.
pub fn shape_color(index: usize) -> Rgb<u8> {
    let hue = (index as f64 * HUE_STEP).rem_euclid(360.0);
    hsv_to_rgb(hue, 1.0, 1.0)
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb<u8> {
    let c = value * saturation;
    let h = hue / 60.0;
    let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb([to_byte(r), to_byte(g), to_byte(b)])
}

fn draw_shape(canvas: &mut RgbImage, shape: &Shape<Source>, color: Rgb<u8>) {
    // Everything is clamped to the canvas plus the outline margin before it
    // reaches integer pixel space.
    let margin = OUTLINE_THICKNESS as f64;
    let (w, h) = (canvas.width() as f64, canvas.height() as f64);
    let bounds = (-margin, -margin, w + margin, h + margin);

    match shape.shape_type {
        ShapeType::Rectangle => {
            let Some(bbox) = shape.bbox() else { return };
            if !bbox.is_finite() {
                return;
            }
            let left = bbox.xmin().round().clamp(bounds.0, bounds.2) as i32;
            let top = bbox.ymin().round().clamp(bounds.1, bounds.3) as i32;
            let right = bbox.xmax().round().clamp(bounds.0, bounds.2) as i32;
            let bottom = bbox.ymax().round().clamp(bounds.1, bounds.3) as i32;
            let width = (right - left).max(1);
            let height = (bottom - top).max(1);
            for t in 0..OUTLINE_THICKNESS {
                let rect = Rect::at(left - t, top - t)
                    .of_size((width + 2 * t) as u32, (height + 2 * t) as u32);
                draw_hollow_rect_mut(canvas, rect, color);
            }
        }
        ShapeType::Polygon => {
            let points: Vec<(f64, f64)> = shape
                .points
                .iter()
                .filter(|p| p.is_finite())
                .map(|p| (p.x, p.y))
                .collect();
            if points.len() < 2 {
                return;
            }
            for (i, &start) in points.iter().enumerate() {
                let end = points[(i + 1) % points.len()];
                for t in 0..OUTLINE_THICKNESS {
                    let d = t as f64;
                    for (a, b) in [
                        ((start.0 + d, start.1), (end.0 + d, end.1)),
                        ((start.0, start.1 + d), (end.0, end.1 + d)),
                    ] {
                        if let Some((a, b)) = clip_segment(a, b, bounds) {
                            draw_line_segment_mut(
                                canvas,
                                (a.0 as f32, a.1 as f32),
                                (b.0 as f32, b.1 as f32),
                                color,
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Liang-Barsky clip of the segment `a -> b` to `(xmin, ymin, xmax, ymax)`.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    (xmin, ymin, xmax, ymax): (f64, f64, f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    if !dx.is_finite() || !dy.is_finite() {
        return None;
    }

    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [
        (-dx, a.0 - xmin),
        (dx, xmax - a.0),
        (-dy, a.1 - ymin),
        (dy, ymax - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
    }

    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}

fn draw_label(canvas: &mut RgbImage, shape: &Shape<Source>, color: Rgb<u8>, font: &FontVec) {
    let Some(anchor) = shape.points.first().filter(|p| p.is_finite()) else {
        return;
    };
    let x = anchor.x.round().clamp(0.0, canvas.width() as f64) as i32;
    let y = (anchor.y - FONT_SCALE as f64)
        .round()
        .clamp(0.0, canvas.height() as f64) as i32;
    draw_text_mut(canvas, color, x, y, FONT_SCALE, font, &shape.label);
}

/// Loads the explicit font if given, else the first readable system font.
fn load_font(explicit: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = explicit {
        match fs::read(path).map(FontVec::try_from_vec) {
            Ok(Ok(font)) => {
                debug!("Loaded font: {}", path.display());
                return Some(font);
            }
            Ok(Err(_)) => warn!("Cannot parse font {}; trying system fonts", path.display()),
            Err(err) => warn!("Cannot read font {}: {}; trying system fonts", path.display(), err),
        }
    }

    for path in SYSTEM_FONT_PATHS {
        if let Ok(data) = fs::read(path) {
            if let Ok(font) = FontVec::try_from_vec(data) {
                debug!("Loaded system font: {}", path);
                return Some(font);
            }
        }
    }

    debug!("No usable font found, label text will be skipped");
    None
}
