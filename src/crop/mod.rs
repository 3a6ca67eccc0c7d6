//! Crop-and-remap: the batch pipeline.
//!
//! For every annotated image: find accepted parent instances, compute a
//! padded crop around each, cut the crop out of the source bitmap and write
//! it next to a LabelMe JSON whose shapes have been remapped into the crop.
//!
//! Output files are named `{stem}_{parent}_{index}.{ext}` and
//! `{stem}_{parent}_{index}.json`, where `index` is the instance's position
//! among the image's parent-labeled shapes. Re-running into the same
//! directory overwrites same-named files.
//!
//! Images are independent, so they are processed in parallel on the rayon
//! pool. Each image produces its own [`ImageOutcome`]; outcomes are merged
//! after the parallel section.

mod report;

pub use report::CropReport;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::error::LabelcropError;
use crate::geometry::{compute_crop, validate_padding, GeometryWarning};
use crate::ir::io_labelme::{write_labelme_json, LabelMeDocument};
use crate::ir::{CropRect, CropSpec, ImageRecord, ParentInstance, Shape, Source};
use crate::matcher::{match_parents, ChildRetention, MatchOptions, RejectReason};
use crate::remap::{remap_all, ClampRemapper, Remapper};
use crate::report::{sort_issues, Issue, IssueCode};
use crate::scan::{scan_dataset, ScanOptions};

/// Padding applied when none is given: the crop is the parent box itself.
pub const DEFAULT_PADDING_FACTOR: f64 = 1.0;

/// Options for [`crop_and_remap`].
#[derive(Clone, Debug)]
pub struct CropOptions {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub parent_label: String,
    /// Any one of these labels admits a parent instance. Empty admits all.
    pub required_child_labels: BTreeSet<String>,
    /// Multiplicative expansion of the parent box; must be finite and > 0.
    pub padding_factor: f64,
    /// Write the remapped parent shape alongside its children.
    pub include_parent: bool,
    pub child_retention: ChildRetention,
    /// Scan subdirectories too. Their layout is mirrored under `output_dir`.
    pub recursive: bool,
}

impl CropOptions {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        parent_label: impl Into<String>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            parent_label: parent_label.into(),
            required_child_labels: BTreeSet::new(),
            padding_factor: DEFAULT_PADDING_FACTOR,
            include_parent: true,
            child_retention: ChildRetention::default(),
            recursive: false,
        }
    }

    pub fn with_required<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_child_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_padding(mut self, padding_factor: f64) -> Self {
        self.padding_factor = padding_factor;
        self
    }

    /// Validates options before any filesystem access.
    pub fn validate(&self) -> Result<(), LabelcropError> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(LabelcropError::config("source directory must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(LabelcropError::config("output directory must not be empty"));
        }
        if self.parent_label.trim().is_empty() {
            return Err(LabelcropError::config("parent label must not be empty"));
        }
        validate_padding(self.padding_factor)
            .map_err(|err| LabelcropError::config(err.to_string()))
    }

    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            parent_label: self.parent_label.clone(),
            required_child_labels: self.required_child_labels.clone(),
            child_retention: self.child_retention,
        }
    }
}

/// Runs the crop-and-remap batch with the default [`ClampRemapper`].
///
/// # Errors
/// Only configuration problems, an unreadable source directory and an
/// uncreatable output directory are returned as `Err`. Per-file failures are
/// recorded in [`CropReport::issues`] and the batch continues. A dataset
/// without any parent instance is a successful, empty report.
pub fn crop_and_remap(opts: &CropOptions) -> Result<CropReport, LabelcropError> {
    crop_and_remap_with(opts, &ClampRemapper)
}

/// Runs the crop-and-remap batch with a caller-supplied [`Remapper`].
pub fn crop_and_remap_with<R: Remapper + ?Sized>(
    opts: &CropOptions,
    remapper: &R,
) -> Result<CropReport, LabelcropError> {
    opts.validate()?;

    let scan = scan_dataset(
        &opts.source_dir,
        &ScanOptions {
            recursive: opts.recursive,
        },
    )?;
    fs::create_dir_all(&opts.output_dir).map_err(|source| LabelcropError::OutputDirCreate {
        path: opts.output_dir.clone(),
        source,
    })?;

    info!(
        "Cropping '{}' instances from {} annotated image(s) into {}",
        opts.parent_label,
        scan.records.len(),
        opts.output_dir.display()
    );

    let match_opts = opts.match_options();
    let outcomes: Vec<ImageOutcome> = scan
        .records
        .par_iter()
        .map(|record| process_image(record, opts, &match_opts, remapper))
        .collect();

    let mut report = CropReport {
        parent_label: opts.parent_label.clone(),
        images_scanned: scan.images_scanned(),
        skipped: scan.skipped,
        issues: scan.issues,
        ..Default::default()
    };
    for outcome in outcomes {
        outcome.merge_into(&mut report);
    }
    report.outputs.sort();
    sort_issues(&mut report.issues);

    info!("{}", report.summary());
    Ok(report)
}

/// Everything one image contributed to the batch.
#[derive(Debug, Default)]
struct ImageOutcome {
    instances_found: usize,
    instances_accepted: usize,
    instances_rejected: usize,
    instances_processed: usize,
    shapes_written: usize,
    shapes_dropped: usize,
    outputs: Vec<PathBuf>,
    issues: Vec<Issue>,
}

impl ImageOutcome {
    fn merge_into(self, report: &mut CropReport) {
        if self.instances_found > 0 {
            report.images_with_parent += 1;
        }
        report.instances_found += self.instances_found;
        report.instances_accepted += self.instances_accepted;
        report.instances_rejected += self.instances_rejected;
        report.instances_processed += self.instances_processed;
        report.files_written += self.outputs.len();
        report.shapes_written += self.shapes_written;
        report.shapes_dropped += self.shapes_dropped;
        report.outputs.extend(self.outputs);
        report.issues.extend(self.issues);
    }
}

fn process_image<R: Remapper + ?Sized>(
    record: &ImageRecord,
    opts: &CropOptions,
    match_opts: &MatchOptions,
    remapper: &R,
) -> ImageOutcome {
    let matched = match_parents(record, match_opts);
    let mut outcome = ImageOutcome {
        instances_found: matched.instances_found(),
        instances_accepted: matched.accepted.len(),
        instances_rejected: matched.rejected.len(),
        ..Default::default()
    };

    for rejected in &matched.rejected {
        match rejected.reason {
            RejectReason::MissingRequiredChild => debug!(
                "{}: '{}' {} has no required child",
                record.annotation_path.display(),
                opts.parent_label,
                rejected.ordinal
            ),
            _ => outcome.issues.push(Issue::warning(
                IssueCode::InvalidParentGeometry,
                &record.annotation_path,
                format!(
                    "'{}' {} skipped: {}",
                    opts.parent_label, rejected.ordinal, rejected.reason
                ),
            )),
        }
    }

    if matched.accepted.is_empty() {
        return outcome;
    }

    let out_dir = output_dir_for(record, opts);
    let mut planned = Vec::with_capacity(matched.accepted.len());
    for instance in &matched.accepted {
        if let Some(spec) = plan_crop(record, instance, opts, &out_dir, &mut outcome.issues) {
            planned.push((instance, spec));
        }
    }
    if planned.is_empty() {
        return outcome;
    }

    if let Err(source) = fs::create_dir_all(&out_dir) {
        warn!("Cannot create {}: {}", out_dir.display(), source);
        outcome.issues.push(Issue::error(
            IssueCode::OutputDirUnwritable,
            &out_dir,
            format!("cannot create output directory: {}", source),
        ));
        return outcome;
    }

    // Decode once, crop many.
    let image = match image::open(&record.image_path) {
        Ok(image) => image,
        Err(source) => {
            let err = LabelcropError::ImageDecode {
                path: record.image_path.clone(),
                source,
            };
            warn!("{}", err);
            outcome.issues.push(Issue::error(
                IssueCode::ImageDecodeFailed,
                &record.image_path,
                format!("{} ({} instance(s) not written)", err, planned.len()),
            ));
            return outcome;
        }
    };

    for (instance, spec) in planned {
        write_instance(
            record,
            instance,
            &spec,
            &image,
            &out_dir,
            opts,
            remapper,
            &mut outcome,
        );
    }

    outcome
}

/// Computes the crop for one instance, turning geometry problems into issues.
fn plan_crop(
    record: &ImageRecord,
    instance: &ParentInstance,
    opts: &CropOptions,
    out_dir: &Path,
    issues: &mut Vec<Issue>,
) -> Option<CropSpec> {
    let dims = (record.width, record.height);
    let geometry = match compute_crop(&instance.bbox, opts.padding_factor, dims) {
        Ok(geometry) => geometry,
        Err(err) => {
            issues.push(Issue::error(
                IssueCode::InvalidParentGeometry,
                &record.annotation_path,
                format!("'{}' {}: {}", opts.parent_label, instance.ordinal, err),
            ));
            return None;
        }
    };

    for warning in &geometry.warnings {
        let code = match warning {
            GeometryWarning::DegenerateParent { .. } => IssueCode::DegenerateParent,
            GeometryWarning::ParentOutsideImage => IssueCode::ParentOutsideImage,
        };
        issues.push(Issue::warning(
            code,
            &record.annotation_path,
            format!("'{}' {}: {}", opts.parent_label, instance.ordinal, warning),
        ));
    }

    let output_stem = output_stem(&record.stem(), &opts.parent_label, instance.ordinal);
    debug!(
        "{} -> {} crop {}",
        record.image_path.display(),
        out_dir.join(&output_stem).display(),
        geometry.rect
    );
    Some(CropSpec {
        source_image: record.image_path.clone(),
        rect: geometry.rect,
        output_stem,
    })
}

#[allow(clippy::too_many_arguments)]
fn write_instance<R: Remapper + ?Sized>(
    record: &ImageRecord,
    instance: &ParentInstance,
    spec: &CropSpec,
    image: &DynamicImage,
    out_dir: &Path,
    opts: &CropOptions,
    remapper: &R,
    outcome: &mut ImageOutcome,
) {
    let rect = spec.rect;
    let image_name = format!("{}.{}", spec.output_stem, record.extension());
    let image_path = out_dir.join(&image_name);
    let json_path = out_dir.join(format!("{}.json", spec.output_stem));

    let cropped = image.crop_imm(rect.x0, rect.y0, rect.width(), rect.height());
    if let Err(source) = cropped.save(&image_path) {
        let err = LabelcropError::ImageWrite {
            path: image_path.clone(),
            source,
        };
        warn!("{}", err);
        outcome
            .issues
            .push(Issue::error(IssueCode::ImageWriteFailed, &image_path, err.to_string()));
        return;
    }
    outcome.outputs.push(image_path);

    let (shapes, dropped) = remap_instance(instance, &rect, opts.include_parent, remapper);
    let document =
        LabelMeDocument::for_crop(&record.meta, image_name, rect.width(), rect.height(), shapes);

    if let Err(err) = write_labelme_json(&json_path, &document) {
        warn!("Failed to write {}: {}", json_path.display(), err);
        outcome
            .issues
            .push(Issue::error(IssueCode::AnnotationWriteFailed, &json_path, err.to_string()));
        return;
    }

    outcome.outputs.push(json_path);
    outcome.instances_processed += 1;
    outcome.shapes_written += document.shapes.len();
    outcome.shapes_dropped += dropped;
}

/// Remaps an instance's shapes into its crop, parent first when included.
pub fn remap_instance<R: Remapper + ?Sized>(
    instance: &ParentInstance,
    rect: &CropRect,
    include_parent: bool,
    remapper: &R,
) -> (Vec<Shape<crate::ir::Crop>>, usize) {
    let mut sources: Vec<Shape<Source>> = Vec::with_capacity(instance.children.len() + 1);
    if include_parent {
        sources.push(instance.parent.clone());
    }
    sources.extend(instance.children.iter().cloned());
    remap_all(remapper, &sources, rect)
}

/// Builds `{stem}_{label}_{index}` with the label reduced to file-safe
/// characters.
pub fn output_stem(image_stem: &str, parent_label: &str, index: usize) -> String {
    format!("{}_{}_{}", image_stem, sanitize_label(parent_label), index)
}

/// Keeps alphanumerics, `_` and `-`. Falls back to `parent` if nothing is left.
pub fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "parent".to_string()
    } else {
        cleaned
    }
}

/// Mirrors the image's directory, relative to the source root, under the
/// output root.
fn output_dir_for(record: &ImageRecord, opts: &CropOptions) -> PathBuf {
    record
        .image_path
        .parent()
        .and_then(|parent| parent.strip_prefix(&opts.source_dir).ok())
        .filter(|rel| !rel.as_os_str().is_empty())
        .map(|rel| opts.output_dir.join(rel))
        .unwrap_or_else(|| opts.output_dir.clone())
}
