//! Dataset scanning: pairs every image with its same-basename LabelMe JSON.
//!
//! Images without a JSON sibling are counted as skipped, as are later
//! images sharing a stem (and so a JSON) with an earlier one. Files whose JSON or
//! image header cannot be read are recorded as issues and excluded; scanning
//! carries on. Only an unreadable source directory fails the whole scan.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::LabelcropError;
use crate::ir::io_labelme::{read_labelme_json, ShapeNote};
use crate::ir::ImageRecord;
use crate::report::{count_severity, Issue, IssueCode, Severity};

/// Image extensions recognised by the scanner (compared case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "webp", "tif", "tiff", "gif"];

/// Scanner options.
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Descend into subdirectories. Off by default: only the top level of the
    /// source directory is scanned.
    pub recursive: bool,
}

/// The outcome of scanning a source directory.
#[derive(Clone, Debug, Default)]
pub struct ScanReport {
    /// Successfully decoded image + annotation pairs, sorted by path.
    pub records: Vec<ImageRecord>,
    /// Images left out without an error: no annotation JSON, or one already
    /// claimed by a same-stem image.
    pub skipped: Vec<PathBuf>,
    /// Per-file errors and warnings.
    pub issues: Vec<Issue>,
    /// Image files excluded because of an error.
    pub failed: usize,
}

impl ScanReport {
    /// Total number of image files found, whatever became of them.
    pub fn images_scanned(&self) -> usize {
        self.records.len() + self.skipped.len() + self.failed
    }

    pub fn error_count(&self) -> usize {
        count_severity(&self.issues, Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        count_severity(&self.issues, Severity::Warning)
    }
}

/// Scans `source_dir` for annotated images.
///
/// # Errors
/// Returns [`LabelcropError::SourceDirUnreadable`] if the directory cannot be
/// opened. Everything else is reported through [`ScanReport::issues`].
pub fn scan_dataset(source_dir: &Path, opts: &ScanOptions) -> Result<ScanReport, LabelcropError> {
    fs::read_dir(source_dir).map_err(|source| LabelcropError::SourceDirUnreadable {
        path: source_dir.to_path_buf(),
        source,
    })?;

    let mut report = ScanReport::default();
    let images = collect_image_files(source_dir, opts.recursive, &mut report.issues);
    info!(
        "Scanning {} image file(s) in {}",
        images.len(),
        source_dir.display()
    );

    let mut claimed: BTreeSet<PathBuf> = BTreeSet::new();
    for image_path in images {
        let annotation_path = image_path.with_extension("json");
        if !annotation_path.is_file() {
            debug!("No annotation for {}, skipping", image_path.display());
            report.skipped.push(image_path);
            continue;
        }
        // `x.jpg` and `x.png` would both claim `x.json` and write the same
        // output names. The first in sorted order wins.
        if !claimed.insert(annotation_path.clone()) {
            warn!(
                "{} shares {} with another image, skipping",
                image_path.display(),
                annotation_path.display()
            );
            report.issues.push(Issue::warning(
                IssueCode::SharedAnnotation,
                &image_path,
                format!(
                    "annotation {} already belongs to another image",
                    annotation_path.display()
                ),
            ));
            report.skipped.push(image_path);
            continue;
        }

        match read_record(&image_path, &annotation_path, &mut report.issues) {
            Ok(record) => report.records.push(record),
            Err(err) => {
                warn!("Excluding {}: {}", image_path.display(), err);
                let code = IssueCode::for_read_error(&err);
                let path = match code {
                    IssueCode::ImageHeaderUnreadable => &image_path,
                    _ => &annotation_path,
                };
                report.issues.push(Issue::error(code, path, err.to_string()));
                report.failed += 1;
            }
        }
    }

    info!(
        "Scan complete: {} annotated, {} without annotation, {} failed",
        report.records.len(),
        report.skipped.len(),
        report.failed
    );
    Ok(report)
}

fn read_record(
    image_path: &Path,
    annotation_path: &Path,
    issues: &mut Vec<Issue>,
) -> Result<ImageRecord, LabelcropError> {
    let annotation = read_labelme_json(annotation_path)?;
    let (width, height) = read_image_dimensions(image_path)?;

    for note in &annotation.notes {
        let code = match note {
            ShapeNote::UnsupportedShapeType { .. } => IssueCode::UnsupportedShapeType,
            ShapeNote::TooFewPoints { .. } => IssueCode::TooFewPoints,
        };
        issues.push(Issue::warning(code, annotation_path, note.to_string()));
    }

    match (annotation.image_width, annotation.image_height) {
        (Some(w), Some(h)) if w == f64::from(width) && h == f64::from(height) => {}
        (Some(w), Some(h)) => issues.push(Issue::warning(
            IssueCode::DimensionMismatch,
            annotation_path,
            format!(
                "annotation says {}x{} but image is {}x{}; using image size",
                w, h, width, height
            ),
        )),
        _ => debug!(
            "{} has no imageWidth/imageHeight, using image header",
            annotation_path.display()
        ),
    }

    Ok(ImageRecord {
        image_path: image_path.to_path_buf(),
        annotation_path: annotation_path.to_path_buf(),
        width,
        height,
        shapes: annotation.shapes,
        meta: annotation.meta,
    })
}

fn collect_image_files(root: &Path, recursive: bool, issues: &mut Vec<Issue>) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
    {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file() && is_image_file(path) {
                    files.push(path.to_path_buf());
                }
            }
            Err(err) => {
                let path = err.path().unwrap_or(root).to_path_buf();
                issues.push(Issue::error(
                    IssueCode::EntryUnreadable,
                    &path,
                    err.to_string(),
                ));
            }
        }
    }

    files.sort_by_cached_key(|path| rel_string(root, path));
    files
}

/// Returns true if the path has one of [`IMAGE_EXTENSIONS`].
pub fn is_image_file(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), LabelcropError> {
    let size = imagesize::size(path).map_err(|source| LabelcropError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| LabelcropError::InvalidShape {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;
    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| LabelcropError::InvalidShape {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok((width, height))
}

fn rel_string(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
