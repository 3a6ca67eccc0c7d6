//! Summary of a crop-and-remap batch.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

use crate::report::{count_severity, Issue, Severity};

/// The aggregate result of [`crop_and_remap`](super::crop_and_remap).
///
/// Every list is sorted, so two runs over the same input produce identical
/// reports regardless of how work was scheduled.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CropReport {
    pub parent_label: String,
    /// Image files found in the source directory.
    pub images_scanned: usize,
    /// Images containing at least one parent-labeled shape.
    pub images_with_parent: usize,
    /// Parent-labeled shapes seen across the dataset.
    pub instances_found: usize,
    /// Instances that passed the required-child filter.
    pub instances_accepted: usize,
    /// Instances that failed the filter or had unusable geometry.
    pub instances_rejected: usize,
    /// Accepted instances whose image and annotation were both written.
    pub instances_processed: usize,
    /// Image and JSON files written.
    pub files_written: usize,
    /// Shapes written across all output annotations.
    pub shapes_written: usize,
    /// Shapes clipped away entirely by their crop.
    pub shapes_dropped: usize,
    /// Images left out without an error (see [`ScanReport::skipped`](crate::scan::ScanReport::skipped)).
    #[serde(serialize_with = "serialize_paths")]
    pub skipped: Vec<PathBuf>,
    /// Files written, image and JSON alike.
    #[serde(serialize_with = "serialize_paths")]
    pub outputs: Vec<PathBuf>,
    pub issues: Vec<Issue>,
}

impl CropReport {
    pub fn error_count(&self) -> usize {
        count_severity(&self.issues, Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        count_severity(&self.issues, Severity::Warning)
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        format!(
            "Processed {} image(s): {} '{}' instance(s) found, {} accepted, {} written ({} files)",
            self.images_scanned,
            self.instances_found,
            self.parent_label,
            self.instances_accepted,
            self.instances_processed,
            self.files_written
        )
    }
}

impl fmt::Display for CropReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        writeln!(
            f,
            "  {} shape(s) written, {} dropped by cropping, {} instance(s) rejected",
            self.shapes_written, self.shapes_dropped, self.instances_rejected
        )?;
        if !self.skipped.is_empty() {
            writeln!(
                f,
                "  {} image(s) skipped (no usable annotation file)",
                self.skipped.len()
            )?;
        }

        for (severity, title) in [(Severity::Error, "Errors"), (Severity::Warning, "Warnings")] {
            let count = count_severity(&self.issues, severity);
            if count == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, count)?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue)?;
            }
        }

        Ok(())
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_paths<S: Serializer>(paths: &Vec<PathBuf>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(paths.iter().map(|p| p.display().to_string()))
}
