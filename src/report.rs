//! Issue types shared by the scan, crop and preview reports.
//!
//! Per-file problems never abort a batch. They are collected as
//! [`Issue`]s so callers can display them or process them
//! programmatically.

use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, LabelcropError};

/// The severity of an issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Output was still produced, possibly with reduced fidelity.
    Warning,
    /// A file or instance was excluded from the output.
    Error,
}

/// A stable code identifying the type of issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    // Scanning
    /// A directory entry could not be read while walking the source tree.
    EntryUnreadable,
    /// The annotation JSON could not be parsed.
    MalformedAnnotation,
    /// A shape lacks required fields.
    InvalidShape,
    /// A shape type other than rectangle/polygon was dropped.
    UnsupportedShapeType,
    /// A shape has fewer points than its type needs.
    TooFewPoints,
    /// The image header could not be read.
    ImageHeaderUnreadable,
    /// `imageWidth`/`imageHeight` disagree with the image file.
    DimensionMismatch,
    /// Two images share one annotation file; only the first is used.
    SharedAnnotation,

    // Geometry
    /// A parent box has zero width or height; a 1-pixel extent was used.
    DegenerateParent,
    /// A parent box lies outside the image; the crop was snapped to the edge.
    ParentOutsideImage,
    /// A parent shape has no usable geometry and was skipped.
    InvalidParentGeometry,

    // Output
    /// An output subdirectory could not be created.
    OutputDirUnwritable,
    /// The source image could not be decoded.
    ImageDecodeFailed,
    /// A cropped image could not be written.
    ImageWriteFailed,
    /// A cropped annotation could not be written.
    AnnotationWriteFailed,
    /// A preview image could not be rendered or written.
    PreviewFailed,
}

impl IssueCode {
    /// Picks the scan code for an error raised while reading one file.
    pub fn for_read_error(err: &LabelcropError) -> Self {
        match err {
            LabelcropError::InvalidShape { .. } => IssueCode::InvalidShape,
            LabelcropError::ImageDimensionRead { .. } => IssueCode::ImageHeaderUnreadable,
            _ if err.kind() == ErrorKind::Data => IssueCode::MalformedAnnotation,
            _ => IssueCode::EntryUnreadable,
        }
    }
}

/// A single problem found while processing a dataset.
#[derive(Clone, Debug, Serialize)]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    /// The file the issue concerns, if any.
    #[serde(serialize_with = "serialize_opt_path")]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl Issue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        path: Option<&Path>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            path: path.map(Path::to_path_buf),
            message: message.into(),
        }
    }

    pub fn error(code: IssueCode, path: &Path, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, Some(path), message)
    }

    pub fn warning(code: IssueCode, path: &Path, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, Some(path), message)
    }

    /// Sort key giving reports a scheduling-independent order.
    pub(crate) fn sort_key(&self) -> (Option<&Path>, Severity, IssueCode, &str) {
        (self.path.as_deref(), self.severity, self.code, self.message.as_str())
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        match &self.path {
            Some(path) => write!(
                f,
                "[{}] {:?} in {}: {}",
                severity,
                self.code,
                path.display(),
                self.message
            ),
            None => write!(f, "[{}] {:?}: {}", severity, self.code, self.message),
        }
    }
}

/// Counts issues of the given severity.
pub fn count_severity(issues: &[Issue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

/// Sorts issues into a deterministic order.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}

fn serialize_opt_path<S: Serializer>(path: &Option<PathBuf>, s: S) -> Result<S::Ok, S::Error> {
    match path {
        Some(p) => s.serialize_some(&p.display().to_string()),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code_and_path() {
        let issue = Issue::error(
            IssueCode::MalformedAnnotation,
            Path::new("data/a.json"),
            "expected value at line 1",
        );
        assert_eq!(
            issue.to_string(),
            "[ERROR] MalformedAnnotation in data/a.json: expected value at line 1"
        );
    }

    #[test]
    fn sort_is_by_path_first() {
        let mut issues = vec![
            Issue::warning(IssueCode::TooFewPoints, Path::new("b.json"), "x"),
            Issue::error(IssueCode::InvalidShape, Path::new("a.json"), "y"),
        ];
        sort_issues(&mut issues);
        assert_eq!(issues[0].path.as_deref(), Some(Path::new("a.json")));
        assert_eq!(count_severity(&issues, Severity::Error), 1);
    }

    #[test]
    fn serializes_snake_case_codes() {
        let issue = Issue::warning(IssueCode::DimensionMismatch, Path::new("x.jpg"), "m");
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["code"], "dimension_mismatch");
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["path"], "x.jpg");
    }

    #[test]
    fn read_error_codes() {
        let err = LabelcropError::InvalidShape {
            path: PathBuf::from("a.json"),
            message: "m".into(),
        };
        assert_eq!(IssueCode::for_read_error(&err), IssueCode::InvalidShape);
        let err = LabelcropError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert_eq!(IssueCode::for_read_error(&err), IssueCode::EntryUnreadable);
    }
}
