//! Preview report types.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::ir::{Shape, Source};
use crate::report::{count_severity, Issue, Severity};

/// One rendered preview.
#[derive(Clone, Debug, Serialize)]
pub struct PreviewEntry {
    /// Position in the sample (0-based); also used in the output file name.
    pub id: usize,
    #[serde(serialize_with = "serialize_path")]
    pub source_path: PathBuf,
    /// The rendered PNG.
    #[serde(serialize_with = "serialize_path")]
    pub path: PathBuf,
    pub annotations: Vec<Shape<Source>>,
}

/// Result of [`generate_annotated_previews`](super::generate_annotated_previews).
#[derive(Clone, Debug, Default, Serialize)]
pub struct PreviewReport {
    pub preview_count: usize,
    pub previews: Vec<PreviewEntry>,
    pub issues: Vec<Issue>,
}

impl PreviewReport {
    pub fn error_count(&self) -> usize {
        count_severity(&self.issues, Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        count_severity(&self.issues, Severity::Warning)
    }
}

impl fmt::Display for PreviewReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rendered {} preview(s)", self.preview_count)?;
        for entry in &self.previews {
            writeln!(
                f,
                "  [{}] {} ({} shape(s)) -> {}",
                entry.id,
                entry.source_path.display(),
                entry.annotations.len(),
                entry.path.display()
            )?;
        }
        if !self.issues.is_empty() {
            writeln!(f)?;
            writeln!(f, "Issues ({}):", self.issues.len())?;
            for issue in &self.issues {
                writeln!(f, "  {}", issue)?;
            }
        }
        Ok(())
    }
}

fn serialize_path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}
