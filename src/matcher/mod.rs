//! Parent–child matching.
//!
//! Every shape carrying the parent label becomes a candidate instance. Every
//! shape with a different label whose bounding box overlaps the candidate's
//! box is associated with it (partial overlap is enough: equipment often
//! sticks out of a body box). A candidate is accepted when no child labels
//! are required, or when at least one associated child has a required label.

use std::collections::BTreeSet;
use std::fmt;

use crate::ir::{ImageRecord, ParentInstance, Shape, Source};

/// Which associated children an accepted instance keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChildRetention {
    /// Keep every overlapping child, whatever its label. The required labels
    /// only decide whether the instance is accepted.
    #[default]
    AllOverlapping,
    /// Keep only overlapping children whose label is required. Behaves like
    /// `AllOverlapping` when no labels are required.
    RequiredOnly,
}

/// Matching options.
#[derive(Clone, Debug, Default)]
pub struct MatchOptions {
    pub parent_label: String,
    /// Any one of these labels admits an instance. Empty admits everything.
    pub required_child_labels: BTreeSet<String>,
    pub child_retention: ChildRetention,
}

impl MatchOptions {
    pub fn new(parent_label: impl Into<String>) -> Self {
        Self {
            parent_label: parent_label.into(),
            ..Default::default()
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

    pub fn with_retention(mut self, retention: ChildRetention) -> Self {
        self.child_retention = retention;
        self
    }

    fn is_required(&self, label: &str) -> bool {
        self.required_child_labels.contains(label)
    }
}

/// Why a parent candidate was not accepted.
#[derive(Clone, Debug, PartialEq)]
pub enum RejectReason {
    /// The parent shape has no points.
    NoPoints,
    /// The parent shape has NaN or infinite coordinates.
    NonFinite,
    /// None of the overlapping children carry a required label.
    MissingRequiredChild,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoPoints => write!(f, "parent shape has no points"),
            RejectReason::NonFinite => write!(f, "parent shape has non-finite coordinates"),
            RejectReason::MissingRequiredChild => {
                write!(f, "no overlapping child carries a required label")
            }
        }
    }
}

/// A parent candidate that produced no output.
#[derive(Clone, Debug)]
pub struct RejectedParent {
    pub ordinal: usize,
    pub reason: RejectReason,
}

/// The result of matching one image.
#[derive(Clone, Debug, Default)]
pub struct MatchOutcome {
    pub accepted: Vec<ParentInstance>,
    pub rejected: Vec<RejectedParent>,
}

impl MatchOutcome {
    /// Number of parent-labeled shapes seen in the image.
    pub fn instances_found(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }
}

/// Finds and filters parent instances in one image.
pub fn match_parents(record: &ImageRecord, opts: &MatchOptions) -> MatchOutcome {
    match_shapes(&record.shapes, opts)
}

/// Same as [`match_parents`], on a bare shape list.
pub fn match_shapes(shapes: &[Shape<Source>], opts: &MatchOptions) -> MatchOutcome {
    let (parents, others): (Vec<&Shape<Source>>, Vec<&Shape<Source>>) = shapes
        .iter()
        .partition(|shape| shape.label == opts.parent_label);

    // Child boxes once per image.
    let others: Vec<_> = others
        .into_iter()
        .filter_map(|shape| {
            let bbox = shape.bbox()?;
            bbox.is_finite().then_some((shape, bbox))
        })
        .collect();

    let mut outcome = MatchOutcome::default();

    for (ordinal, parent) in parents.into_iter().enumerate() {
        let bbox = match parent.bbox() {
            None => {
                outcome.rejected.push(RejectedParent {
                    ordinal,
                    reason: RejectReason::NoPoints,
                });
                continue;
            }
            Some(bbox) if !bbox.is_finite() => {
                outcome.rejected.push(RejectedParent {
                    ordinal,
                    reason: RejectReason::NonFinite,
                });
                continue;
            }
            Some(bbox) => bbox,
        };

        let overlapping: Vec<&Shape<Source>> = others
            .iter()
            .filter(|(_, child_box)| child_box.overlaps(&bbox))
            .map(|(shape, _)| *shape)
            .collect();

        let accepted = opts.required_child_labels.is_empty()
            || overlapping.iter().any(|child| opts.is_required(&child.label));
        if !accepted {
            outcome.rejected.push(RejectedParent {
                ordinal,
                reason: RejectReason::MissingRequiredChild,
            });
            continue;
        }

        let children = overlapping
            .into_iter()
            .filter(|child| match opts.child_retention {
                ChildRetention::AllOverlapping => true,
                ChildRetention::RequiredOnly => {
                    opts.required_child_labels.is_empty() || opts.is_required(&child.label)
                }
            })
            .cloned()
            .collect();

        outcome.accepted.push(ParentInstance {
            ordinal,
            parent: parent.clone(),
            bbox,
            children,
        });
    }

    outcome
}
