//! Annotation answer sets, completion status, and field-level diffing.
//!
//! An answer set carries the rater's value for each of the four tasks.
//! Diffing two answer sets yields the field changes recorded in the audit
//! trail on reannotation submission.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::task::{AnnotationTask, ALL_TASKS};

// ---------------------------------------------------------------------------
// Completion status
// ---------------------------------------------------------------------------

/// Completion status of one rater's annotation version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    InProgress,
    Completed,
    Skipped,
}

impl CompletionStatus {
    /// Return the status as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    /// Parse a status from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "skipped" => Ok(Self::Skipped),
            _ => Err(CoreError::Validation(format!(
                "Invalid completion status '{s}'. Must be one of: in_progress, completed, skipped"
            ))),
        }
    }

    /// True when the version counts as a valid rating for agreement scoring.
    pub fn counts_for_agreement(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

// ---------------------------------------------------------------------------
// Answer set
// ---------------------------------------------------------------------------

/// One rater's values for the four annotation tasks. Missing values are
/// allowed (a rater may not have judged every dimension).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    pub promise_status: Option<String>,
    pub verification_timeline: Option<String>,
    pub evidence_status: Option<String>,
    pub evidence_quality: Option<String>,
}

impl AnswerSet {
    /// The value for a given task, if any.
    pub fn get(&self, task: AnnotationTask) -> Option<&str> {
        match task {
            AnnotationTask::PromiseStatus => self.promise_status.as_deref(),
            AnnotationTask::VerificationTimeline => self.verification_timeline.as_deref(),
            AnnotationTask::EvidenceStatus => self.evidence_status.as_deref(),
            AnnotationTask::EvidenceQuality => self.evidence_quality.as_deref(),
        }
    }

    /// True when no task has a value.
    pub fn is_empty(&self) -> bool {
        ALL_TASKS.iter().all(|t| self.get(*t).is_none())
    }
}

// ---------------------------------------------------------------------------
// Field-level diff
// ---------------------------------------------------------------------------

/// One monitored field whose value changed between two answer sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub task: AnnotationTask,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Diff the monitored fields of two answer sets, in canonical task order.
///
/// `previous` is the rater's prior latest answer set for the item, or `None`
/// when no prior version exists. An unchanged field produces no entry, so an
/// identical resubmission diffs to an empty list.
pub fn field_changes(previous: Option<&AnswerSet>, next: &AnswerSet) -> Vec<FieldChange> {
    let empty = AnswerSet::default();
    let previous = previous.unwrap_or(&empty);

    ALL_TASKS
        .iter()
        .filter_map(|&task| {
            let old = previous.get(task);
            let new = next.get(task);
            if old == new {
                return None;
            }
            Some(FieldChange {
                task,
                old_value: old.map(str::to_string),
                new_value: new.map(str::to_string),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(promise: &str, timeline: &str) -> AnswerSet {
        AnswerSet {
            promise_status: Some(promise.to_string()),
            verification_timeline: Some(timeline.to_string()),
            ..Default::default()
        }
    }

    // -- CompletionStatus --------------------------------------------------

    #[test]
    fn status_round_trip() {
        for status in [
            CompletionStatus::InProgress,
            CompletionStatus::Completed,
            CompletionStatus::Skipped,
        ] {
            assert_eq!(CompletionStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn status_invalid_rejected() {
        assert!(CompletionStatus::from_str("done").is_err());
    }

    #[test]
    fn only_completed_counts_for_agreement() {
        assert!(CompletionStatus::Completed.counts_for_agreement());
        assert!(!CompletionStatus::InProgress.counts_for_agreement());
        assert!(!CompletionStatus::Skipped.counts_for_agreement());
    }

    // -- field_changes -----------------------------------------------------

    #[test]
    fn identical_answer_sets_diff_to_empty() {
        let a = answers("Yes", "Within term");
        assert!(field_changes(Some(&a), &a.clone()).is_empty());
    }

    #[test]
    fn changed_field_is_reported_with_old_and_new() {
        let old = answers("Yes", "Within term");
        let new = answers("No", "Within term");
        let changes = field_changes(Some(&old), &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].task, AnnotationTask::PromiseStatus);
        assert_eq!(changes[0].old_value.as_deref(), Some("Yes"));
        assert_eq!(changes[0].new_value.as_deref(), Some("No"));
    }

    #[test]
    fn no_previous_version_reports_all_set_fields() {
        let new = answers("Yes", "After term");
        let changes = field_changes(None, &new);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.old_value.is_none()));
    }

    #[test]
    fn cleared_field_is_reported() {
        let old = answers("Yes", "Within term");
        let mut new = old.clone();
        new.verification_timeline = None;
        let changes = field_changes(Some(&old), &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].task, AnnotationTask::VerificationTimeline);
        assert!(changes[0].new_value.is_none());
    }

    #[test]
    fn changes_come_out_in_canonical_task_order() {
        let old = AnswerSet::default();
        let new = AnswerSet {
            promise_status: Some("Yes".into()),
            verification_timeline: Some("Within term".into()),
            evidence_status: Some("Found".into()),
            evidence_quality: Some("Strong".into()),
        };
        let changes = field_changes(Some(&old), &new);
        let tasks: Vec<AnnotationTask> = changes.iter().map(|c| c.task).collect();
        assert_eq!(tasks, ALL_TASKS.to_vec());
    }

    #[test]
    fn answer_set_get_maps_each_task() {
        let set = AnswerSet {
            promise_status: Some("Yes".into()),
            verification_timeline: None,
            evidence_status: Some("Found".into()),
            evidence_quality: None,
        };
        assert_eq!(set.get(AnnotationTask::PromiseStatus), Some("Yes"));
        assert_eq!(set.get(AnnotationTask::VerificationTimeline), None);
        assert_eq!(set.get(AnnotationTask::EvidenceStatus), Some("Found"));
        assert_eq!(set.get(AnnotationTask::EvidenceQuality), None);
        assert!(!set.is_empty());
        assert!(AnswerSet::default().is_empty());
    }
}
