//! Reannotation round and task state machines, threshold validation, and
//! the low-agreement flagging rule.
//!
//! Round numbering is a single project-wide counter: round 0 is reserved
//! for initial annotation and every new reannotation round takes the next
//! number regardless of which task group it targets. The current round is
//! never ambient state; callers thread the round number explicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::task::{AnnotationTask, TaskGroup};

/// The round number reserved for initial annotation.
pub const INITIAL_ROUND: i32 = 0;

// ---------------------------------------------------------------------------
// Round status
// ---------------------------------------------------------------------------

/// Lifecycle status of a reannotation round.
///
/// `Completed` and `Cancelled` are terminal; there is no path back to
/// `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Active,
    Completed,
    Cancelled,
}

impl RoundStatus {
    /// Return the status as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parse a status from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(CoreError::Validation(format!(
                "Invalid round status '{s}'. Must be one of: active, completed, cancelled"
            ))),
        }
    }

    /// Validate a transition to `next`, returning `next` on success.
    pub fn transition(self, next: RoundStatus) -> Result<RoundStatus, CoreError> {
        match (self, next) {
            (Self::Active, Self::Completed) | (Self::Active, Self::Cancelled) => Ok(next),
            _ => Err(CoreError::Conflict(format!(
                "Invalid round transition: {} -> {}",
                self.as_str(),
                next.as_str()
            ))),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

/// Lifecycle status of one rater's assignment within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReannotationTaskStatus {
    Pending,
    InProgress,
    Submitted,
    Skipped,
}

impl ReannotationTaskStatus {
    /// Return the status as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::Skipped => "skipped",
        }
    }

    /// Parse a status from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "skipped" => Ok(Self::Skipped),
            _ => Err(CoreError::Validation(format!(
                "Invalid reannotation task status '{s}'. \
                 Must be one of: pending, in_progress, submitted, skipped"
            ))),
        }
    }

    /// True while the task still needs rater action.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }

    /// Validate a transition to `next`, returning `next` on success.
    ///
    /// Submitted and skipped are terminal.
    pub fn transition(
        self,
        next: ReannotationTaskStatus,
    ) -> Result<ReannotationTaskStatus, CoreError> {
        let allowed = match (self, next) {
            (Self::Pending, Self::InProgress)
            | (Self::Pending, Self::Submitted)
            | (Self::Pending, Self::Skipped)
            | (Self::InProgress, Self::Submitted)
            | (Self::InProgress, Self::Skipped) => true,
            _ => false,
        };
        if !allowed {
            return Err(CoreError::Conflict(format!(
                "Invalid reannotation task transition: {} -> {}",
                self.as_str(),
                next.as_str()
            )));
        }
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Threshold validation
// ---------------------------------------------------------------------------

/// Validate an agreement threshold: finite, greater than 0, at most 1.
pub fn validate_threshold(threshold: f64) -> Result<(), CoreError> {
    if threshold.is_nan() || threshold.is_infinite() {
        return Err(CoreError::Validation(
            "Agreement threshold must be a finite number".to_string(),
        ));
    }
    if threshold <= 0.0 || threshold > 1.0 {
        return Err(CoreError::Validation(format!(
            "Agreement threshold must be within (0, 1], got {threshold}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Flagging rule
// ---------------------------------------------------------------------------

/// An item's cached local scores for the tasks of interest.
///
/// A missing key means no score row exists for that task; `None` means the
/// row exists but the score is undefined. Both flag the task.
pub type TaskScores = BTreeMap<AnnotationTask, Option<f64>>;

/// Decide which tasks of `group` flag an item for reannotation.
///
/// A task flags when its local score is strictly below `threshold`, is
/// undefined, or has no score at all. Returns the flagged task -> score
/// pairs in canonical task order; an empty result means the item is not
/// flagged.
pub fn flagged_tasks(
    group: TaskGroup,
    scores: &TaskScores,
    threshold: f64,
) -> Vec<(AnnotationTask, Option<f64>)> {
    group
        .members()
        .iter()
        .filter_map(|&task| match scores.get(&task) {
            Some(Some(score)) if *score >= threshold => None,
            Some(Some(score)) => Some((task, Some(*score))),
            Some(None) | None => Some((task, None)),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- RoundStatus -------------------------------------------------------

    #[test]
    fn round_status_round_trip() {
        for status in [
            RoundStatus::Active,
            RoundStatus::Completed,
            RoundStatus::Cancelled,
        ] {
            assert_eq!(RoundStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn active_round_can_complete_or_cancel() {
        assert!(RoundStatus::Active.transition(RoundStatus::Completed).is_ok());
        assert!(RoundStatus::Active.transition(RoundStatus::Cancelled).is_ok());
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        for terminal in [RoundStatus::Completed, RoundStatus::Cancelled] {
            assert!(terminal.is_terminal());
            assert!(terminal.transition(RoundStatus::Active).is_err());
            assert!(terminal.transition(RoundStatus::Completed).is_err());
            assert!(terminal.transition(RoundStatus::Cancelled).is_err());
        }
    }

    // -- ReannotationTaskStatus --------------------------------------------

    #[test]
    fn task_status_round_trip() {
        for status in [
            ReannotationTaskStatus::Pending,
            ReannotationTaskStatus::InProgress,
            ReannotationTaskStatus::Submitted,
            ReannotationTaskStatus::Skipped,
        ] {
            assert_eq!(
                ReannotationTaskStatus::from_str(status.as_str()).unwrap(),
                status
            );
        }
    }

    #[test]
    fn open_task_can_submit_or_skip() {
        for open in [
            ReannotationTaskStatus::Pending,
            ReannotationTaskStatus::InProgress,
        ] {
            assert!(open.is_open());
            assert!(open.transition(ReannotationTaskStatus::Submitted).is_ok());
            assert!(open.transition(ReannotationTaskStatus::Skipped).is_ok());
        }
    }

    #[test]
    fn submitted_and_skipped_are_terminal() {
        for terminal in [
            ReannotationTaskStatus::Submitted,
            ReannotationTaskStatus::Skipped,
        ] {
            assert!(!terminal.is_open());
            assert!(terminal.transition(ReannotationTaskStatus::Pending).is_err());
            assert!(terminal
                .transition(ReannotationTaskStatus::Submitted)
                .is_err());
        }
    }

    // -- validate_threshold ------------------------------------------------

    #[test]
    fn threshold_in_range_accepted() {
        assert!(validate_threshold(0.5).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(0.001).is_ok());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        assert!(validate_threshold(0.0).is_err());
        assert!(validate_threshold(-0.5).is_err());
        assert!(validate_threshold(1.5).is_err());
        assert!(validate_threshold(f64::NAN).is_err());
        assert!(validate_threshold(f64::INFINITY).is_err());
    }

    // -- flagged_tasks -----------------------------------------------------

    fn scores(entries: &[(AnnotationTask, Option<f64>)]) -> TaskScores {
        entries.iter().cloned().collect()
    }

    #[test]
    fn score_below_threshold_flags_the_task() {
        let s = scores(&[
            (AnnotationTask::PromiseStatus, Some(0.3)),
            (AnnotationTask::VerificationTimeline, Some(0.9)),
        ]);
        let flagged = flagged_tasks(TaskGroup::Promise, &s, 0.5);
        assert_eq!(flagged, vec![(AnnotationTask::PromiseStatus, Some(0.3))]);
    }

    #[test]
    fn all_scores_at_or_above_threshold_flags_nothing() {
        let s = scores(&[
            (AnnotationTask::PromiseStatus, Some(0.5)),
            (AnnotationTask::VerificationTimeline, Some(1.0)),
        ]);
        assert!(flagged_tasks(TaskGroup::Promise, &s, 0.5).is_empty());
    }

    #[test]
    fn undefined_score_flags_the_task() {
        let s = scores(&[
            (AnnotationTask::EvidenceStatus, None),
            (AnnotationTask::EvidenceQuality, Some(0.8)),
        ]);
        let flagged = flagged_tasks(TaskGroup::Evidence, &s, 0.5);
        assert_eq!(flagged, vec![(AnnotationTask::EvidenceStatus, None)]);
    }

    #[test]
    fn missing_score_row_flags_the_task() {
        let s = scores(&[(AnnotationTask::EvidenceQuality, Some(0.8))]);
        let flagged = flagged_tasks(TaskGroup::Evidence, &s, 0.5);
        assert_eq!(flagged, vec![(AnnotationTask::EvidenceStatus, None)]);
    }

    #[test]
    fn flagging_only_considers_the_selected_group() {
        // Low promise score must not flag an evidence-group round.
        let s = scores(&[
            (AnnotationTask::PromiseStatus, Some(0.1)),
            (AnnotationTask::EvidenceStatus, Some(0.9)),
            (AnnotationTask::EvidenceQuality, Some(0.9)),
        ]);
        assert!(flagged_tasks(TaskGroup::Evidence, &s, 0.5).is_empty());
    }
}
