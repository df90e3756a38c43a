//! The fixed annotation task taxonomy.
//!
//! Every item is judged along the same four categorical dimensions. For
//! reannotation the four tasks are partitioned into two disjoint groups so
//! a round can target the promise-related or the evidence-related half
//! without re-opening the other.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One of the four annotated dimensions. Ordering follows the canonical
/// task order, so sorted containers iterate tasks the way reports list them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationTask {
    PromiseStatus,
    VerificationTimeline,
    EvidenceStatus,
    EvidenceQuality,
}

/// All four tasks in canonical order.
pub const ALL_TASKS: [AnnotationTask; 4] = [
    AnnotationTask::PromiseStatus,
    AnnotationTask::VerificationTimeline,
    AnnotationTask::EvidenceStatus,
    AnnotationTask::EvidenceQuality,
];

/// All valid task name strings.
const VALID_TASK_STRINGS: &[&str] = &[
    "promise_status",
    "verification_timeline",
    "evidence_status",
    "evidence_quality",
];

impl AnnotationTask {
    /// Return the task name as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PromiseStatus => "promise_status",
            Self::VerificationTimeline => "verification_timeline",
            Self::EvidenceStatus => "evidence_status",
            Self::EvidenceQuality => "evidence_quality",
        }
    }

    /// Parse a task name from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "promise_status" => Ok(Self::PromiseStatus),
            "verification_timeline" => Ok(Self::VerificationTimeline),
            "evidence_status" => Ok(Self::EvidenceStatus),
            "evidence_quality" => Ok(Self::EvidenceQuality),
            _ => Err(CoreError::Validation(format!(
                "Invalid annotation task '{s}'. Must be one of: {}",
                VALID_TASK_STRINGS.join(", ")
            ))),
        }
    }
}

/// One of the two fixed task partitions a reannotation round may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskGroup {
    /// {promise_status, verification_timeline}
    Promise,
    /// {evidence_status, evidence_quality}
    Evidence,
}

impl TaskGroup {
    /// Return the group name as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Promise => "promise",
            Self::Evidence => "evidence",
        }
    }

    /// Parse a group name from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "promise" => Ok(Self::Promise),
            "evidence" => Ok(Self::Evidence),
            _ => Err(CoreError::Validation(format!(
                "Invalid task group '{s}'. Must be one of: promise, evidence"
            ))),
        }
    }

    /// The tasks belonging to this group, in canonical order.
    pub fn members(&self) -> &'static [AnnotationTask] {
        match self {
            Self::Promise => &[
                AnnotationTask::PromiseStatus,
                AnnotationTask::VerificationTimeline,
            ],
            Self::Evidence => &[
                AnnotationTask::EvidenceStatus,
                AnnotationTask::EvidenceQuality,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_names_round_trip() {
        for task in ALL_TASKS {
            assert_eq!(AnnotationTask::from_str(task.as_str()).unwrap(), task);
        }
    }

    #[test]
    fn task_invalid_name_rejected() {
        let err = AnnotationTask::from_str("promise").unwrap_err();
        assert!(err.to_string().contains("Invalid annotation task"));
    }

    #[test]
    fn group_names_round_trip() {
        assert_eq!(TaskGroup::from_str("promise").unwrap(), TaskGroup::Promise);
        assert_eq!(TaskGroup::from_str("evidence").unwrap(), TaskGroup::Evidence);
    }

    #[test]
    fn group_invalid_name_rejected() {
        assert!(TaskGroup::from_str("both").is_err());
        assert!(TaskGroup::from_str("").is_err());
    }

    #[test]
    fn groups_partition_the_four_tasks() {
        let mut all: Vec<AnnotationTask> = TaskGroup::Promise.members().to_vec();
        all.extend_from_slice(TaskGroup::Evidence.members());
        assert_eq!(all.len(), 4);
        for task in ALL_TASKS {
            assert!(all.contains(&task));
        }
    }
}
