//! Annotation version entity and upsert DTO.
//!
//! At most one row exists per (item, annotator, round); writes are upserts
//! that bump `save_count`. The latest judgement for an (item, annotator)
//! resolves by highest round, then save_count, then updated_at.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use concord_core::annotation::AnswerSet;
use concord_core::task::AnnotationTask;
use concord_core::types::{DbId, Timestamp};

/// One rater's judgement on one item for one round.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AnnotationVersion {
    pub id: DbId,
    pub item_id: DbId,
    pub annotator_id: DbId,
    pub round: i32,
    pub promise_status: Option<String>,
    pub verification_timeline: Option<String>,
    pub evidence_status: Option<String>,
    pub evidence_quality: Option<String>,
    /// Completion status string; see `concord_core::annotation::CompletionStatus`.
    pub status: String,
    pub save_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AnnotationVersion {
    /// The version's value for one task, borrowed from the row.
    pub fn task_value(&self, task: AnnotationTask) -> Option<&str> {
        match task {
            AnnotationTask::PromiseStatus => self.promise_status.as_deref(),
            AnnotationTask::VerificationTimeline => self.verification_timeline.as_deref(),
            AnnotationTask::EvidenceStatus => self.evidence_status.as_deref(),
            AnnotationTask::EvidenceQuality => self.evidence_quality.as_deref(),
        }
    }

    /// The version's four task values as a core answer set.
    pub fn answer_set(&self) -> AnswerSet {
        AnswerSet {
            promise_status: self.promise_status.clone(),
            verification_timeline: self.verification_timeline.clone(),
            evidence_status: self.evidence_status.clone(),
            evidence_quality: self.evidence_quality.clone(),
        }
    }
}

/// DTO for upserting a version at a given (item, annotator, round) key.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertAnnotationVersion {
    #[serde(flatten)]
    pub answers: AnswerSet,
    /// Completion status string, validated at the API boundary.
    pub status: String,
}
