//! Reannotation round and task entities plus their creation DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use concord_core::types::{DbId, Timestamp};

/// A batch of reannotation work over one task group of a project.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReannotationRound {
    pub id: DbId,
    pub project_id: DbId,
    /// Project-wide round number (>= 1; 0 is the initial pass).
    pub round_number: i32,
    /// Task group string; see `concord_core::task::TaskGroup`.
    pub task_group: String,
    pub threshold: f64,
    /// Round status string; see `concord_core::round::RoundStatus`.
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One rater's assignment within a round.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReannotationTask {
    pub id: DbId,
    pub round_id: DbId,
    pub item_id: DbId,
    pub annotator_id: DbId,
    /// Frozen task -> score map captured at round creation (JSON object;
    /// null score = undefined alpha). Immutable context for the rater.
    pub flagged_tasks: serde_json::Value,
    /// Task status string; see `concord_core::round::ReannotationTaskStatus`.
    pub status: String,
    pub keep_original: bool,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A completed round joined with its count of distinct submitting raters,
/// used by the eligibility scanner.
#[derive(Debug, Clone, FromRow)]
pub struct RoundWithSubmitters {
    pub id: DbId,
    pub project_id: DbId,
    pub round_number: i32,
    pub task_group: String,
    pub status: String,
    pub submitted_raters: i64,
}

/// Request body for creating a reannotation round.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReannotationRound {
    pub project_id: DbId,
    /// `"promise"` or `"evidence"`.
    pub task_group: String,
    pub threshold: f64,
}

/// One assignment to insert while creating a round.
#[derive(Debug, Clone)]
pub struct NewReannotationTask {
    pub item_id: DbId,
    pub annotator_id: DbId,
    pub flagged_tasks: serde_json::Value,
}
