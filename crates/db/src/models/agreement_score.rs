//! Agreement score entity (the cache rows). Computed, never authored.

use serde::Serialize;
use sqlx::FromRow;

use concord_core::types::{DbId, Timestamp};

/// One cached local agreement score, unique on
/// (project_id, item_id, round, task). A NULL `local_score` records an
/// undefined alpha (e.g. fewer than two raters).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgreementScore {
    pub id: DbId,
    pub project_id: DbId,
    pub item_id: DbId,
    pub round: i32,
    pub task: String,
    pub local_score: Option<f64>,
    pub raters_count: i32,
    pub calculated_at: Timestamp,
}

/// A freshly computed score, ready for a cache write.
#[derive(Debug, Clone)]
pub struct NewAgreementScore {
    pub item_id: DbId,
    pub task: String,
    pub local_score: Option<f64>,
    pub raters_count: i32,
}
