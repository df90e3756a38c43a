//! Audit trail entity models and DTOs.
//!
//! Audit entries record field-level value changes made on reannotation
//! submission. They are append-only: no `updated_at`, no update or delete
//! path anywhere in the codebase.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use concord_core::types::{DbId, Timestamp};

/// One field-level change. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub item_id: DbId,
    pub annotator_id: DbId,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub round: i32,
    pub reason: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for appending a new audit entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub item_id: DbId,
    pub annotator_id: DbId,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub round: i32,
    pub reason: Option<String>,
}
