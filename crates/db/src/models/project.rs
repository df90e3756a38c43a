//! Project/item catalog models. Owned by an external catalog collaborator;
//! this service only reads them.

use serde::Serialize;
use sqlx::FromRow;

use concord_core::types::{DbId, Timestamp};

/// A project grouping items under one display label.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub name: String,
    pub created_at: Timestamp,
}

/// One unit of source text to be judged. Immutable once created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Item {
    pub id: DbId,
    pub project_id: DbId,
    pub page_number: i32,
    pub content: String,
    pub created_at: Timestamp,
}

/// Per-item count of qualified round-0 raters, used by the eligibility
/// scanner.
#[derive(Debug, Clone, FromRow)]
pub struct ItemRaterCount {
    pub item_id: DbId,
    pub qualified_raters: i64,
}
