//! Annotator identity models (minimal surface of the identity collaborator).

use serde::Serialize;
use sqlx::FromRow;

use concord_core::types::{DbId, Timestamp};

/// A registered annotator. `password_hash` is a PHC-formatted Argon2id hash
/// and is never serialized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Annotator {
    pub id: DbId,
    pub username: String,
    pub role: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: Timestamp,
}
