//! Repository for the `annotators` table.

use sqlx::PgPool;

use concord_core::types::DbId;

use crate::models::annotator::Annotator;

/// Column list for annotators queries.
const COLUMNS: &str = "id, username, role, password_hash, created_at";

/// Read operations for annotator identities.
pub struct AnnotatorRepo;

impl AnnotatorRepo {
    /// Find an annotator by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Annotator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotators WHERE id = $1");
        sqlx::query_as::<_, Annotator>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an annotator by username (login lookup).
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Annotator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM annotators WHERE username = $1");
        sqlx::query_as::<_, Annotator>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }
}
