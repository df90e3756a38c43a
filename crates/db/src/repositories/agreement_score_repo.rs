//! Repository for the `agreement_scores` table (the agreement cache).
//!
//! Cache semantics are presence-based: a (project, round) key either has a
//! full result set or nothing. There is no content-hash or watermark
//! invalidation; callers pass force=true to recompute.

use sqlx::PgPool;

use concord_core::types::DbId;

use crate::models::agreement_score::{AgreementScore, NewAgreementScore};

/// Column list for agreement_scores queries.
const COLUMNS: &str =
    "id, project_id, item_id, round, task, local_score, raters_count, calculated_at";

/// Cache operations for computed agreement scores.
pub struct AgreementScoreRepo;

impl AgreementScoreRepo {
    /// Cheap existence check for a (project, round) key.
    pub async fn has_cache(
        pool: &PgPool,
        project_id: DbId,
        round: i32,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                SELECT 1 FROM agreement_scores WHERE project_id = $1 AND round = $2
             )",
        )
        .bind(project_id)
        .bind(round)
        .fetch_one(pool)
        .await
    }

    /// Read all cached scores for a (project, round) key, in stable
    /// (item, task) order.
    pub async fn read(
        pool: &PgPool,
        project_id: DbId,
        round: i32,
    ) -> Result<Vec<AgreementScore>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM agreement_scores
             WHERE project_id = $1 AND round = $2
             ORDER BY item_id ASC, task ASC"
        );
        sqlx::query_as::<_, AgreementScore>(&query)
            .bind(project_id)
            .bind(round)
            .fetch_all(pool)
            .await
    }

    /// Replace all cached scores for a (project, round) key: delete the
    /// existing rows, then insert the new set row by row.
    ///
    /// Deliberately not wrapped in one transaction: a failure partway
    /// through leaves a partial result set for the key, which the next
    /// force=true run repairs. Callers must not run two rewrites of the
    /// same key concurrently.
    pub async fn replace_all(
        pool: &PgPool,
        project_id: DbId,
        round: i32,
        scores: &[NewAgreementScore],
    ) -> Result<usize, sqlx::Error> {
        sqlx::query("DELETE FROM agreement_scores WHERE project_id = $1 AND round = $2")
            .bind(project_id)
            .bind(round)
            .execute(pool)
            .await?;

        for score in scores {
            sqlx::query(
                "INSERT INTO agreement_scores
                    (project_id, item_id, round, task, local_score, raters_count)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(project_id)
            .bind(score.item_id)
            .bind(round)
            .bind(&score.task)
            .bind(score.local_score)
            .bind(score.raters_count)
            .execute(pool)
            .await?;
        }

        Ok(scores.len())
    }

    /// Latest cached score per (item, task) across all rounds of a project.
    ///
    /// Round-creation reads these to decide which items to flag: a later
    /// round's score supersedes the initial one for the same item and task.
    pub async fn latest_scores_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AgreementScore>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT ON (item_id, task) {COLUMNS} FROM agreement_scores
             WHERE project_id = $1
             ORDER BY item_id ASC, task ASC, round DESC"
        );
        sqlx::query_as::<_, AgreementScore>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Read one item's cached scores for a (project, round) key.
    pub async fn read_for_item(
        pool: &PgPool,
        project_id: DbId,
        round: i32,
        item_id: DbId,
    ) -> Result<Vec<AgreementScore>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM agreement_scores
             WHERE project_id = $1 AND round = $2 AND item_id = $3
             ORDER BY task ASC"
        );
        sqlx::query_as::<_, AgreementScore>(&query)
            .bind(project_id)
            .bind(round)
            .bind(item_id)
            .fetch_all(pool)
            .await
    }
}
