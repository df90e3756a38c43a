//! Repository for the `annotation_versions` table.
//!
//! Writes are idempotent upserts keyed on (item, annotator, round); the
//! conflict path bumps `save_count` and replaces the answer fields. No row
//! locking: callers serialize writers to the same key (one active edit
//! session per rater per item) and last write wins otherwise.

use sqlx::PgPool;

use concord_core::types::DbId;

use crate::models::annotation_version::{AnnotationVersion, UpsertAnnotationVersion};

/// Column list for annotation_versions queries.
const COLUMNS: &str = "id, item_id, annotator_id, round, promise_status, \
    verification_timeline, evidence_status, evidence_quality, status, \
    save_count, created_at, updated_at";

/// Ordering that resolves the "latest" version: highest round first, then
/// highest save counter, then most recent write.
const LATEST_ORDER: &str = "round DESC, save_count DESC, updated_at DESC";

/// Storage operations for annotation versions.
pub struct AnnotationVersionRepo;

impl AnnotationVersionRepo {
    /// Insert or update the version at (item, annotator, round).
    ///
    /// On conflict the answer fields and status are replaced and save_count
    /// increments. A second reannotation round targeting the same (item,
    /// annotator) overwrites the same row; only the audit trail keeps the
    /// full history in that case.
    pub async fn upsert(
        executor: impl sqlx::PgExecutor<'_>,
        item_id: DbId,
        annotator_id: DbId,
        round: i32,
        input: &UpsertAnnotationVersion,
    ) -> Result<AnnotationVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO annotation_versions
                (item_id, annotator_id, round, promise_status,
                 verification_timeline, evidence_status, evidence_quality, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT ON CONSTRAINT uq_annotation_versions_item_annotator_round
             DO UPDATE SET
                promise_status = EXCLUDED.promise_status,
                verification_timeline = EXCLUDED.verification_timeline,
                evidence_status = EXCLUDED.evidence_status,
                evidence_quality = EXCLUDED.evidence_quality,
                status = EXCLUDED.status,
                save_count = annotation_versions.save_count + 1,
                updated_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AnnotationVersion>(&query)
            .bind(item_id)
            .bind(annotator_id)
            .bind(round)
            .bind(&input.answers.promise_status)
            .bind(&input.answers.verification_timeline)
            .bind(&input.answers.evidence_status)
            .bind(&input.answers.evidence_quality)
            .bind(&input.status)
            .fetch_one(executor)
            .await
    }

    /// Find the version at an exact (item, annotator, round) key.
    pub async fn find(
        pool: &PgPool,
        item_id: DbId,
        annotator_id: DbId,
        round: i32,
    ) -> Result<Option<AnnotationVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation_versions
             WHERE item_id = $1 AND annotator_id = $2 AND round = $3"
        );
        sqlx::query_as::<_, AnnotationVersion>(&query)
            .bind(item_id)
            .bind(annotator_id)
            .bind(round)
            .fetch_optional(pool)
            .await
    }

    /// The latest version of one rater's judgement on one item, if any.
    pub async fn latest_for_annotator(
        executor: impl sqlx::PgExecutor<'_>,
        item_id: DbId,
        annotator_id: DbId,
    ) -> Result<Option<AnnotationVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM annotation_versions
             WHERE item_id = $1 AND annotator_id = $2
             ORDER BY {LATEST_ORDER}
             LIMIT 1"
        );
        sqlx::query_as::<_, AnnotationVersion>(&query)
            .bind(item_id)
            .bind(annotator_id)
            .fetch_optional(executor)
            .await
    }

    /// Each rater's latest version for one item.
    pub async fn latest_per_annotator(
        pool: &PgPool,
        item_id: DbId,
    ) -> Result<Vec<AnnotationVersion>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT ON (annotator_id) {COLUMNS}
             FROM annotation_versions
             WHERE item_id = $1
             ORDER BY annotator_id, {LATEST_ORDER}"
        );
        sqlx::query_as::<_, AnnotationVersion>(&query)
            .bind(item_id)
            .fetch_all(pool)
            .await
    }

    /// Completed round-0 versions for every item of a project, for
    /// initial-round agreement scoring.
    pub async fn list_round0_completed(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AnnotationVersion>, sqlx::Error> {
        let query = format!(
            "SELECT av.{} FROM annotation_versions av
             JOIN items i ON i.id = av.item_id
             WHERE i.project_id = $1 AND av.round = 0 AND av.status = 'completed'
             ORDER BY av.item_id, av.annotator_id",
            COLUMNS.replace(", ", ", av.")
        );
        sqlx::query_as::<_, AnnotationVersion>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Each rater's latest completed version per item of a project, for
    /// reannotation-round scoring (reannotated values supersede initial
    /// ones once present).
    pub async fn list_latest_completed(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AnnotationVersion>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT ON (av.item_id, av.annotator_id) av.{}
             FROM annotation_versions av
             JOIN items i ON i.id = av.item_id
             WHERE i.project_id = $1 AND av.status = 'completed'
             ORDER BY av.item_id, av.annotator_id, av.round DESC,
                      av.save_count DESC, av.updated_at DESC",
            COLUMNS.replace(", ", ", av.")
        );
        sqlx::query_as::<_, AnnotationVersion>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
