//! Repository for the `audit_logs` table.
//!
//! Append-only: this repo exposes inserts and reads, nothing else.

use sqlx::PgPool;

use concord_core::types::DbId;

use crate::models::audit::{AuditLog, CreateAuditLog};

/// Column list for `audit_logs` SELECT queries.
const COLUMNS: &str =
    "id, item_id, annotator_id, field, old_value, new_value, round, reason, created_at";

/// Column list for INSERT (excludes auto-generated `id`, `created_at`).
const INSERT_COLUMNS: &str =
    "item_id, annotator_id, field, old_value, new_value, round, reason";

/// Number of bind parameters per inserted row.
const INSERT_PARAMS: u32 = 7;

/// Append and query operations for the audit trail.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Batch insert multiple audit log entries.
    ///
    /// Uses a single INSERT with multiple value rows so a submission's
    /// changes land together.
    pub async fn batch_insert(
        executor: impl sqlx::PgExecutor<'_>,
        entries: &[CreateAuditLog],
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!("INSERT INTO audit_logs ({INSERT_COLUMNS}) VALUES ");
        let mut param_idx = 1u32;
        let mut first = true;

        for _ in entries {
            if !first {
                query.push_str(", ");
            }
            first = false;
            query.push('(');
            for i in 0..INSERT_PARAMS {
                if i > 0 {
                    query.push_str(", ");
                }
                query.push_str(&format!("${param_idx}"));
                param_idx += 1;
            }
            query.push(')');
        }

        query.push_str(&format!(" RETURNING {COLUMNS}"));

        let mut q = sqlx::query_as::<_, AuditLog>(&query);
        for entry in entries {
            q = q
                .bind(entry.item_id)
                .bind(entry.annotator_id)
                .bind(&entry.field)
                .bind(&entry.old_value)
                .bind(&entry.new_value)
                .bind(entry.round)
                .bind(&entry.reason);
        }

        q.fetch_all(executor).await
    }

    /// List all entries for one item, oldest first.
    pub async fn list_by_item(pool: &PgPool, item_id: DbId) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE item_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(item_id)
            .fetch_all(pool)
            .await
    }

    /// List all entries for one (item, annotator) pair, oldest first.
    pub async fn list_by_item_annotator(
        pool: &PgPool,
        item_id: DbId,
        annotator_id: DbId,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE item_id = $1 AND annotator_id = $2
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(item_id)
            .bind(annotator_id)
            .fetch_all(pool)
            .await
    }
}
