//! Repository for the `reannotation_rounds` and `reannotation_tasks` tables.

use sqlx::PgPool;

use concord_core::types::DbId;

use crate::models::reannotation::{
    NewReannotationTask, ReannotationRound, ReannotationTask, RoundWithSubmitters,
};

/// Column list for reannotation_rounds queries.
const ROUND_COLUMNS: &str =
    "id, project_id, round_number, task_group, threshold, status, created_at, updated_at";

/// Column list for reannotation_tasks queries.
const TASK_COLUMNS: &str = "id, round_id, item_id, annotator_id, flagged_tasks, \
    status, keep_original, comment, created_at, updated_at";

/// Storage operations for reannotation rounds and their task assignments.
pub struct ReannotationRepo;

impl ReannotationRepo {
    /// Create a round with its task assignments in one transaction.
    ///
    /// The round number is the project-wide next value
    /// (MAX(round_number) + 1, starting at 1), independent of which task
    /// group the round targets.
    pub async fn create_round_with_tasks(
        pool: &PgPool,
        project_id: DbId,
        task_group: &str,
        threshold: f64,
        tasks: &[NewReannotationTask],
    ) -> Result<ReannotationRound, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let next_number: (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(round_number), 0) + 1
             FROM reannotation_rounds WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO reannotation_rounds
                (project_id, round_number, task_group, threshold)
             VALUES ($1, $2, $3, $4)
             RETURNING {ROUND_COLUMNS}"
        );
        let round = sqlx::query_as::<_, ReannotationRound>(&query)
            .bind(project_id)
            .bind(next_number.0)
            .bind(task_group)
            .bind(threshold)
            .fetch_one(&mut *tx)
            .await?;

        for task in tasks {
            sqlx::query(
                "INSERT INTO reannotation_tasks
                    (round_id, item_id, annotator_id, flagged_tasks)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(round.id)
            .bind(task.item_id)
            .bind(task.annotator_id)
            .bind(&task.flagged_tasks)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(round)
    }

    /// Find a round by its ID.
    pub async fn find_round(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReannotationRound>, sqlx::Error> {
        let query = format!("SELECT {ROUND_COLUMNS} FROM reannotation_rounds WHERE id = $1");
        sqlx::query_as::<_, ReannotationRound>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List rounds, optionally scoped to one project, newest first.
    pub async fn list_rounds(
        pool: &PgPool,
        project_id: Option<DbId>,
    ) -> Result<Vec<ReannotationRound>, sqlx::Error> {
        let rounds = match project_id {
            Some(pid) => {
                let query = format!(
                    "SELECT {ROUND_COLUMNS} FROM reannotation_rounds
                     WHERE project_id = $1
                     ORDER BY round_number DESC"
                );
                sqlx::query_as::<_, ReannotationRound>(&query)
                    .bind(pid)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {ROUND_COLUMNS} FROM reannotation_rounds
                     ORDER BY project_id ASC, round_number DESC"
                );
                sqlx::query_as::<_, ReannotationRound>(&query)
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(rounds)
    }

    /// Set a round's status. The caller validates the transition through
    /// the core state machine first.
    pub async fn set_round_status(
        executor: impl sqlx::PgExecutor<'_>,
        id: DbId,
        status: &str,
    ) -> Result<Option<ReannotationRound>, sqlx::Error> {
        let query = format!(
            "UPDATE reannotation_rounds
             SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {ROUND_COLUMNS}"
        );
        sqlx::query_as::<_, ReannotationRound>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(executor)
            .await
    }

    /// Completed rounds joined with their distinct submitted-rater counts,
    /// for the eligibility scanner.
    pub async fn completed_rounds_with_submitters(
        pool: &PgPool,
    ) -> Result<Vec<RoundWithSubmitters>, sqlx::Error> {
        sqlx::query_as::<_, RoundWithSubmitters>(
            "SELECT r.id, r.project_id, r.round_number, r.task_group, r.status,
                    COUNT(DISTINCT t.annotator_id)
                        FILTER (WHERE t.status = 'submitted') AS submitted_raters
             FROM reannotation_rounds r
             LEFT JOIN reannotation_tasks t ON t.round_id = r.id
             WHERE r.status = 'completed'
             GROUP BY r.id
             ORDER BY r.project_id ASC, r.round_number ASC",
        )
        .fetch_all(pool)
        .await
    }

    // -- tasks ---------------------------------------------------------------

    /// Find a task by its ID.
    pub async fn find_task(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReannotationTask>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM reannotation_tasks WHERE id = $1");
        sqlx::query_as::<_, ReannotationTask>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all tasks of a round, ordered by item then annotator.
    pub async fn list_tasks_for_round(
        pool: &PgPool,
        round_id: DbId,
    ) -> Result<Vec<ReannotationTask>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM reannotation_tasks
             WHERE round_id = $1
             ORDER BY item_id ASC, annotator_id ASC"
        );
        sqlx::query_as::<_, ReannotationTask>(&query)
            .bind(round_id)
            .fetch_all(pool)
            .await
    }

    /// List one annotator's tasks, optionally filtered by status, newest
    /// round first.
    pub async fn list_tasks_for_annotator(
        pool: &PgPool,
        annotator_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<ReannotationTask>, sqlx::Error> {
        let tasks = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {TASK_COLUMNS} FROM reannotation_tasks
                     WHERE annotator_id = $1 AND status = $2
                     ORDER BY round_id DESC, item_id ASC"
                );
                sqlx::query_as::<_, ReannotationTask>(&query)
                    .bind(annotator_id)
                    .bind(status)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT {TASK_COLUMNS} FROM reannotation_tasks
                     WHERE annotator_id = $1
                     ORDER BY round_id DESC, item_id ASC"
                );
                sqlx::query_as::<_, ReannotationTask>(&query)
                    .bind(annotator_id)
                    .fetch_all(pool)
                    .await?
            }
        };
        Ok(tasks)
    }

    /// Set a task's status, keep-original flag, and comment. The caller
    /// validates the status transition through the core state machine.
    pub async fn finalize_task(
        executor: impl sqlx::PgExecutor<'_>,
        id: DbId,
        status: &str,
        keep_original: bool,
        comment: Option<&str>,
    ) -> Result<ReannotationTask, sqlx::Error> {
        let query = format!(
            "UPDATE reannotation_tasks
             SET status = $2, keep_original = $3, comment = $4, updated_at = now()
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, ReannotationTask>(&query)
            .bind(id)
            .bind(status)
            .bind(keep_original)
            .bind(comment)
            .fetch_one(executor)
            .await
    }

    /// Count a round's tasks still awaiting rater action.
    pub async fn open_task_count(
        executor: impl sqlx::PgExecutor<'_>,
        round_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reannotation_tasks
             WHERE round_id = $1 AND status IN ('pending', 'in_progress')",
        )
        .bind(round_id)
        .fetch_one(executor)
        .await
    }
}
