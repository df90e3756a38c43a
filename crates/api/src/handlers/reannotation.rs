//! Handlers for the `/reannotation` resource: round creation and
//! administration plus the rater-facing task queue.

use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use concord_core::annotation::{field_changes, AnswerSet, CompletionStatus};
use concord_core::error::CoreError;
use concord_core::roles::ROLE_ADMIN;
use concord_core::round::{
    flagged_tasks, validate_threshold, ReannotationTaskStatus, RoundStatus, TaskScores,
};
use concord_core::task::TaskGroup;
use concord_core::types::DbId;
use concord_db::models::annotation_version::UpsertAnnotationVersion;
use concord_db::models::audit::CreateAuditLog;
use concord_db::models::reannotation::{
    CreateReannotationRound, NewReannotationTask, ReannotationRound, ReannotationTask,
};
use concord_db::repositories::{
    AgreementScoreRepo, AnnotationVersionRepo, AuditLogRepo, ProjectRepo, ReannotationRepo,
};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /reannotation/rounds`.
#[derive(Debug, Deserialize)]
pub struct RoundListQuery {
    pub project_id: Option<DbId>,
}

/// Query parameters for `GET /reannotation/tasks`.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// Defaults to the authenticated annotator. Only admins may query
    /// another annotator's queue.
    pub annotator_id: Option<DbId>,
    pub status: Option<String>,
}

/// Request body for `POST /reannotation/tasks/{id}/submit`.
#[derive(Debug, Deserialize)]
pub struct SubmitTaskRequest {
    /// New answers. May be empty when `keep_original` is set.
    #[serde(default)]
    pub answers: AnswerSet,
    /// Keep the prior answers as-is; empty `answers` then re-submits them.
    #[serde(default)]
    pub keep_original: bool,
    pub comment: Option<String>,
}

/// Response for round creation.
#[derive(Debug, Serialize)]
pub struct CreateRoundResponse {
    pub round_id: DbId,
    pub round_number: i32,
    pub flagged_item_count: usize,
    pub flagged_task_count: usize,
}

/// Response for task submission.
#[derive(Debug, Serialize)]
pub struct SubmitTaskResponse {
    pub task: ReannotationTask,
    /// Number of field-level audit entries this submission produced.
    pub audit_entries_written: usize,
}

// ---------------------------------------------------------------------------
// Round administration
// ---------------------------------------------------------------------------

/// POST /api/v1/reannotation/rounds
///
/// Create a reannotation round from the latest cached scores. Admin only.
///
/// Every task of the chosen group whose latest local score is below the
/// threshold, undefined, or missing flags its item; each flagged item
/// produces one assignment per rater who has annotated it. Rejects with a
/// validation error when nothing is flagged.
pub async fn create_round(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateReannotationRound>,
) -> AppResult<Json<serde_json::Value>> {
    let group = TaskGroup::from_str(&input.task_group)?;
    validate_threshold(input.threshold)?;

    ProjectRepo::find_by_id(&state.pool, input.project_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: input.project_id,
        })?;

    // Seed every item of the project so an item with no cached scores at
    // all is treated as all-undefined rather than skipped.
    let mut scores_by_item: BTreeMap<DbId, TaskScores> = BTreeMap::new();
    for item in ProjectRepo::list_items(&state.pool, input.project_id).await? {
        scores_by_item.insert(item.id, TaskScores::new());
    }

    // Latest score per (item, task); a later round supersedes the initial
    // pass for the same pair.
    let latest = AgreementScoreRepo::latest_scores_for_project(&state.pool, input.project_id)
        .await?;
    for score in latest {
        if let Ok(task) = concord_core::task::AnnotationTask::from_str(&score.task) {
            scores_by_item
                .entry(score.item_id)
                .or_default()
                .insert(task, score.local_score);
        }
    }

    let mut flagged_item_count = 0;
    let mut flagged_task_count = 0;
    let mut assignments: Vec<NewReannotationTask> = Vec::new();

    for (item_id, scores) in &scores_by_item {
        let flagged = flagged_tasks(group, scores, input.threshold);
        if flagged.is_empty() {
            continue;
        }
        flagged_item_count += 1;
        flagged_task_count += flagged.len();

        // Frozen task -> score context shown to the rater.
        let mut context = Map::new();
        for (task, score) in &flagged {
            let value = match score {
                Some(s) => Value::from(*s),
                None => Value::Null,
            };
            context.insert(task.as_str().to_string(), value);
        }
        let context = Value::Object(context);

        // One assignment per rater who has annotated the item.
        for version in AnnotationVersionRepo::latest_per_annotator(&state.pool, *item_id).await? {
            assignments.push(NewReannotationTask {
                item_id: *item_id,
                annotator_id: version.annotator_id,
                flagged_tasks: context.clone(),
            });
        }
    }

    if flagged_item_count == 0 {
        return Err(AppError::Core(CoreError::Validation(format!(
            "No items in the '{}' group fall below threshold {}",
            group.as_str(),
            input.threshold
        ))));
    }

    let round = ReannotationRepo::create_round_with_tasks(
        &state.pool,
        input.project_id,
        group.as_str(),
        input.threshold,
        &assignments,
    )
    .await?;

    tracing::info!(
        round_id = round.id,
        round_number = round.round_number,
        flagged_item_count,
        assignment_count = assignments.len(),
        "Created reannotation round"
    );

    Ok(Json(serde_json::json!({
        "data": CreateRoundResponse {
            round_id: round.id,
            round_number: round.round_number,
            flagged_item_count,
            flagged_task_count,
        }
    })))
}

/// GET /api/v1/reannotation/rounds?project_id=
///
/// List reannotation rounds, optionally scoped to one project.
pub async fn list_rounds(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<RoundListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let rounds = ReannotationRepo::list_rounds(&state.pool, params.project_id).await?;

    Ok(Json(serde_json::json!({ "data": rounds })))
}

/// POST /api/v1/reannotation/rounds/{id}/cancel
///
/// Cancel an active round. Admin only; completed and cancelled rounds
/// reject with a conflict.
pub async fn cancel_round(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(round_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let round = require_round(&state, round_id).await?;

    let next = RoundStatus::from_str(&round.status)?.transition(RoundStatus::Cancelled)?;
    let updated = ReannotationRepo::set_round_status(&state.pool, round.id, next.as_str())
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ReannotationRound",
            id: round_id,
        })?;

    tracing::info!(round_id, "Cancelled reannotation round");

    Ok(Json(serde_json::json!({ "data": updated })))
}

// ---------------------------------------------------------------------------
// Task queue
// ---------------------------------------------------------------------------

/// GET /api/v1/reannotation/tasks?annotator_id=&status=
///
/// An annotator's task queue, newest round first. Annotators see only
/// their own queue; admins may query anyone's.
pub async fn list_tasks(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<TaskListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let annotator_id = params.annotator_id.unwrap_or(auth.annotator_id);
    if annotator_id != auth.annotator_id && auth.role != ROLE_ADMIN {
        return Err(AppError::Core(CoreError::Forbidden(
            "Annotators may only list their own tasks".into(),
        )));
    }

    // Reject unknown status filters instead of silently matching nothing.
    if let Some(status) = &params.status {
        ReannotationTaskStatus::from_str(status)?;
    }

    let tasks = ReannotationRepo::list_tasks_for_annotator(
        &state.pool,
        annotator_id,
        params.status.as_deref(),
    )
    .await?;

    Ok(Json(serde_json::json!({ "data": tasks })))
}

/// POST /api/v1/reannotation/tasks/{id}/submit
///
/// Submit a reannotation task: diff the new answers against the rater's
/// prior latest values, append one audit entry per changed field, upsert
/// the version at the round's number, and close the task. Runs in one
/// transaction; the round auto-completes when its last open task closes.
pub async fn submit_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
    Json(input): Json<SubmitTaskRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let task = require_own_task(&state, task_id, &auth).await?;
    let round = require_active_round(&state, task.round_id).await?;

    let next = ReannotationTaskStatus::from_str(&task.status)?
        .transition(ReannotationTaskStatus::Submitted)?;

    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let previous =
        AnnotationVersionRepo::latest_for_annotator(&mut *tx, task.item_id, task.annotator_id)
            .await?;
    let previous_answers = previous.as_ref().map(|v| v.answer_set());

    // keep_original with empty answers re-submits the prior values.
    let answers = if input.keep_original && input.answers.is_empty() {
        previous_answers.clone().unwrap_or_default()
    } else if input.answers.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Submission must include answers or set keep_original".into(),
        )));
    } else {
        input.answers
    };

    let changes = field_changes(previous_answers.as_ref(), &answers);
    let entries: Vec<CreateAuditLog> = changes
        .into_iter()
        .map(|change| CreateAuditLog {
            item_id: task.item_id,
            annotator_id: task.annotator_id,
            field: change.task.as_str().to_string(),
            old_value: change.old_value,
            new_value: change.new_value,
            round: round.round_number,
            reason: input.comment.clone(),
        })
        .collect();
    AuditLogRepo::batch_insert(&mut *tx, &entries).await?;

    AnnotationVersionRepo::upsert(
        &mut *tx,
        task.item_id,
        task.annotator_id,
        round.round_number,
        &UpsertAnnotationVersion {
            answers,
            status: CompletionStatus::Completed.as_str().to_string(),
        },
    )
    .await?;

    let finalized = ReannotationRepo::finalize_task(
        &mut *tx,
        task.id,
        next.as_str(),
        input.keep_original,
        input.comment.as_deref(),
    )
    .await?;

    complete_round_if_done(&mut tx, &round).await?;
    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!(
        task_id,
        round_id = round.id,
        audit_entries = entries.len(),
        "Reannotation task submitted"
    );

    Ok(Json(serde_json::json!({
        "data": SubmitTaskResponse {
            task: finalized,
            audit_entries_written: entries.len(),
        }
    })))
}

/// POST /api/v1/reannotation/tasks/{id}/skip
///
/// Skip a reannotation task. Writes no version and no audit entries; the
/// round still auto-completes when its last open task closes.
pub async fn skip_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(task_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let task = require_own_task(&state, task_id, &auth).await?;
    let round = require_active_round(&state, task.round_id).await?;

    let next = ReannotationTaskStatus::from_str(&task.status)?
        .transition(ReannotationTaskStatus::Skipped)?;

    let mut tx = state.pool.begin().await.map_err(AppError::Database)?;

    let finalized =
        ReannotationRepo::finalize_task(&mut *tx, task.id, next.as_str(), false, None).await?;
    complete_round_if_done(&mut tx, &round).await?;

    tx.commit().await.map_err(AppError::Database)?;

    tracing::info!(task_id, round_id = round.id, "Reannotation task skipped");

    Ok(Json(serde_json::json!({ "data": finalized })))
}

// ---------------------------------------------------------------------------
// Shared lookups
// ---------------------------------------------------------------------------

/// Resolve a round or reject with 404.
async fn require_round(state: &AppState, round_id: DbId) -> Result<ReannotationRound, AppError> {
    let round = ReannotationRepo::find_round(&state.pool, round_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ReannotationRound",
            id: round_id,
        })?;
    Ok(round)
}

/// Resolve a round and require it to still be active.
async fn require_active_round(
    state: &AppState,
    round_id: DbId,
) -> Result<ReannotationRound, AppError> {
    let round = require_round(state, round_id).await?;
    if RoundStatus::from_str(&round.status)?.is_terminal() {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Round {} is {} and no longer accepts submissions",
            round.id, round.status
        ))));
    }
    Ok(round)
}

/// Resolve a task and require it to belong to the authenticated annotator.
async fn require_own_task(
    state: &AppState,
    task_id: DbId,
    auth: &AuthUser,
) -> Result<ReannotationTask, AppError> {
    let task = ReannotationRepo::find_task(&state.pool, task_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "ReannotationTask",
            id: task_id,
        })?;
    if task.annotator_id != auth.annotator_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Task belongs to another annotator".into(),
        )));
    }
    Ok(task)
}

/// Mark the round completed when no open tasks remain. Runs inside the
/// caller's transaction so the count sees the task just finalized.
async fn complete_round_if_done(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    round: &ReannotationRound,
) -> Result<(), AppError> {
    let open = ReannotationRepo::open_task_count(&mut **tx, round.id).await?;
    if open == 0 {
        let next = RoundStatus::from_str(&round.status)?.transition(RoundStatus::Completed)?;
        ReannotationRepo::set_round_status(&mut **tx, round.id, next.as_str()).await?;
        tracing::info!(round_id = round.id, "Round auto-completed");
    }
    Ok(())
}
