//! Handlers for the `/analysis` resource: batch runs and score reads.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use concord_core::error::CoreError;
use concord_core::round::INITIAL_ROUND;
use concord_core::types::DbId;
use concord_db::repositories::{AgreementScoreRepo, ProjectRepo};

use crate::engine::batch::{global_scores, run_batch, scoring_inputs};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query types
// ---------------------------------------------------------------------------

/// Query parameters for `POST /analysis/batch`.
#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    /// If `true`, recompute every target even when cached. Defaults to `false`.
    pub force: Option<bool>,
}

/// Query parameters for score reads. `round` defaults to 0 (initial pass).
#[derive(Debug, Deserialize)]
pub struct ScoresQuery {
    pub round: Option<i32>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/analysis/batch?force=
///
/// Run batch agreement analysis over every eligible target. Admin only.
/// Per-target failures are reported in the summary, never abort the run.
pub async fn batch(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<BatchQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let force = params.force.unwrap_or(false);
    let report = run_batch(&state.pool, force).await?;

    Ok(Json(serde_json::json!({ "data": report })))
}

/// GET /api/v1/analysis/projects/{id}/scores?round=
///
/// Read the cached local scores for a (project, round) key. Returns an
/// empty list when the key has no cache; it does not trigger computation.
pub async fn project_scores(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<ScoresQuery>,
) -> AppResult<Json<serde_json::Value>> {
    require_project(&state, project_id).await?;

    let round = params.round.unwrap_or(INITIAL_ROUND);
    let scores = AgreementScoreRepo::read(&state.pool, project_id, round).await?;

    Ok(Json(serde_json::json!({ "data": scores })))
}

/// GET /api/v1/analysis/projects/{id}/global?round=
///
/// Compute the per-task global alpha for a (project, round) pair on demand.
/// Global scores are never cached; this always reads the version store.
pub async fn project_global_scores(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<ScoresQuery>,
) -> AppResult<Json<serde_json::Value>> {
    require_project(&state, project_id).await?;

    let round = params.round.unwrap_or(INITIAL_ROUND);
    let (versions, tasks) = scoring_inputs(&state.pool, project_id, round).await?;
    let globals = global_scores(&versions, tasks);

    Ok(Json(serde_json::json!({ "data": globals })))
}

/// Resolve a project or reject with 404.
async fn require_project(state: &AppState, project_id: DbId) -> Result<(), AppError> {
    ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;
    Ok(())
}
