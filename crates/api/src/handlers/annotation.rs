//! Handlers for the `/annotations` resource: the round-0 write surface and
//! the per-item audit trail.

use axum::extract::{Path, State};
use axum::Json;

use concord_core::annotation::CompletionStatus;
use concord_core::error::CoreError;
use concord_core::roles::ROLE_ADMIN;
use concord_core::round::INITIAL_ROUND;
use concord_core::types::DbId;
use concord_db::models::annotation_version::UpsertAnnotationVersion;
use concord_db::repositories::{AnnotationVersionRepo, AuditLogRepo, ProjectRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// PUT /api/v1/annotations/items/{item_id}
///
/// Upsert the authenticated annotator's round-0 judgement on one item.
/// Saving twice overwrites the same row and bumps its save counter.
pub async fn upsert_annotation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
    Json(input): Json<UpsertAnnotationVersion>,
) -> AppResult<Json<serde_json::Value>> {
    require_item(&state, item_id).await?;

    // Reject unknown status strings before touching the row.
    CompletionStatus::from_str(&input.status)?;

    let version = AnnotationVersionRepo::upsert(
        &state.pool,
        item_id,
        auth.annotator_id,
        INITIAL_ROUND,
        &input,
    )
    .await?;

    Ok(Json(serde_json::json!({ "data": version })))
}

/// GET /api/v1/annotations/items/{item_id}/audit
///
/// The item's audit trail. Admins see every rater's entries; annotators
/// see only their own.
pub async fn item_audit_trail(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    require_item(&state, item_id).await?;

    let entries = if auth.role == ROLE_ADMIN {
        AuditLogRepo::list_by_item(&state.pool, item_id).await?
    } else {
        AuditLogRepo::list_by_item_annotator(&state.pool, item_id, auth.annotator_id).await?
    };

    Ok(Json(serde_json::json!({ "data": entries })))
}

/// Resolve an item or reject with 404.
async fn require_item(state: &AppState, item_id: DbId) -> Result<(), AppError> {
    ProjectRepo::find_item(&state.pool, item_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Item",
            id: item_id,
        }))?;
    Ok(())
}
