//! Route definitions, grouped by resource.

pub mod health;

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{analysis, annotation, auth, reannotation};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                          login (public)
///
/// /analysis/batch                      run batch analysis (POST, admin, ?force=)
/// /analysis/projects/{id}/scores       cached local scores (GET, ?round=)
/// /analysis/projects/{id}/global       interactive global alpha (GET, ?round=)
///
/// /reannotation/rounds                 list (?project_id=), create (admin)
/// /reannotation/rounds/{id}/cancel     cancel round (POST, admin)
/// /reannotation/tasks                  annotator queue (?annotator_id=, ?status=)
/// /reannotation/tasks/{id}/submit      submit task (POST)
/// /reannotation/tasks/{id}/skip        skip task (POST)
///
/// /annotations/items/{item_id}         round-0 upsert (PUT)
/// /annotations/items/{item_id}/audit   audit trail (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/analysis/batch", post(analysis::batch))
        .route(
            "/analysis/projects/{id}/scores",
            get(analysis::project_scores),
        )
        .route(
            "/analysis/projects/{id}/global",
            get(analysis::project_global_scores),
        )
        .route(
            "/reannotation/rounds",
            get(reannotation::list_rounds).post(reannotation::create_round),
        )
        .route(
            "/reannotation/rounds/{id}/cancel",
            post(reannotation::cancel_round),
        )
        .route("/reannotation/tasks", get(reannotation::list_tasks))
        .route(
            "/reannotation/tasks/{id}/submit",
            post(reannotation::submit_task),
        )
        .route(
            "/reannotation/tasks/{id}/skip",
            post(reannotation::skip_task),
        )
        .route(
            "/annotations/items/{item_id}",
            put(annotation::upsert_annotation),
        )
        .route(
            "/annotations/items/{item_id}/audit",
            get(annotation::item_audit_trail),
        )
}
