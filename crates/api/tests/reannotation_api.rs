//! HTTP-level integration tests for reannotation round creation.

mod common;

use axum::http::StatusCode;
use common::{assert_status, build_test_app, post_json_auth, test_token};
use sqlx::PgPool;

use concord_core::types::DbId;
use concord_db::repositories::ReannotationRepo;

struct Fixture {
    project_id: DbId,
    admin_id: DbId,
    items: [DbId; 2],
}

/// Admin plus two raters, one project, two items. Both items carry
/// completed round-0 annotations from both raters.
async fn seed(pool: &PgPool) -> Fixture {
    let (admin_id,): (DbId,) = sqlx::query_as(
        "INSERT INTO annotators (username, role, password_hash)
         VALUES ('boss', 'admin', 'x') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .unwrap();

    let mut raters = [0; 2];
    for (i, name) in ["carol", "dave"].iter().enumerate() {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO annotators (username, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap();
        raters[i] = id;
    }

    let (project_id,): (DbId,) =
        sqlx::query_as("INSERT INTO projects (name) VALUES ('Round Week 5') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    let mut items = [0; 2];
    for i in 0..2 {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO items (project_id, content) VALUES ($1, 'promise text') RETURNING id",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await
        .unwrap();
        items[i] = id;
    }

    for item_id in items {
        for rater_id in raters {
            sqlx::query(
                "INSERT INTO annotation_versions
                    (item_id, annotator_id, round, promise_status,
                     verification_timeline, evidence_status, evidence_quality, status)
                 VALUES ($1, $2, 0, 'Yes', 'direct', 'provided', 'strong', 'completed')",
            )
            .bind(item_id)
            .bind(rater_id)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    Fixture {
        project_id,
        admin_id,
        items,
    }
}

async fn insert_score(pool: &PgPool, fixture: &Fixture, item_id: DbId, task: &str, score: f64) {
    sqlx::query(
        "INSERT INTO agreement_scores (project_id, item_id, round, task, local_score, raters_count)
         VALUES ($1, $2, 0, $3, $4, 2)",
    )
    .bind(fixture.project_id)
    .bind(item_id)
    .bind(task)
    .bind(score)
    .execute(pool)
    .await
    .unwrap();
}

/// An item with no cached scores at all counts as all-undefined and is
/// flagged, even though analysis never wrote a row for it.
#[sqlx::test(migrations = "../db/migrations")]
async fn unscored_item_is_flagged_as_undefined(pool: PgPool) {
    let fixture = seed(&pool).await;

    // Item 1 scores cleanly on the whole promise group; item 2 has no
    // agreement_scores rows whatsoever.
    insert_score(&pool, &fixture, fixture.items[0], "promise_status", 0.9).await;
    insert_score(&pool, &fixture, fixture.items[0], "verification_timeline", 0.9).await;

    let app = build_test_app(pool.clone());
    let token = test_token(fixture.admin_id, "admin");
    let body = serde_json::json!({
        "project_id": fixture.project_id,
        "task_group": "promise",
        "threshold": 0.5,
    });
    let response = post_json_auth(app, "/api/v1/reannotation/rounds", &token, body).await;
    let json = assert_status(response, StatusCode::OK).await;

    assert_eq!(json["data"]["round_number"], 1);
    assert_eq!(json["data"]["flagged_item_count"], 1);
    assert_eq!(json["data"]["flagged_task_count"], 2);

    // Both raters of the unscored item get a task; the frozen context
    // records both promise-group tasks as undefined.
    let round_id = json["data"]["round_id"].as_i64().unwrap();
    let tasks = ReannotationRepo::list_tasks_for_round(&pool, round_id)
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);
    for task in &tasks {
        assert_eq!(task.item_id, fixture.items[1]);
        assert_eq!(task.flagged_tasks["promise_status"], serde_json::Value::Null);
        assert_eq!(
            task.flagged_tasks["verification_timeline"],
            serde_json::Value::Null
        );
    }
}

/// When every item of the group is at or above threshold, round creation
/// is rejected instead of creating an empty round.
#[sqlx::test(migrations = "../db/migrations")]
async fn all_items_passing_rejects_round_creation(pool: PgPool) {
    let fixture = seed(&pool).await;

    for item_id in fixture.items {
        insert_score(&pool, &fixture, item_id, "promise_status", 1.0).await;
        insert_score(&pool, &fixture, item_id, "verification_timeline", 1.0).await;
    }

    let app = build_test_app(pool.clone());
    let token = test_token(fixture.admin_id, "admin");
    let body = serde_json::json!({
        "project_id": fixture.project_id,
        "task_group": "promise",
        "threshold": 0.5,
    });
    let response = post_json_auth(app, "/api/v1/reannotation/rounds", &token, body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        ReannotationRepo::list_rounds(&pool, Some(fixture.project_id))
            .await
            .unwrap()
            .len(),
        0
    );
}
