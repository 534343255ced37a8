mod common;

use axum::http::StatusCode;
use common::{ingest, operator_token, send_as, setup, unique};
use serde_json::json;

async fn review_count(pool: &sqlx::PgPool, candidate_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE candidate_id = $1")
        .bind(candidate_id as i32)
        .fetch_one(pool)
        .await
        .expect("count reviews")
}

#[tokio::test]
async fn two_phase_review_then_delete() {
    let Some(app) = setup().await else { return };
    let (reviewer_id, token) = operator_token(&app.pool).await;

    let (status, body) = ingest(
        &app.router,
        &unique("abc-1"),
        json!({ "fullName": "Ada Lovelace", "email": "ada@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["candidateId"].as_i64().unwrap();
    let uri = format!("/api/candidates/{}", id);

    let (status, candidate) = send_as(&app.router, &token, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(candidate["status"], "pending");
    assert_eq!(candidate["fullName"], "Ada Lovelace");
    assert_eq!(candidate["sender"], "+391234567");
    assert_eq!(candidate["reviews"].as_array().unwrap().len(), 0);

    let (status, review) = send_as(
        &app.router,
        &token,
        "POST",
        &format!("{}/phase-one", uri),
        Some(json!({ "criteriaRatings": { "technical_skills": 4, "communication": 5 } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["phase"], 1);
    assert_eq!(review["userId"], reviewer_id);

    let (_, all) = send_as(&app.router, &token, "GET", "/api/candidates", None).await;
    let listed = all
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == id)
        .expect("candidate listed");
    assert_eq!(listed["reviews"].as_array().unwrap().len(), 1);

    let (_, candidate) = send_as(&app.router, &token, "GET", &uri, None).await;
    let reviews = candidate["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["criteriaRatings"]["technical_skills"], 4);
    assert_eq!(candidate["status"], "pending");

    let (status, review) = send_as(
        &app.router,
        &token,
        "POST",
        &format!("{}/phase-two", uri),
        Some(json!({ "finalScore": 8.5, "hireDecision": true, "finalComment": "Strong hire" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["phase"], 2);
    assert_eq!(review["finalScore"], 8.5);

    let (_, candidate) = send_as(&app.router, &token, "GET", &uri, None).await;
    let phases: Vec<i64> = candidate["reviews"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["phase"].as_i64().unwrap())
        .collect();
    assert_eq!(phases, vec![1, 2]);
    assert_eq!(candidate["status"], "reviewed");

    let (status, _) = send_as(&app.router, &token, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send_as(&app.router, &token, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(review_count(&app.pool, id).await, 0);
}

#[tokio::test]
async fn phase_rules_are_enforced() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;

    let (_, body) = ingest(&app.router, &unique("rules"), json!({ "fullName": "Rules" })).await;
    let uri = format!("/api/candidates/{}", body["candidateId"].as_i64().unwrap());
    let phase_one = json!({ "criteriaRatings": { "problem_solving": 3 } });
    let phase_two = json!({ "finalScore": 4.0, "hireDecision": false });

    let (status, _) =
        send_as(&app.router, &token, "POST", &format!("{}/phase-two", uri), Some(phase_two.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_as(
        &app.router,
        &token,
        "POST",
        &format!("{}/phase-one", uri),
        Some(json!({ "criteriaRatings": { "communication": 9 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send_as(&app.router, &token, "POST", &format!("{}/phase-one", uri), Some(phase_one.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) =
        send_as(&app.router, &token, "POST", &format!("{}/phase-one", uri), Some(phase_one)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send_as(
        &app.router,
        &token,
        "POST",
        &format!("{}/phase-two", uri),
        Some(json!({ "hireDecision": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send_as(&app.router, &token, "POST", &format!("{}/phase-two", uri), Some(phase_two.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) =
        send_as(&app.router, &token, "POST", &format!("{}/phase-two", uri), Some(phase_two)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, candidate) = send_as(&app.router, &token, "GET", &uri, None).await;
    assert_eq!(candidate["status"], "rejected");
    assert_eq!(candidate["reviews"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn review_of_unknown_candidate_is_not_found() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;

    let (status, _) = send_as(
        &app.router,
        &token,
        "POST",
        &format!("/api/candidates/{}/phase-one", i32::MAX),
        Some(json!({ "criteriaRatings": { "teamwork": 5 } })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_delete_leaves_candidate_and_reviews() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;

    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION block_atomic_candidate_delete() RETURNS trigger AS $$
        BEGIN
            IF OLD.uuid LIKE 'atomic-%' THEN
                RAISE EXCEPTION 'induced delete failure';
            END IF;
            RETURN OLD;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&app.pool)
    .await
    .expect("create trigger function");
    sqlx::query("DROP TRIGGER IF EXISTS block_atomic_candidate_delete ON candidates")
        .execute(&app.pool)
        .await
        .expect("drop trigger");
    sqlx::query(
        "CREATE TRIGGER block_atomic_candidate_delete BEFORE DELETE ON candidates \
         FOR EACH ROW EXECUTE FUNCTION block_atomic_candidate_delete()",
    )
    .execute(&app.pool)
    .await
    .expect("create trigger");

    let uuid = unique("atomic");
    let (_, body) = ingest(&app.router, &uuid, json!({ "fullName": "Atomic" })).await;
    let id = body["candidateId"].as_i64().unwrap();
    let uri = format!("/api/candidates/{}", id);
    let (status, _) = send_as(
        &app.router,
        &token,
        "POST",
        &format!("{}/phase-one", uri),
        Some(json!({ "criteriaRatings": { "culture_fit": 4 } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (delete_status, delete_body) = send_as(&app.router, &token, "DELETE", &uri, None).await;
    let (get_status, _) = send_as(&app.router, &token, "GET", &uri, None).await;
    let reviews_left = review_count(&app.pool, id).await;

    drop_delete_blocker(&app.pool).await;

    assert_eq!(delete_status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(delete_body["message"], "Internal Server Error");
    assert_eq!(get_status, StatusCode::OK);
    assert_eq!(reviews_left, 1);

    let (status, _) = send_as(&app.router, &token, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(review_count(&app.pool, id).await, 0);

    let leftover: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pg_trigger WHERE tgname = 'block_atomic_candidate_delete'",
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(leftover, 0);
}

async fn drop_delete_blocker(pool: &sqlx::PgPool) {
    sqlx::query("DROP TRIGGER IF EXISTS block_atomic_candidate_delete ON candidates")
        .execute(pool)
        .await
        .expect("drop trigger");
    sqlx::query("DROP FUNCTION IF EXISTS block_atomic_candidate_delete()")
        .execute(pool)
        .await
        .expect("drop trigger function");
}
