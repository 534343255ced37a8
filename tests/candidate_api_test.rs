mod common;

use axum::http::StatusCode;
use common::{ingest, operator_token, send_as, setup, unique};
use serde_json::json;

#[tokio::test]
async fn search_filters_by_name_status_and_tags() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;
    let surname = unique("Babbage").replace('-', "");

    let mut ids = Vec::new();
    for first in ["Charles", "Ada"] {
        let (_, body) = ingest(
            &app.router,
            &unique("search"),
            json!({ "fullName": format!("{} {}", first, surname) }),
        )
        .await;
        ids.push(body["candidateId"].as_i64().unwrap());
    }

    let tag = unique("analytical");
    let (status, created) =
        send_as(&app.router, &token, "POST", "/api/tags", Some(json!({ "name": tag }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let tag_id = created["id"].as_i64().unwrap();

    let (status, tags) = send_as(
        &app.router,
        &token,
        "POST",
        &format!("/api/candidates/{}/tags", ids[1]),
        Some(json!({ "tagIds": [tag_id] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 1);

    let lower = surname.to_lowercase();
    let (status, page) = send_as(
        &app.router,
        &token,
        "GET",
        &format!("/api/candidates/search?search={}&status=pending", lower),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["page"], 1);
    assert_eq!(page["perPage"], 10);

    let (_, page) = send_as(
        &app.router,
        &token,
        "GET",
        &format!("/api/candidates/search?search={}&tags={}", lower, tag.to_uppercase()),
        None,
    )
    .await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], ids[1]);

    let (_, page) = send_as(
        &app.router,
        &token,
        "GET",
        &format!("/api/candidates/search?search={}&per_page=1&page=2", lower),
        None,
    )
    .await;
    assert_eq!(page["items"].as_array().unwrap().len(), 1);
    assert_eq!(page["totalPages"], 2);

    let (status, _) = send_as(
        &app.router,
        &token,
        "GET",
        "/api/candidates/search?status=archived",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;
    let (_, body) = ingest(
        &app.router,
        &unique("update"),
        json!({ "fullName": "Old Name", "email": "old@example.com", "githubLink": "github.com/old" }),
    )
    .await;
    let uri = format!("/api/candidates/{}", body["candidateId"].as_i64().unwrap());

    let (status, updated) = send_as(
        &app.router,
        &token,
        "PUT",
        &uri,
        Some(json!({ "fullName": "New Name", "status": "rejected", "githubLink": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["fullName"], "New Name");
    assert_eq!(updated["status"], "rejected");
    assert_eq!(updated["email"], "old@example.com");
    assert!(updated["githubLink"].is_null());

    let (status, _) = send_as(&app.router, &token, "PUT", &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_as(&app.router, &token, "PUT", &uri, Some(json!({ "email": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_as(
        &app.router,
        &token,
        "PUT",
        &format!("/api/candidates/{}", i32::MAX),
        Some(json!({ "fullName": "Ghost" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_full_name_is_rejected_and_not_stored() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;
    let (_, body) = ingest(&app.router, &unique("blank"), json!({ "fullName": "Kept Name" })).await;
    let uri = format!("/api/candidates/{}", body["candidateId"].as_i64().unwrap());

    let (status, body) =
        send_as(&app.router, &token, "PUT", &uri, Some(json!({ "fullName": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (status, updated) =
        send_as(&app.router, &token, "PUT", &uri, Some(json!({ "fullName": "  Trimmed  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["fullName"], "Trimmed");

    let (_, current) = send_as(&app.router, &token, "GET", &uri, None).await;
    assert_eq!(current["fullName"], "Trimmed");
}

#[tokio::test]
async fn huge_page_number_returns_empty_page() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;

    let (status, body) = send_as(
        &app.router,
        &token,
        "GET",
        &format!("/api/candidates/search?page={}&per_page=100", i64::MAX),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn malformed_path_and_query_use_error_body() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;

    for uri in [
        "/api/candidates/abc",
        "/api/candidates/search?page=x",
        "/api/candidates/1/tags/not-a-number",
    ] {
        let method = if uri.contains("/tags/") { "DELETE" } else { "GET" };
        let (status, body) = send_as(&app.router, &token, method, uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], "error", "{}", uri);
        assert!(body["message"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn tag_links_can_be_managed() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;
    let (_, body) = ingest(&app.router, &unique("tags"), json!({ "fullName": "Tagged" })).await;
    let id = body["candidateId"].as_i64().unwrap();

    let name = unique("devops");
    let (_, tag) = send_as(&app.router, &token, "POST", "/api/tags", Some(json!({ "name": name }))).await;
    let tag_id = tag["id"].as_i64().unwrap();

    let (status, _) =
        send_as(&app.router, &token, "POST", "/api/tags", Some(json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, catalog) = send_as(&app.router, &token, "GET", "/api/tags", None).await;
    assert!(catalog.as_array().unwrap().iter().any(|t| t["name"] == name));

    let attach_uri = format!("/api/candidates/{}/tags", id);
    for _ in 0..2 {
        let (status, tags) = send_as(
            &app.router,
            &token,
            "POST",
            &attach_uri,
            Some(json!({ "tagIds": [tag_id] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tags.as_array().unwrap().len(), 1);
    }

    let (status, _) = send_as(
        &app.router,
        &token,
        "POST",
        &attach_uri,
        Some(json!({ "tagIds": [i32::MAX] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let detach_uri = format!("/api/candidates/{}/tags/{}", id, tag_id);
    let (status, _) = send_as(&app.router, &token, "DELETE", &detach_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_as(&app.router, &token, "DELETE", &detach_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn review_criteria_catalog_is_listed() {
    let Some(app) = setup().await else { return };
    let (_, token) = operator_token(&app.pool).await;

    let (status, criteria) = send_as(&app.router, &token, "GET", "/api/review-criteria", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = criteria
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["id"].as_str())
        .collect();
    assert!(ids.contains(&"technical_skills"));
    assert!(ids.contains(&"communication"));
}

#[tokio::test]
async fn health_reports_database() {
    let Some(app) = setup().await else { return };

    let (status, body) = common::send(&app.router, "GET", "/health", &[], None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
}
