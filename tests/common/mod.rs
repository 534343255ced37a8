#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};

use applicant_tracker::{
    config::Config,
    database::pool::{create_pool, run_migrations},
    routes::build_router,
    utils::{crypto::hash_password, token::issue_token},
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test_secret_key";
pub const API_KEY: &str = "test_api_key";

pub fn test_config(database_url: String) -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url,
        database_max_connections: 5,
        jwt_secret: Some(JWT_SECRET.into()),
        api_key: Some(API_KEY.into()),
        bot_rate_limit: 10_000,
        user_rate_limit: 10_000,
        rate_limit_window_secs: 900,
        cors_allowed_origins: Vec::new(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: PgPool,
    pub config: Config,
}

/// Returns `None` when no database is configured so the calling test can
/// return early.
pub async fn setup() -> Option<TestApp> {
    setup_with(|_| {}).await
}

pub async fn setup_with(adjust: impl FnOnce(&mut Config)) -> Option<TestApp> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };

    let mut config = test_config(database_url);
    adjust(&mut config);

    let pool = create_pool(&config).await.expect("pool");
    run_migrations(&pool).await.expect("migrations");

    let state = AppState::new(pool.clone(), &config);
    let router = build_router(state, &config);
    Some(TestApp {
        router,
        pool,
        config,
    })
}

static COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}-{}-{}-{}", prefix, std::process::id(), nanos, n)
}

pub async fn create_user(pool: &PgPool, username: &str, password: &str) -> i32 {
    sqlx::query_scalar("INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING id")
        .bind(username)
        .bind(hash_password(password).expect("hash"))
        .fetch_one(pool)
        .await
        .expect("insert user")
}

pub async fn operator_token(pool: &PgPool) -> (i32, String) {
    let user_id = create_user(pool, &unique("reviewer"), "password123").await;
    let token = issue_token(user_id, JWT_SECRET).expect("token");
    (user_id, token)
}

pub fn message_body(answers: Value) -> String {
    json!({ "payload": answers.to_string() }).to_string()
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    send_from(app, None, method, uri, headers, body).await
}

/// Like [`send`], but attaches the peer address the way `serve` does with
/// `into_make_service_with_connect_info`.
pub async fn send_from(
    app: &Router,
    peer: Option<SocketAddr>,
    method: &str,
    uri: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let mut request = builder.body(body).unwrap();
    if let Some(addr) = peer {
        request.extensions_mut().insert(ConnectInfo(addr));
    }
    let resp = app.clone().oneshot(request).await.unwrap();

    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn send_as(
    app: &Router,
    token: &str,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let bearer = format!("Bearer {}", token);
    send(app, method, uri, &[("authorization", &bearer)], body).await
}

pub async fn ingest(app: &Router, uuid: &str, answers: Value) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/api/candidates",
        &[("x-api-key", API_KEY)],
        Some(json!({
            "uuid": uuid,
            "message_body": message_body(answers),
            "sender": "+391234567",
        })),
    )
    .await
}
