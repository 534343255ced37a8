use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use sqlx::types::ipnetwork::IpNetwork;

use crate::middleware::auth::AuthContext;
use crate::models::request_log::NewRequestLog;
use crate::AppState;

/// Persists one `request_logs` row per request. A failed insert is logged and
/// the response is returned untouched.
pub async fn log_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let ip_address = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| IpNetwork::from(addr.ip()));

    let response = next.run(req).await;

    let context = response.extensions().get::<AuthContext>().copied();
    let entry = NewRequestLog {
        method,
        path,
        status_code: i32::from(response.status().as_u16()),
        latency_ms: i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX),
        ip_address,
        user_id: context.and_then(|c| c.user_id()),
        api_key_used: matches!(context, Some(AuthContext::Bot)),
    };

    if let Err(e) = state.request_log_service.record(entry).await {
        tracing::warn!(error = ?e, "failed to persist request log");
    }

    response
}
