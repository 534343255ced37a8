use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RequestLog {
    pub id: i64,
    pub method: String,
    pub path: String,
    pub status_code: i32,
    pub latency_ms: i32,
    pub ip_address: Option<IpNetwork>,
    pub user_id: Option<i32>,
    pub api_key_used: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRequestLog {
    pub method: String,
    pub path: String,
    pub status_code: i32,
    pub latency_ms: i32,
    pub ip_address: Option<IpNetwork>,
    pub user_id: Option<i32>,
    pub api_key_used: bool,
}
