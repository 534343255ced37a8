use sqlx::PgPool;

use crate::error::Result;
use crate::models::request_log::{NewRequestLog, RequestLog};

#[derive(Clone)]
pub struct RequestLogService {
    pool: PgPool,
}

impl RequestLogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entry: NewRequestLog) -> Result<RequestLog> {
        let row = sqlx::query_as::<_, RequestLog>(
            r#"
            INSERT INTO request_logs (method, path, status_code, latency_ms, ip_address, user_id, api_key_used)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, method, path, status_code, latency_ms, ip_address, user_id, api_key_used, created_at
            "#,
        )
        .bind(entry.method)
        .bind(entry.path)
        .bind(entry.status_code)
        .bind(entry.latency_ms)
        .bind(entry.ip_address)
        .bind(entry.user_id)
        .bind(entry.api_key_used)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
