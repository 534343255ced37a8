pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::services::{
    auth_service::AuthService, candidate_service::CandidateService,
    request_log_service::RequestLogService, review_service::ReviewService,
    tag_service::TagService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub candidate_service: CandidateService,
    pub review_service: ReviewService,
    pub tag_service: TagService,
    pub user_service: UserService,
    pub auth_service: AuthService,
    pub request_log_service: RequestLogService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let user_service = UserService::new(pool.clone());
        let auth_service = AuthService::new(user_service.clone(), config);

        Self {
            candidate_service: CandidateService::new(pool.clone()),
            review_service: ReviewService::new(pool.clone()),
            tag_service: TagService::new(pool.clone()),
            request_log_service: RequestLogService::new(pool.clone()),
            user_service,
            auth_service,
            pool,
        }
    }
}
