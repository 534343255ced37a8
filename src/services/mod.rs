pub mod auth_service;
pub mod candidate_service;
pub mod request_log_service;
pub mod review_service;
pub mod tag_service;
pub mod user_service;
