pub mod auth_dto;
pub mod candidate_dto;
pub mod review_dto;
pub mod webhook_dto;
