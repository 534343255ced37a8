pub mod candidate;
pub mod request_log;
pub mod review;
pub mod tag;
pub mod user;
