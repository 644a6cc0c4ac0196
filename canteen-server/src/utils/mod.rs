//! Utilities: API response plumbing and logging

pub mod error;
pub mod logger;

pub use error::{ApiError, ApiResult, AppResponse};
