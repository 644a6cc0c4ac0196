//! Shared types for the canteen fulfillment system
//!
//! Common types used across crates: domain models, unified error codes,
//! and small time utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
