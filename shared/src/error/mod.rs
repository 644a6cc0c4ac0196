//! Unified error system for the canteen fulfillment service
//!
//! This module provides:
//! - [`ErrorCode`]: standardized error codes for all error types
//! - [`AppError`]: rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication / authorization errors
//! - 2xxx: Order errors
//! - 3xxx: Locker errors
//! - 4xxx: Pickup credential errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! // Create a simple error
//! let err = AppError::new(ErrorCode::OrderNotFound);
//!
//! // Create an error with custom message
//! let err = AppError::with_message(ErrorCode::ItemUnavailable, "Borscht is sold out");
//!
//! // Create an error with details
//! let err = AppError::validation("qty must be at least 1")
//!     .with_detail("field", "qty");
//! ```

mod codes;
mod http;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
