//! Unified error codes for the canteen fulfillment service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication / authorization errors
//! - 2xxx: Order errors
//! - 3xxx: Locker errors
//! - 4xxx: Pickup credential errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Permission denied
    PermissionDenied = 1002,
    /// Specific role required
    RoleRequired = 1003,

    // ==================== 2xxx: Order ====================
    /// Order not found
    OrderNotFound = 2001,
    /// Transition attempted from an illegal order status
    InvalidOrderStatus = 2002,
    /// Requested pickup time outside the allowed window
    ScheduledTimeInvalid = 2003,
    /// Menu item does not exist
    ItemNotFound = 2004,
    /// Menu item unavailable at the site for the requested slot
    ItemUnavailable = 2005,

    // ==================== 3xxx: Locker ====================
    /// No free cells at the site
    NoFreeCells = 3001,
    /// Requested cell is not free
    CellOccupied = 3002,
    /// Site not found
    LocationNotFound = 3003,

    // ==================== 4xxx: Pickup ====================
    /// No credential matches the presented token or PIN
    InvalidToken = 4001,
    /// Credential validity window has passed
    TokenExpired = 4002,
    /// Credential was already consumed or superseded
    TokenAlreadyUsed = 4003,
    /// Cell hold deadline passed before the order was claimed
    OrderExpired = 4004,
    /// Reservation was released out-of-band
    CellReleased = 4005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Stable machine-readable identifier, used in API error bodies
    /// (e.g. `INVALID_TOKEN`, `ORDER_EXPIRED`)
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Unknown => "UNKNOWN",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::RoleRequired => "ROLE_REQUIRED",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::InvalidOrderStatus => "INVALID_ORDER_STATUS",
            Self::ScheduledTimeInvalid => "SCHEDULED_TIME_INVALID",
            Self::ItemNotFound => "ITEM_NOT_FOUND",
            Self::ItemUnavailable => "ITEM_UNAVAILABLE",
            Self::NoFreeCells => "NO_FREE_CELLS",
            Self::CellOccupied => "CELL_OCCUPIED",
            Self::LocationNotFound => "LOCATION_NOT_FOUND",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenAlreadyUsed => "TOKEN_ALREADY_USED",
            Self::OrderExpired => "ORDER_EXPIRED",
            Self::CellReleased => "CELL_RELEASED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::NotAuthenticated => "Not authenticated",
            Self::PermissionDenied => "Permission denied",
            Self::RoleRequired => "Required role is missing",
            Self::OrderNotFound => "Order not found",
            Self::InvalidOrderStatus => "Order is not in a valid status for this operation",
            Self::ScheduledTimeInvalid => "Scheduled pickup time is outside the allowed window",
            Self::ItemNotFound => "Menu item not found",
            Self::ItemUnavailable => "Menu item is not available",
            Self::NoFreeCells => "No free locker cells at this site",
            Self::CellOccupied => "Locker cell is not free",
            Self::LocationNotFound => "Site not found",
            Self::InvalidToken => "No matching pickup credential",
            Self::TokenExpired => "Pickup credential has expired, request a re-issue",
            Self::TokenAlreadyUsed => "Pickup credential has already been used",
            Self::OrderExpired => "Order hold expired before pickup",
            Self::CellReleased => "Locker cell was already released",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when converting an unknown u16 to [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            1001 => Self::NotAuthenticated,
            1002 => Self::PermissionDenied,
            1003 => Self::RoleRequired,
            2001 => Self::OrderNotFound,
            2002 => Self::InvalidOrderStatus,
            2003 => Self::ScheduledTimeInvalid,
            2004 => Self::ItemNotFound,
            2005 => Self::ItemUnavailable,
            3001 => Self::NoFreeCells,
            3002 => Self::CellOccupied,
            3003 => Self::LocationNotFound,
            4001 => Self::InvalidToken,
            4002 => Self::TokenExpired,
            4003 => Self::TokenAlreadyUsed,
            4004 => Self::OrderExpired,
            4005 => Self::CellReleased,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
