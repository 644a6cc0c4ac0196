//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::ItemNotFound
            | Self::LocationNotFound
            | Self::InvalidToken => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::InvalidOrderStatus
            | Self::CellOccupied
            | Self::NoFreeCells => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleRequired => StatusCode::FORBIDDEN,

            // 500 Internal Server Error
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_status() {
        assert_eq!(
            ErrorCode::OrderNotFound.http_status(),
            StatusCode::NOT_FOUND
        );
        // A credential nobody issued is indistinguishable from a missing resource
        assert_eq!(ErrorCode::InvalidToken.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::InvalidOrderStatus.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ErrorCode::CellOccupied.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::NoFreeCells.http_status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_pickup_rejections_are_bad_request() {
        assert_eq!(ErrorCode::OrderExpired.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::CellReleased.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::TokenAlreadyUsed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::TokenExpired.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_status() {
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
