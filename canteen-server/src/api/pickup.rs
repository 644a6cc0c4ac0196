//! Pickup terminal API: the claim endpoint
//!
//! No principal here - pickup terminals are anonymous; the credential IS
//! the authorization.

use crate::core::ServerState;
use crate::pickup::{ClaimRequest, ClaimSuccess};
use crate::utils::ApiResult;
use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use serde::Deserialize;
use shared::error::AppError;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/pickup/claim", post(claim))
}

#[derive(Debug, Deserialize)]
pub struct ClaimPickupRequest {
    /// Scanned QR payload
    pub token: Option<String>,
    /// Manual fallback, paired with `pin`
    pub order_id: Option<String>,
    pub pin: Option<String>,
}

impl ClaimPickupRequest {
    fn into_claim(self) -> Result<ClaimRequest, AppError> {
        match (self.token, self.order_id, self.pin) {
            (Some(token), _, _) => Ok(ClaimRequest::Token(token)),
            (None, Some(order_id), Some(pin)) => Ok(ClaimRequest::Pin { order_id, pin }),
            _ => Err(AppError::invalid_request(
                "either token or (order_id + pin) is required",
            )),
        }
    }
}

/// Claim an order: validates the credential and opens the cell
async fn claim(
    State(state): State<ServerState>,
    Json(payload): Json<ClaimPickupRequest>,
) -> ApiResult<Json<ClaimSuccess>> {
    let request = payload.into_claim()?;
    let success = state.manager.claim_pickup(&request, Utc::now())?;
    Ok(Json(success))
}
