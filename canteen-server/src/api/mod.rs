//! API routes
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`orders`] - order creation, payment confirmation, order views
//! - [`kitchen`] - cook queue, readiness, credential reissue
//! - [`pickup`] - the anonymous claim endpoint for pickup terminals
//! - [`menu`] - catalog items and daily menus
//! - [`admin`] - site and locker provisioning
//!
//! Identity is supplied by the upstream gateway via `x-user-id` /
//! `x-user-role` headers; [`AuthPrincipal`] extracts it and role checks
//! happen per handler through `Principal::require`.

pub mod admin;
pub mod health;
pub mod kitchen;
pub mod menu;
pub mod orders;
pub mod pickup;

use crate::core::ServerState;
use crate::utils::ApiError;
use axum::Router;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shared::models::{Principal, Role};
use tower_http::trace::TraceLayer;

/// Assemble the full application router
pub fn router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(orders::router())
        .merge(kitchen::router())
        .merge(pickup::router())
        .merge(menu::router())
        .merge(admin::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Acting principal, taken from trusted gateway headers
///
/// Authentication itself is the identity collaborator's job; by the time a
/// request reaches this service the gateway has verified the session and
/// forwards the subject as headers.
pub struct AuthPrincipal(pub Principal);

impl<S: Send + Sync> FromRequestParts<S> for AuthPrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError(shared::AppError::not_authenticated()))?
            .to_string();
        let role: Role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("user")
            .parse()
            .map_err(ApiError)?;
        Ok(AuthPrincipal(Principal::new(user_id, role)))
    }
}
