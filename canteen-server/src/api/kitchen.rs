//! Kitchen API handlers: queue, prep marker, readiness, reissue

use super::AuthPrincipal;
use crate::core::ServerState;
use crate::orders::ReadyInfo;
use crate::utils::ApiResult;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use shared::models::{Capability, Order};

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/kitchen", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/queue", get(queue))
        .route("/orders/{id}/start", post(start))
        .route("/orders/{id}/ready", post(ready))
        .route("/orders/{id}/reissue", post(reissue))
}

/// In-progress orders, earliest pickup first
async fn queue(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Vec<Order>>> {
    principal.require(Capability::ViewKitchenQueue)?;
    Ok(Json(state.manager.kitchen_queue()?))
}

/// Mark prep as started (PAID -> IN_KITCHEN)
async fn start(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Order>> {
    principal.require(Capability::MarkReady)?;
    Ok(Json(state.manager.mark_in_kitchen(&id)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadyRequest {
    /// Specific cell to use; any free cell when absent
    pub cell_code: Option<String>,
}

/// Assign a locker cell, issue the pickup credential, -> READY
async fn ready(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<String>,
    payload: Option<Json<MarkReadyRequest>>,
) -> ApiResult<Json<ReadyInfo>> {
    principal.require(Capability::MarkReady)?;
    let preferred = payload.as_ref().and_then(|p| p.cell_code.as_deref());
    let info = state.manager.mark_ready(&id, preferred, Utc::now())?;
    Ok(Json(info))
}

/// Issue a fresh token+PIN without touching the cell hold
async fn reissue(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<ReadyInfo>> {
    principal.require(Capability::ReissueCredential)?;
    Ok(Json(state.manager.reissue_credential(&id, Utc::now())?))
}
