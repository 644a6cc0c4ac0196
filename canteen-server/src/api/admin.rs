//! Admin API handlers: site and locker provisioning

use super::AuthPrincipal;
use crate::core::ServerState;
use crate::lockers;
use crate::utils::ApiResult;
use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Capability, LockerCell, Site};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/sites", post(create_site))
        .route("/api/sites/{id}/cells", get(list_cells))
}

#[derive(Debug, Deserialize)]
pub struct CreateSiteRequest {
    pub name: String,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    /// Number of locker cells to provision ("A1".."An")
    pub cells: u32,
}

#[derive(Debug, Serialize)]
pub struct CreateSiteResponse {
    #[serde(flatten)]
    pub site: Site,
    pub cells: Vec<LockerCell>,
}

/// Create a site together with its locker cell bank
async fn create_site(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<CreateSiteRequest>,
) -> ApiResult<(StatusCode, Json<CreateSiteResponse>)> {
    principal.require(Capability::ManageSites)?;
    let site = Site {
        id: uuid::Uuid::new_v4().to_string(),
        name: payload.name,
        opening_time: payload.opening_time,
        closing_time: payload.closing_time,
        is_closed_manual: false,
    };
    let cells =
        lockers::provision_site(&state.store, &site, payload.cells).map_err(AppError::from)?;
    Ok((StatusCode::CREATED, Json(CreateSiteResponse { site, cells })))
}

/// Locker cells of a site with their current status
async fn list_cells(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<LockerCell>>> {
    principal.require(Capability::ViewKitchenQueue)?;
    let mut cells = state.store.list_cells(&id).map_err(AppError::from)?;
    cells.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(Json(cells))
}
