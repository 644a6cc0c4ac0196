//! Menu API handlers: catalog items and daily menus

use super::AuthPrincipal;
use crate::core::ServerState;
use crate::utils::ApiResult;
use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::error::AppError;
use shared::models::{Capability, DailyMenu, DailyMenuEntry, MealSlot, MenuItem};

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/menu/items", get(list_items).post(create_item))
        .route("/api/daily-menu", get(get_daily_menu).put(put_daily_menu))
}

/// Browse the catalog
async fn list_items(
    State(state): State<ServerState>,
    AuthPrincipal(_principal): AuthPrincipal,
) -> ApiResult<Json<Vec<MenuItem>>> {
    let items = state.catalog.list_menu_items().map_err(AppError::from)?;
    Ok(Json(items))
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub category: String,
    pub base_price: i64,
}

/// Add a catalog item
async fn create_item(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<CreateMenuItemRequest>,
) -> ApiResult<(StatusCode, Json<MenuItem>)> {
    principal.require(Capability::ManageMenu)?;
    if payload.base_price <= 0 {
        return Err(AppError::validation("base_price must be positive").into());
    }
    let item = MenuItem {
        id: uuid::Uuid::new_v4().to_string(),
        name: payload.name,
        category: payload.category,
        base_price: payload.base_price,
    };
    state.catalog.upsert_menu_item(&item).map_err(AppError::from)?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize)]
pub struct DailyMenuQuery {
    pub site_id: String,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub meal_slot: MealSlot,
}

/// Fetch the daily menu for (site, date, slot)
async fn get_daily_menu(
    State(state): State<ServerState>,
    AuthPrincipal(_principal): AuthPrincipal,
    Query(query): Query<DailyMenuQuery>,
) -> ApiResult<Json<Option<DailyMenu>>> {
    let date = query
        .date
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    let menu = state
        .catalog
        .get_daily_menu(&query.site_id, date, query.meal_slot)
        .map_err(AppError::from)?;
    Ok(Json(menu))
}

#[derive(Debug, Deserialize)]
pub struct PutDailyMenuRequest {
    pub site_id: String,
    pub menu_date: NaiveDate,
    #[serde(default)]
    pub meal_slot: MealSlot,
    pub items: Vec<DailyMenuEntry>,
}

/// Replace the daily menu entry set for (site, date, slot)
async fn put_daily_menu(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<PutDailyMenuRequest>,
) -> ApiResult<Json<DailyMenu>> {
    principal.require(Capability::ManageMenu)?;
    let menu = DailyMenu {
        site_id: payload.site_id,
        menu_date: payload.menu_date,
        meal_slot: payload.meal_slot,
        entries: payload.items,
    };
    state.catalog.put_daily_menu(&menu)?;
    Ok(Json(menu))
}
