//! Order API handlers: create, view, confirm payment

use super::AuthPrincipal;
use crate::core::ServerState;
use crate::orders::{CreateOrderInput, OrderLineInput, OrderView};
use crate::utils::ApiResult;
use axum::http::StatusCode;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{Capability, MealSlot, Order, Receipt};
use validator::Validate;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", routes())
        .route("/api/payments/confirm", post(confirm_payment))
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(create).get(list_mine))
        .route("/{id}", get(get_by_id))
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct OrderItemRequest {
    pub menu_item_id: String,
    #[validate(range(min = 1, message = "qty must be at least 1"))]
    pub qty: u32,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub site_id: String,
    #[validate(length(min = 1, message = "items required"), nested)]
    pub items: Vec<OrderItemRequest>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub meal_slot: Option<MealSlot>,
}

/// Create an order
async fn create(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    principal.require(Capability::PlaceOrder)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let input = CreateOrderInput {
        site_id: payload.site_id,
        lines: payload
            .items
            .into_iter()
            .map(|item| OrderLineInput {
                menu_item_id: item.menu_item_id,
                qty: item.qty,
                comment: item.comment,
            })
            .collect(),
        scheduled_for: payload.scheduled_for,
        meal_slot: payload.meal_slot,
    };
    let order = state.manager.create_order(&principal, input, Utc::now())?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch one order (runs the lazy-expiry check)
async fn get_by_id(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let view = state.manager.get_order(&id, Utc::now())?;
    if !principal.may_view_order_of(&view.order.user_id) {
        return Err(AppError::permission_denied("not your order").into());
    }
    Ok(Json(view))
}

/// The caller's own orders, newest first
async fn list_mine(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> ApiResult<Json<Vec<Order>>> {
    principal.require(Capability::ViewOwnOrders)?;
    let orders = state
        .manager
        .list_user_orders(&principal.user_id, Utc::now())?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub order_id: String,
}

/// Payment confirmation from the (stubbed) payment collaborator
async fn confirm_payment(
    State(state): State<ServerState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(payload): Json<ConfirmPaymentRequest>,
) -> ApiResult<Json<Receipt>> {
    principal.require(Capability::ConfirmPayment)?;
    let receipt = state.manager.confirm_payment(&payload.order_id, Utc::now())?;
    Ok(Json(receipt))
}
