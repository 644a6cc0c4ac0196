//! Order lifecycle module
//!
//! - **manager**: [`OrderManager`], the state machine owning every order
//!   transition (create, pay, kitchen, ready, claim, expire)
//!
//! # Status Flow
//!
//! ```text
//! CREATED ──pay──▶ PAID ⇄ IN_KITCHEN ──ready──▶ READY ──claim──▶ PICKED_UP
//!                                                  │
//!                                                  └─hold expired─▶ EXPIRED
//! ```
//!
//! Expiry is discovered lazily on the next read or claim; there is no
//! background timer anywhere.

pub mod manager;

pub use manager::{
    CreateOrderInput, OrderLineInput, OrderManager, OrderView, PickupInfo, ReadyInfo,
};

use serde::Serialize;

/// Status-transition event broadcast to subscribers (kitchen displays,
/// pickup terminals)
#[derive(Debug, Clone, Serialize)]
pub struct OrderEvent {
    pub order_id: String,
    pub kind: OrderEventKind,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventKind {
    Created,
    Paid,
    InKitchen,
    Ready,
    PickedUp,
    Expired,
}
