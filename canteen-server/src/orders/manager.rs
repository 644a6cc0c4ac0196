//! OrderManager - the order state machine
//!
//! Owns every transition an order can make and enforces the legal ones:
//!
//! - `create_order`: availability check + price snapshot, all-or-nothing
//! - `confirm_payment`: CREATED -> PAID, writes the receipt snapshot
//! - `mark_in_kitchen`: PAID ⇄ IN_KITCHEN prep marker
//! - `mark_ready`: locker assignment + credential issue, -> READY
//! - `claim_pickup`: the one-shot claim protocol, -> PICKED_UP
//! - lazy expiry on every read path, -> EXPIRED
//!
//! Every mutation runs inside a single redb write transaction; redb admits
//! one writer at a time, so transitions on the same order (and cell
//! assignments at the same site) are serialized by construction. Events
//! are broadcast only after a successful commit.

use crate::catalog;
use crate::core::PickupPolicy;
use crate::lockers;
use crate::pickup::{self, ClaimOutcome, ClaimRequest, ClaimSuccess};
use crate::store::{CanteenStore, StorageError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    MealSlot, Order, OrderLine, OrderStatus, PickupCredential, Principal, Receipt, Reservation,
};
use tokio::sync::broadcast;

use super::{OrderEvent, OrderEventKind};

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// scheduled_for defaults to one hour out...
const DEFAULT_SCHEDULE_LEAD: i64 = 1;
/// ...and may not be more than three hours out
const MAX_SCHEDULE_LEAD: i64 = 3;

/// One requested line at order creation
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub menu_item_id: String,
    pub qty: u32,
    pub comment: Option<String>,
}

/// Order creation request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub site_id: String,
    pub lines: Vec<OrderLineInput>,
    /// Defaults to now + 1h; must not exceed now + 3h
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Defaults to lunch
    pub meal_slot: Option<MealSlot>,
}

/// Everything the kitchen gets back from mark_ready / reissue
#[derive(Debug, Clone, Serialize)]
pub struct ReadyInfo {
    pub order_id: String,
    pub cell_code: String,
    pub token: String,
    pub pin: String,
    pub token_expires_at: DateTime<Utc>,
    pub pickup_deadline_at: DateTime<Utc>,
}

impl ReadyInfo {
    fn new(order_id: &str, reservation: &Reservation, credential: &PickupCredential) -> Self {
        Self {
            order_id: order_id.to_string(),
            cell_code: reservation.cell_code.clone(),
            token: credential.token.clone(),
            pin: credential.pin.clone(),
            token_expires_at: credential.expires_at,
            pickup_deadline_at: reservation.hold_until,
        }
    }
}

/// Pickup block of an order view, present while the order is READY
#[derive(Debug, Clone, Serialize)]
pub struct PickupInfo {
    pub cell_code: String,
    pub token: String,
    pub pin: String,
    pub token_expires_at: DateTime<Utc>,
    pub pickup_deadline_at: DateTime<Utc>,
    pub token_valid: bool,
}

/// Order plus its payment/pickup context
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<Receipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup: Option<PickupInfo>,
}

/// Order state machine over the durable store
#[derive(Clone)]
pub struct OrderManager {
    store: CanteenStore,
    event_tx: broadcast::Sender<OrderEvent>,
    policy: PickupPolicy,
}

impl OrderManager {
    pub fn new(store: CanteenStore, policy: PickupPolicy) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            event_tx,
            policy,
        }
    }

    /// Subscribe to post-commit status events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying store
    pub fn store(&self) -> &CanteenStore {
        &self.store
    }

    fn broadcast(&self, order_id: &str, kind: OrderEventKind) {
        let event = OrderEvent {
            order_id: order_id.to_string(),
            kind,
            timestamp: shared::util::now_millis(),
        };
        if self.event_tx.send(event).is_err() {
            tracing::debug!("Event broadcast skipped: no active receivers");
        }
    }

    // ========== Creation ==========

    /// Create an order for the acting principal
    ///
    /// Every line is checked against the daily menu at the site for the
    /// resolved date and meal slot; prices are snapshotted from the current
    /// catalog. Any failing line aborts the whole order - nothing is
    /// partially created and no stock is taken.
    pub fn create_order(
        &self,
        principal: &Principal,
        input: CreateOrderInput,
        now: DateTime<Utc>,
    ) -> AppResult<Order> {
        if input.lines.is_empty() {
            return Err(AppError::validation("order must contain at least one line"));
        }
        if input.lines.iter().any(|line| line.qty == 0) {
            return Err(AppError::validation("qty must be at least 1").with_detail("field", "qty"));
        }

        let scheduled_for = input
            .scheduled_for
            .unwrap_or_else(|| now + Duration::hours(DEFAULT_SCHEDULE_LEAD));
        if scheduled_for > now + Duration::hours(MAX_SCHEDULE_LEAD) {
            return Err(AppError::with_message(
                ErrorCode::ScheduledTimeInvalid,
                format!(
                    "scheduled_for must be within {} hours",
                    MAX_SCHEDULE_LEAD
                ),
            ));
        }

        let slot = input.meal_slot.unwrap_or_default();
        let menu_date = scheduled_for.date_naive();

        let txn = self.store.begin_write()?;
        let site = self
            .store
            .get_site_txn(&txn, &input.site_id)?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::LocationNotFound,
                    format!("site {} not found", input.site_id),
                )
            })?;

        let mut lines = Vec::with_capacity(input.lines.len());
        let mut total: i64 = 0;
        for request in &input.lines {
            let item = catalog::reserve_line(
                &self.store,
                &txn,
                &site.id,
                menu_date,
                slot,
                &request.menu_item_id,
                request.qty,
            )?;
            let line = OrderLine {
                menu_item_id: item.id,
                name: item.name,
                qty: request.qty,
                unit_price: item.base_price,
                comment: request.comment.clone(),
            };
            total += line.subtotal();
            lines.push(line);
        }

        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: principal.user_id.clone(),
            site_id: site.id,
            status: OrderStatus::Created,
            scheduled_for,
            total,
            pickup_deadline_at: None,
            created_at: now,
            ready_at: None,
            picked_up_at: None,
            lines,
        };
        self.store.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        self.broadcast(&order.id, OrderEventKind::Created);
        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            total = order.total,
            "Order created"
        );
        Ok(order)
    }

    // ========== Payment ==========

    /// Confirm payment (trusted external collaborator says it succeeded)
    ///
    /// Never idempotent: a second confirmation for the same order fails
    /// loudly so a double payment can never be silently swallowed.
    pub fn confirm_payment(&self, order_id: &str, now: DateTime<Utc>) -> AppResult<Receipt> {
        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        if order.status != OrderStatus::Created {
            return Err(AppError::invalid_order_status(format!(
                "payment requires status CREATED, order is {:?}",
                order.status
            )));
        }

        order.status = OrderStatus::Paid;
        let receipt = Receipt::from_order(&order, now);
        self.store.put_order(&txn, &order)?;
        self.store.put_receipt(&txn, &receipt)?;
        txn.commit().map_err(StorageError::from)?;

        self.broadcast(order_id, OrderEventKind::Paid);
        tracing::info!(order_id = %order_id, total = receipt.total, "Payment confirmed");
        Ok(receipt)
    }

    // ========== Kitchen ==========

    /// Optional prep-in-progress marker; downstream treats PAID and
    /// IN_KITCHEN identically
    pub fn mark_in_kitchen(&self, order_id: &str) -> AppResult<Order> {
        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        if !order.status.is_in_progress() {
            return Err(AppError::invalid_order_status(format!(
                "kitchen start requires PAID or IN_KITCHEN, order is {:?}",
                order.status
            )));
        }
        order.status = OrderStatus::InKitchen;
        self.store.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        self.broadcast(order_id, OrderEventKind::InKitchen);
        Ok(order)
    }

    /// Kitchen queue: in-progress orders, earliest pickup first
    pub fn kitchen_queue(&self) -> AppResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .store
            .list_orders()?
            .into_iter()
            .filter(|order| order.status.is_in_progress())
            .collect();
        orders.sort_by_key(|order| order.scheduled_for);
        Ok(orders)
    }

    /// Mark an order ready: assign a cell, issue a credential, -> READY
    ///
    /// Idempotent on repeat: an order that is already READY with an active
    /// hold returns its existing assignment, reissuing the credential only
    /// if the live one has expired.
    pub fn mark_ready(
        &self,
        order_id: &str,
        preferred_cell_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<ReadyInfo> {
        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        if order.status == OrderStatus::Ready {
            return self.existing_assignment(txn, order, now);
        }
        if !order.status.is_in_progress() {
            return Err(AppError::invalid_order_status(format!(
                "mark ready requires PAID or IN_KITCHEN, order is {:?}",
                order.status
            )));
        }

        let site = self.store.get_site_txn(&txn, &order.site_id)?.ok_or_else(|| {
            AppError::with_message(
                ErrorCode::LocationNotFound,
                format!("site {} not found", order.site_id),
            )
        })?;

        let reservation = lockers::assign(
            &self.store,
            &txn,
            &site,
            &order.id,
            preferred_cell_code,
            now,
            &self.policy,
        )?;
        let credential = pickup::issue(&self.store, &txn, &order.id, now, &self.policy)?;

        order.status = OrderStatus::Ready;
        order.ready_at = Some(now);
        order.pickup_deadline_at = Some(reservation.hold_until);
        self.store.put_order(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        self.broadcast(order_id, OrderEventKind::Ready);
        tracing::info!(
            order_id = %order_id,
            cell_code = %reservation.cell_code,
            pickup_deadline_at = %reservation.hold_until,
            "Order ready for pickup"
        );
        Ok(ReadyInfo::new(order_id, &reservation, &credential))
    }

    /// Repeat mark_ready on an already-READY order
    fn existing_assignment(
        &self,
        txn: redb::WriteTransaction,
        mut order: Order,
        now: DateTime<Utc>,
    ) -> AppResult<ReadyInfo> {
        let reservation = self
            .store
            .reservation_for_order_txn(&txn, &order.id)?
            .ok_or_else(|| AppError::internal("READY order has no reservation"))?;

        if reservation.is_active() && reservation.is_overdue(now) {
            let order_id = order.id.clone();
            order.status = OrderStatus::Expired;
            self.store.put_order(&txn, &order)?;
            lockers::release(&self.store, &txn, &reservation.id, now)?;
            txn.commit().map_err(StorageError::from)?;
            self.broadcast(&order_id, OrderEventKind::Expired);
            return Err(AppError::invalid_order_status(
                "hold deadline passed, order expired",
            ));
        }
        if !reservation.is_active() {
            return Err(AppError::invalid_order_status(
                "reservation was already released",
            ));
        }

        let live = self
            .store
            .credentials_for_order_txn(&txn, &order.id)?
            .into_iter()
            .find(|credential| credential.is_unused() && !credential.is_expired(now));
        let credential = match live {
            Some(credential) => credential,
            None => pickup::issue(&self.store, &txn, &order.id, now, &self.policy)?,
        };
        txn.commit().map_err(StorageError::from)?;
        Ok(ReadyInfo::new(&order.id, &reservation, &credential))
    }

    /// Issue a fresh token+PIN for a READY order, keeping its cell hold
    ///
    /// The previous credential is invalidated; the kitchen uses this when
    /// pickup proof must be regenerated without losing the locker slot.
    pub fn reissue_credential(&self, order_id: &str, now: DateTime<Utc>) -> AppResult<ReadyInfo> {
        let txn = self.store.begin_write()?;
        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;

        if order.status != OrderStatus::Ready {
            return Err(AppError::invalid_order_status(format!(
                "reissue requires READY, order is {:?}",
                order.status
            )));
        }
        let reservation = self
            .store
            .reservation_for_order_txn(&txn, order_id)?
            .ok_or_else(|| AppError::internal("READY order has no reservation"))?;

        if reservation.is_active() && reservation.is_overdue(now) {
            order.status = OrderStatus::Expired;
            self.store.put_order(&txn, &order)?;
            lockers::release(&self.store, &txn, &reservation.id, now)?;
            txn.commit().map_err(StorageError::from)?;
            self.broadcast(order_id, OrderEventKind::Expired);
            return Err(AppError::invalid_order_status(
                "hold deadline passed, order expired",
            ));
        }
        if !reservation.is_active() {
            return Err(AppError::invalid_order_status(
                "reservation was already released",
            ));
        }

        let credential = pickup::issue(&self.store, &txn, order_id, now, &self.policy)?;
        txn.commit().map_err(StorageError::from)?;
        tracing::info!(order_id = %order_id, "Pickup credential reissued");
        Ok(ReadyInfo::new(order_id, &reservation, &credential))
    }

    // ========== Reads (with lazy expiry) ==========

    /// Expire a READY order whose hold deadline has passed
    ///
    /// Every read path calls this before returning a READY order. Checks
    /// cheaply on a read transaction first, then re-checks inside the write
    /// transaction before mutating - a concurrent claim may have won in
    /// between. Returns whether this call performed the expiry.
    pub fn expire_if_overdue(&self, order_id: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let Some(order) = self.store.get_order(order_id)? else {
            return Ok(false);
        };
        if order.status != OrderStatus::Ready {
            return Ok(false);
        }
        let Some(reservation) = self.store.reservation_for_order(order_id)? else {
            return Ok(false);
        };
        if !(reservation.is_active() && reservation.is_overdue(now)) {
            return Ok(false);
        }

        let txn = self.store.begin_write()?;
        let Some(mut order) = self.store.get_order_txn(&txn, order_id)? else {
            return Ok(false);
        };
        if order.status != OrderStatus::Ready {
            return Ok(false);
        }
        let Some(reservation) = self.store.reservation_for_order_txn(&txn, order_id)? else {
            return Ok(false);
        };
        if !(reservation.is_active() && reservation.is_overdue(now)) {
            return Ok(false);
        }

        order.status = OrderStatus::Expired;
        self.store.put_order(&txn, &order)?;
        lockers::release(&self.store, &txn, &reservation.id, now)?;
        txn.commit().map_err(StorageError::from)?;

        self.broadcast(order_id, OrderEventKind::Expired);
        tracing::info!(order_id = %order_id, "Order expired unclaimed");
        Ok(true)
    }

    /// Fetch one order with its receipt and pickup context
    pub fn get_order(&self, order_id: &str, now: DateTime<Utc>) -> AppResult<OrderView> {
        self.expire_if_overdue(order_id, now)?;

        let order = self
            .store
            .get_order(order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;
        let receipt = self.store.get_receipt(order_id)?;

        let pickup = if order.status == OrderStatus::Ready {
            let reservation = self.store.reservation_for_order(order_id)?;
            let credential = self
                .store
                .credentials_for_order(order_id)?
                .into_iter()
                .find(PickupCredential::is_unused);
            match (reservation, credential) {
                (Some(reservation), Some(credential)) if reservation.is_active() => {
                    let token_valid = !credential.is_expired(now);
                    Some(PickupInfo {
                        cell_code: reservation.cell_code,
                        token: credential.token,
                        pin: credential.pin,
                        token_expires_at: credential.expires_at,
                        pickup_deadline_at: reservation.hold_until,
                        token_valid,
                    })
                }
                _ => None,
            }
        } else {
            None
        };

        Ok(OrderView {
            order,
            receipt,
            pickup,
        })
    }

    /// All orders of one user, newest first
    pub fn list_user_orders(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<Vec<Order>> {
        for order in self.store.list_user_orders(user_id)? {
            if order.status == OrderStatus::Ready {
                self.expire_if_overdue(&order.id, now)?;
            }
        }
        let mut orders = self.store.list_user_orders(user_id)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    // ========== Claim ==========

    /// Resolve a pickup claim
    ///
    /// Success (including the idempotent already-picked-up case) returns
    /// the cell code to open. A claim that discovers an expired hold
    /// commits the expiry before reporting `ORDER_EXPIRED`.
    pub fn claim_pickup(
        &self,
        request: &ClaimRequest,
        now: DateTime<Utc>,
    ) -> AppResult<ClaimSuccess> {
        let txn = self.store.begin_write()?;
        match pickup::claim(&self.store, &txn, request, now)? {
            ClaimOutcome::Claimed(success) => {
                txn.commit().map_err(StorageError::from)?;
                self.broadcast(&success.order_id, OrderEventKind::PickedUp);
                Ok(success)
            }
            ClaimOutcome::AlreadyPickedUp(success) => {
                txn.commit().map_err(StorageError::from)?;
                Ok(success)
            }
            ClaimOutcome::Expired { order_id } => {
                txn.commit().map_err(StorageError::from)?;
                self.broadcast(&order_id, OrderEventKind::Expired);
                Err(AppError::new(ErrorCode::OrderExpired))
            }
        }
    }
}

#[cfg(test)]
mod tests;
