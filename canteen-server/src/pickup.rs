//! Pickup credentials and the claim protocol
//!
//! The issuer keeps at most one live credential per order: issuing a new
//! token+PIN invalidates every previously-unused credential first. The
//! claim resolver is pure decision logic over current state; its guards
//! run in a fixed order that callers and tests rely on.

use crate::core::PickupPolicy;
use crate::lockers;
use crate::store::CanteenStore;
use chrono::{DateTime, Utc};
use redb::WriteTransaction;
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{OrderStatus, PickupCredential};

/// Token length in raw bytes; hex-encoded to 64 characters (256 bits)
const TOKEN_BYTES: usize = 32;

/// Issue a fresh credential for the order
///
/// Marks every currently-unused credential for the order as used before
/// inserting the new one, so a stale QR code or PIN can never race a fresh
/// one.
pub fn issue(
    store: &CanteenStore,
    txn: &WriteTransaction,
    order_id: &str,
    now: DateTime<Utc>,
    policy: &PickupPolicy,
) -> AppResult<PickupCredential> {
    for mut stale in store.credentials_for_order_txn(txn, order_id)? {
        if stale.is_unused() {
            stale.used_at = Some(now);
            store.put_credential(txn, &stale)?;
        }
    }

    let rng = SystemRandom::new();
    let mut token_bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut token_bytes)
        .map_err(|_| AppError::internal("secure random source unavailable"))?;
    let mut pin_bytes = [0u8; 4];
    rng.fill(&mut pin_bytes)
        .map_err(|_| AppError::internal("secure random source unavailable"))?;

    let credential = PickupCredential {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        token: hex::encode(token_bytes),
        pin: format!("{:06}", u32::from_be_bytes(pin_bytes) % 1_000_000),
        issued_at: now,
        expires_at: now + policy.token_ttl(),
        used_at: None,
    };
    store.put_credential(txn, &credential)?;

    tracing::info!(
        order_id = %order_id,
        expires_at = %credential.expires_at,
        "Pickup credential issued"
    );
    Ok(credential)
}

/// How a caller identifies themselves at the pickup terminal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClaimRequest {
    /// Scanned QR payload
    Token(String),
    /// Manual fallback: order id plus the 6-digit PIN
    Pin { order_id: String, pin: String },
}

/// Successful claim payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSuccess {
    pub order_id: String,
    /// Cell for the hardware collaborator to open
    pub cell_code: String,
}

/// Resolution of a claim attempt that must be committed
///
/// `Expired` carries a state mutation (lazy expiry) even though the caller
/// ultimately receives an error, so the transaction has to commit for all
/// three variants. Rejections that mutate nothing come back as `Err` and
/// abort the transaction.
#[derive(Debug)]
pub enum ClaimOutcome {
    Claimed(ClaimSuccess),
    AlreadyPickedUp(ClaimSuccess),
    Expired { order_id: String },
}

/// Resolve a claim against current state
///
/// Guards run in this exact order; the first failing guard wins:
///
/// 1. locate credential, else `INVALID_TOKEN`
/// 2. order already picked up -> idempotent success
/// 3. hold deadline passed -> lazy expiry, `ORDER_EXPIRED`
/// 4. reservation released out-of-band -> `CELL_RELEASED`
/// 5. credential already used -> `TOKEN_ALREADY_USED`
/// 6. credential expired -> `TOKEN_EXPIRED`
/// 7. claim: credential used, order picked up, cell freed
pub fn claim(
    store: &CanteenStore,
    txn: &WriteTransaction,
    request: &ClaimRequest,
    now: DateTime<Utc>,
) -> AppResult<ClaimOutcome> {
    // 1. Locate the credential
    let mut credential = match request {
        ClaimRequest::Token(token) => store.credential_by_token_txn(txn, token)?,
        ClaimRequest::Pin { order_id, pin } => store
            .credentials_for_order_txn(txn, order_id)?
            .into_iter()
            .find(|c| c.pin == *pin),
    }
    .ok_or_else(|| AppError::new(ErrorCode::InvalidToken))?;

    let mut order = store
        .get_order_txn(txn, &credential.order_id)?
        .ok_or_else(|| AppError::order_not_found(credential.order_id.clone()))?;
    let reservation = store.reservation_for_order_txn(txn, &order.id)?;

    // 2. Duplicate scans of a completed pickup are harmless
    if order.status == OrderStatus::PickedUp {
        let cell_code = reservation
            .map(|r| r.cell_code)
            .unwrap_or_else(|| "N/A".to_string());
        return Ok(ClaimOutcome::AlreadyPickedUp(ClaimSuccess {
            order_id: order.id,
            cell_code,
        }));
    }

    // 3. Hold deadline breached: expiry is discovered here, not by a timer
    if let Some(reservation) = &reservation
        && reservation.is_overdue(now)
    {
        if order.status != OrderStatus::Expired {
            order.status = OrderStatus::Expired;
            store.put_order(txn, &order)?;
            lockers::release(store, txn, &reservation.id, now)?;
            tracing::info!(order_id = %order.id, "Order expired on claim attempt");
        }
        return Ok(ClaimOutcome::Expired { order_id: order.id });
    }

    // 4. Stale credential after an out-of-band release
    if let Some(reservation) = &reservation
        && !reservation.is_active()
    {
        return Err(AppError::new(ErrorCode::CellReleased));
    }

    // 5. Consumed or superseded credential
    if credential.used_at.is_some() {
        return Err(AppError::new(ErrorCode::TokenAlreadyUsed));
    }

    // 6. Credential validity window passed
    if credential.is_expired(now) {
        return Err(AppError::new(ErrorCode::TokenExpired));
    }

    // 7. All guards passed: one-shot claim
    credential.used_at = Some(now);
    store.put_credential(txn, &credential)?;

    order.status = OrderStatus::PickedUp;
    order.picked_up_at = Some(now);
    store.put_order(txn, &order)?;

    let cell_code = match reservation {
        Some(reservation) => {
            lockers::release(store, txn, &reservation.id, now)?;
            reservation.cell_code
        }
        None => "N/A".to_string(),
    };

    tracing::info!(order_id = %order.id, cell_code = %cell_code, "Order picked up");
    Ok(ClaimOutcome::Claimed(ClaimSuccess {
        order_id: order.id,
        cell_code,
    }))
}
