//! Locker pool - exclusive, race-free assignment of free cells
//!
//! Assignment flips a cell FREE -> OCCUPIED and creates the reservation in
//! the same write transaction. redb's single-writer model means two
//! concurrent assignments for the same site are serialized; the loser
//! re-reads the cell as no longer free and picks another or fails.

use crate::core::PickupPolicy;
use crate::store::{CanteenStore, StorageResult};
use chrono::{DateTime, Utc};
use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{CellStatus, LockerCell, Reservation, Site};

/// Compute the hold deadline for a new reservation
///
/// `now + hold`, capped at the site's closing time plus a short grace
/// window when closing comes first.
pub fn hold_until(site: &Site, now: DateTime<Utc>, policy: &PickupPolicy) -> DateTime<Utc> {
    let deadline = now + policy.hold();
    let closing = now.date_naive().and_time(site.closing_time).and_utc();
    if closing < deadline {
        closing + policy.grace()
    } else {
        deadline
    }
}

/// Sort key implementing the lowest-code-first policy: "A2" before "A10"
fn code_sort_key(code: &str) -> (String, u32) {
    let digits_at = code
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(code.len());
    let (prefix, digits) = code.split_at(digits_at);
    (prefix.to_string(), digits.parse().unwrap_or(0))
}

/// Assign a free cell at the site to the given order
///
/// With `preferred_code` the specific cell must be free; without, the free
/// cell with the lowest code wins. The status flip and the reservation
/// insert are one atomic unit within `txn`.
pub fn assign(
    store: &CanteenStore,
    txn: &WriteTransaction,
    site: &Site,
    order_id: &str,
    preferred_code: Option<&str>,
    now: DateTime<Utc>,
    policy: &PickupPolicy,
) -> AppResult<Reservation> {
    let mut cell = match preferred_code {
        Some(code) => {
            let cell = store.get_cell_txn(txn, &site.id, code)?.ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::NoFreeCells,
                    format!("cell {} does not exist at site {}", code, site.id),
                )
            })?;
            if !cell.is_free() {
                return Err(AppError::with_message(
                    ErrorCode::CellOccupied,
                    format!("cell {} is not free", code),
                )
                .with_detail("cell_code", code));
            }
            cell
        }
        None => {
            let mut free = store.free_cells_txn(txn, &site.id)?;
            free.sort_by_key(|cell| code_sort_key(&cell.code));
            free.into_iter()
                .next()
                .ok_or_else(|| AppError::new(ErrorCode::NoFreeCells))?
        }
    };

    cell.status = CellStatus::Occupied;
    store.put_cell(txn, &cell)?;

    let reservation = Reservation {
        id: uuid::Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        site_id: site.id.clone(),
        cell_code: cell.code.clone(),
        hold_until: hold_until(site, now, policy),
        created_at: now,
        released_at: None,
    };
    store.put_reservation(txn, &reservation)?;

    tracing::info!(
        order_id = %order_id,
        cell_code = %reservation.cell_code,
        hold_until = %reservation.hold_until,
        "Cell assigned"
    );
    Ok(reservation)
}

/// Release a reservation and return its cell to FREE
///
/// Idempotent: releasing an already-released reservation is a no-op.
/// Returns whether this call performed the release.
pub fn release(
    store: &CanteenStore,
    txn: &WriteTransaction,
    reservation_id: &str,
    now: DateTime<Utc>,
) -> StorageResult<bool> {
    let Some(mut reservation) = store.get_reservation_txn(txn, reservation_id)? else {
        return Ok(false);
    };
    if reservation.released_at.is_some() {
        return Ok(false);
    }

    reservation.released_at = Some(now);
    store.put_reservation(txn, &reservation)?;

    if let Some(mut cell) =
        store.get_cell_txn(txn, &reservation.site_id, &reservation.cell_code)?
    {
        cell.status = CellStatus::Free;
        store.put_cell(txn, &cell)?;
    }

    tracing::info!(
        order_id = %reservation.order_id,
        cell_code = %reservation.cell_code,
        "Cell released"
    );
    Ok(true)
}

/// Create a site together with its cell bank ("A1".."An")
pub fn provision_site(
    store: &CanteenStore,
    site: &Site,
    cell_count: u32,
) -> StorageResult<Vec<LockerCell>> {
    let txn = store.begin_write()?;
    store.put_site(&txn, site)?;
    let mut cells = Vec::with_capacity(cell_count as usize);
    for n in 1..=cell_count {
        let cell = LockerCell {
            site_id: site.id.clone(),
            code: format!("A{}", n),
            status: CellStatus::Free,
        };
        store.put_cell(&txn, &cell)?;
        cells.push(cell);
    }
    txn.commit()?;
    tracing::info!(site_id = %site.id, cells = cell_count, "Site provisioned");
    Ok(cells)
}
