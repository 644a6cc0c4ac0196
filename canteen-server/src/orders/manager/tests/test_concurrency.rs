//! Concurrency properties
//!
//! The store admits one writer at a time, so these races resolve cleanly:
//! exactly one winner per cell, one-shot claims, no double-assignment.
//! The threads here hammer the same manager through `Arc` clones exactly
//! like concurrent HTTP handlers would.

use super::*;
use shared::models::CellStatus;
use std::sync::Arc;
use std::thread;

#[test]
fn test_concurrent_mark_ready_for_last_cell() {
    let manager = Arc::new(create_test_manager());
    seed_site(&manager, 1);

    let first = create_paid_order(&manager);
    let second = create_paid_order(&manager);

    let results: Vec<_> = thread::scope(|scope| {
        [&first, &second]
            .map(|order| {
                let manager = Arc::clone(&manager);
                let order_id = order.id.clone();
                scope.spawn(move || manager.mark_ready(&order_id, None, t0()))
            })
            .map(|handle| handle.join().unwrap())
            .into_iter()
            .collect()
    });

    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one order may win the last cell");
    let losers: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
    assert_eq!(losers.len(), 1);
    assert_eq!(losers[0].code, ErrorCode::NoFreeCells);
}

#[test]
fn test_concurrent_preferred_cell_race() {
    let manager = Arc::new(create_test_manager());
    seed_site(&manager, 2);

    let first = create_paid_order(&manager);
    let second = create_paid_order(&manager);

    let results: Vec<_> = thread::scope(|scope| {
        [&first, &second]
            .map(|order| {
                let manager = Arc::clone(&manager);
                let order_id = order.id.clone();
                scope.spawn(move || manager.mark_ready(&order_id, Some("A1"), t0()))
            })
            .map(|handle| handle.join().unwrap())
            .into_iter()
            .collect()
    });

    let winners: Vec<_> = results.iter().filter(|r| r.is_ok()).collect();
    assert_eq!(winners.len(), 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser.code, ErrorCode::CellOccupied);
}

#[test]
fn test_at_most_one_active_reservation_per_cell() {
    let manager = Arc::new(create_test_manager());
    seed_site(&manager, 2);

    let orders: Vec<_> = (0..4).map(|_| create_paid_order(&manager)).collect();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = orders
            .iter()
            .map(|order| {
                let manager = Arc::clone(&manager);
                let order_id = order.id.clone();
                scope.spawn(move || manager.mark_ready(&order_id, None, t0()))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut assigned_cells: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|info| info.cell_code.clone())
        .collect();
    assigned_cells.sort();
    assert_eq!(assigned_cells, vec!["A1".to_string(), "A2".to_string()]);
    assert_eq!(
        results.iter().filter(|r| r.is_err()).count(),
        2,
        "two orders must lose with no cells left"
    );

    // Each assigned order holds its own active reservation on its own cell
    let mut active_cells = Vec::new();
    for order in &orders {
        if let Some(reservation) = manager.store().reservation_for_order(&order.id).unwrap()
            && reservation.is_active()
        {
            active_cells.push(reservation.cell_code);
        }
    }
    active_cells.sort();
    assert_eq!(active_cells, vec!["A1".to_string(), "A2".to_string()]);
}

#[test]
fn test_concurrent_claims_are_one_shot() {
    let manager = Arc::new(create_test_manager());
    seed_site(&manager, 3);
    let (order, info) = create_ready_order(&manager);

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let token = info.token.clone();
                scope.spawn(move || {
                    manager.claim_pickup(&ClaimRequest::Token(token), t0() + minutes(5))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    // Every attempt succeeds (idempotent claim), all with the same cell
    for result in &results {
        let success = result.as_ref().unwrap();
        assert_eq!(success.cell_code, info.cell_code);
        assert_eq!(success.order_id, order.id);
    }

    // But the mutation happened exactly once
    let stored = manager.store().get_order(&order.id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::PickedUp);
    assert_eq!(stored.picked_up_at, Some(t0() + minutes(5)));
    let credentials = manager.store().credentials_for_order(&order.id).unwrap();
    assert_eq!(credentials.len(), 1);
    assert_eq!(credentials[0].used_at, Some(t0() + minutes(5)));
    assert_eq!(cell_status(&manager, &info.cell_code), CellStatus::Free);
}

#[test]
fn test_claim_races_lazy_expiry() {
    let manager = Arc::new(create_test_manager());
    seed_site(&manager, 1);
    let (order, info) = create_ready_order(&manager);

    // One terminal claims while another screen refreshes the order view,
    // both after the hold deadline
    let (claim_result, expired) = thread::scope(|scope| {
        let claimer = {
            let manager = Arc::clone(&manager);
            let token = info.token.clone();
            scope.spawn(move || {
                manager.claim_pickup(&ClaimRequest::Token(token), t0() + minutes(61))
            })
        };
        let reader = {
            let manager = Arc::clone(&manager);
            let order_id = order.id.clone();
            scope.spawn(move || manager.expire_if_overdue(&order_id, t0() + minutes(61)))
        };
        (claimer.join().unwrap(), reader.join().unwrap())
    });

    // Whoever ran first performed the expiry; both observe EXPIRED
    assert_eq!(claim_result.unwrap_err().code, ErrorCode::OrderExpired);
    let _ = expired.unwrap();
    let stored = manager.store().get_order(&order.id).unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::Expired);
    assert_eq!(cell_status(&manager, &info.cell_code), CellStatus::Free);
}
