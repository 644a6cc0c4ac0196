//! Lazy expiry and hold-deadline tests
//!
//! There is no reaper anywhere: a breached hold is discovered by whichever
//! read or claim touches the order next, and that access must leave the
//! order EXPIRED with its cell back in the pool.

use super::*;
use chrono::NaiveTime;
use shared::models::CellStatus;

#[test]
fn test_get_order_discovers_expiry() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (order, info) = create_ready_order(&manager);

    let view = manager.get_order(&order.id, t0() + minutes(61)).unwrap();
    assert_eq!(view.order.status, OrderStatus::Expired);
    assert!(view.pickup.is_none());
    assert_eq!(cell_status(&manager, &info.cell_code), CellStatus::Free);

    let reservation = manager
        .store()
        .reservation_for_order(&order.id)
        .unwrap()
        .unwrap();
    assert!(reservation.released_at.is_some());
}

#[test]
fn test_get_order_within_hold_stays_ready() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (order, info) = create_ready_order(&manager);

    // 59 minutes in: hold active, token window long gone
    let view = manager.get_order(&order.id, t0() + minutes(59)).unwrap();
    assert_eq!(view.order.status, OrderStatus::Ready);
    let pickup = view.pickup.unwrap();
    assert_eq!(pickup.cell_code, info.cell_code);
    assert_eq!(pickup.pickup_deadline_at, t0() + minutes(60));
    assert!(!pickup.token_valid);

    // Right at the deadline the hold is still honored
    let view = manager.get_order(&order.id, t0() + minutes(60)).unwrap();
    assert_eq!(view.order.status, OrderStatus::Ready);
}

#[test]
fn test_get_order_view_contains_receipt_and_pickup() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (order, info) = create_ready_order(&manager);

    let view = manager.get_order(&order.id, t0() + minutes(5)).unwrap();
    assert_eq!(view.receipt.as_ref().unwrap().total, 1100);
    let pickup = view.pickup.unwrap();
    assert_eq!(pickup.token, info.token);
    assert_eq!(pickup.pin, info.pin);
    assert!(pickup.token_valid);
}

#[test]
fn test_list_user_orders_discovers_expiry() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (expired, _) = create_ready_order(&manager);
    let untouched = create_order(&manager);

    let orders = manager.list_user_orders("u-1", t0() + minutes(61)).unwrap();
    assert_eq!(orders.len(), 2);
    let by_id = |id: &str| orders.iter().find(|o| o.id == id).unwrap();
    assert_eq!(by_id(&expired.id).status, OrderStatus::Expired);
    assert_eq!(by_id(&untouched.id).status, OrderStatus::Created);
}

#[test]
fn test_expiry_is_one_shot() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (order, _) = create_ready_order(&manager);

    assert!(manager.expire_if_overdue(&order.id, t0() + minutes(61)).unwrap());
    // Already expired: the second discovery is a no-op
    assert!(!manager.expire_if_overdue(&order.id, t0() + minutes(62)).unwrap());
}

#[test]
fn test_expire_needs_breached_active_hold() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    // CREATED order: nothing to expire
    let order = create_order(&manager);
    assert!(!manager.expire_if_overdue(&order.id, t0() + minutes(61)).unwrap());

    // READY order within its hold: nothing to expire
    let (ready, _) = create_ready_order(&manager);
    assert!(!manager.expire_if_overdue(&ready.id, t0() + minutes(30)).unwrap());
    assert_eq!(
        manager.store().get_order(&ready.id).unwrap().unwrap().status,
        OrderStatus::Ready
    );
}

#[test]
fn test_hold_capped_by_closing_time() {
    let manager = create_test_manager();
    // Site closes 30 minutes after t0 (09:30)
    seed_site_closing_at(&manager, 10, NaiveTime::from_hms_opt(9, 30, 0).unwrap());

    let (_, info) = create_ready_order(&manager);
    // closing (09:30) + 15m grace, instead of t0 + 60m
    assert_eq!(info.pickup_deadline_at, t0() + minutes(45));
}

#[test]
fn test_hold_uncapped_when_closing_is_far() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let (_, info) = create_ready_order(&manager);
    assert_eq!(info.pickup_deadline_at, t0() + minutes(60));
}

#[test]
fn test_release_is_idempotent() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (order, info) = create_ready_order(&manager);
    let reservation = manager
        .store()
        .reservation_for_order(&order.id)
        .unwrap()
        .unwrap();

    let txn = manager.store().begin_write().unwrap();
    assert!(crate::lockers::release(manager.store(), &txn, &reservation.id, t0()).unwrap());
    assert!(!crate::lockers::release(manager.store(), &txn, &reservation.id, t0()).unwrap());
    txn.commit().unwrap();

    assert_eq!(cell_status(&manager, &info.cell_code), CellStatus::Free);
    let released = manager
        .store()
        .reservation_for_order(&order.id)
        .unwrap()
        .unwrap();
    assert_eq!(released.released_at, Some(t0()));
}

#[test]
fn test_mark_ready_on_expired_hold_expires_the_order() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (order, info) = create_ready_order(&manager);

    let err = manager
        .mark_ready(&order.id, None, t0() + minutes(61))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);
    assert_eq!(
        manager.store().get_order(&order.id).unwrap().unwrap().status,
        OrderStatus::Expired
    );
    assert_eq!(cell_status(&manager, &info.cell_code), CellStatus::Free);
}

#[test]
fn test_reissue_on_expired_hold_expires_the_order() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let (order, info) = create_ready_order(&manager);

    let err = manager
        .reissue_credential(&order.id, t0() + minutes(61))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);
    assert_eq!(
        manager.store().get_order(&order.id).unwrap().unwrap().status,
        OrderStatus::Expired
    );
    assert_eq!(cell_status(&manager, &info.cell_code), CellStatus::Free);
}

#[test]
fn test_reissue_requires_ready() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let order = create_paid_order(&manager);

    let err = manager.reissue_credential(&order.id, t0()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);
}
