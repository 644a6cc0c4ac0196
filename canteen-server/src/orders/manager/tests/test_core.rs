use super::*;
use shared::models::MenuItem;

#[test]
fn test_create_order_totals_and_snapshots() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let order = manager
        .create_order(
            &user(),
            order_input(vec![line("itm-soup", 2), line("itm-main", 1)]),
            t0(),
        )
        .unwrap();

    assert_eq!(order.status, OrderStatus::Created);
    assert_eq!(order.total, 2 * 450 + 650);
    assert_eq!(order.total, order.line_total());
    assert_eq!(order.lines.len(), 2);
    assert_eq!(order.lines[0].name, "Borscht");
    assert_eq!(order.lines[0].unit_price, 450);
    assert_eq!(order.user_id, "u-1");

    // Persisted, not just returned
    let stored = manager.store().get_order(&order.id).unwrap().unwrap();
    assert_eq!(stored.total, order.total);
}

#[test]
fn test_price_snapshot_survives_catalog_change() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let order = create_order(&manager);

    // Catalog price doubles after the order was placed
    let catalog = CatalogService::new(manager.store().clone());
    catalog
        .upsert_menu_item(&MenuItem {
            id: "itm-soup".to_string(),
            name: "Borscht".to_string(),
            category: "first".to_string(),
            base_price: 900,
        })
        .unwrap();

    let stored = manager.store().get_order(&order.id).unwrap().unwrap();
    assert_eq!(stored.lines[0].unit_price, 450);
    assert_eq!(stored.total, 1100);

    // The receipt snapshots the snapshotted prices too
    let receipt = manager.confirm_payment(&order.id, t0()).unwrap();
    assert_eq!(receipt.total, 1100);
    assert_eq!(receipt.lines[0].unit_price, 450);
}

#[test]
fn test_create_order_unknown_item() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let err = manager
        .create_order(&user(), order_input(vec![line("itm-ghost", 1)]), t0())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemNotFound);
}

#[test]
fn test_create_order_out_of_stock() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let err = manager
        .create_order(&user(), order_input(vec![line("itm-soup", 11)]), t0())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemUnavailable);
}

#[test]
fn test_create_order_is_all_or_nothing() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    // Second line fails; the first line's stock take must roll back
    let err = manager
        .create_order(
            &user(),
            order_input(vec![line("itm-soup", 2), line("itm-ghost", 1)]),
            t0(),
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemNotFound);

    assert!(manager.store().list_user_orders("u-1").unwrap().is_empty());
    let menu = manager
        .store()
        .get_daily_menu(SITE, t0().date_naive(), MealSlot::Lunch)
        .unwrap()
        .unwrap();
    assert_eq!(menu.entry("itm-soup").unwrap().stock_qty, Some(10));
}

#[test]
fn test_scheduled_for_default_and_window() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let order = create_order(&manager);
    assert_eq!(order.scheduled_for, t0() + Duration::hours(1));

    // Exactly the window edge is allowed
    let mut input = order_input(vec![line("itm-main", 1)]);
    input.scheduled_for = Some(t0() + Duration::hours(3));
    assert!(manager.create_order(&user(), input, t0()).is_ok());

    let mut input = order_input(vec![line("itm-main", 1)]);
    input.scheduled_for = Some(t0() + Duration::hours(3) + Duration::seconds(1));
    let err = manager.create_order(&user(), input, t0()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ScheduledTimeInvalid);
}

#[test]
fn test_create_order_rejects_zero_qty_and_empty_lines() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let err = manager
        .create_order(&user(), order_input(vec![]), t0())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let err = manager
        .create_order(&user(), order_input(vec![line("itm-soup", 0)]), t0())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[test]
fn test_create_order_unknown_site() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let input = CreateOrderInput {
        site_id: "site-elsewhere".to_string(),
        lines: vec![line("itm-soup", 1)],
        scheduled_for: None,
        meal_slot: None,
    };
    let err = manager.create_order(&user(), input, t0()).unwrap_err();
    assert_eq!(err.code, ErrorCode::LocationNotFound);
}

#[test]
fn test_double_payment_fails_loudly() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let order = create_order(&manager);

    manager.confirm_payment(&order.id, t0()).unwrap();
    let err = manager.confirm_payment(&order.id, t0()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);

    // Still exactly one receipt, untouched
    let receipt = manager.store().get_receipt(&order.id).unwrap().unwrap();
    assert_eq!(receipt.total, 1100);
}

#[test]
fn test_receipt_is_a_full_snapshot() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let order = manager
        .create_order(
            &user(),
            order_input(vec![line("itm-soup", 1), line("itm-main", 2)]),
            t0(),
        )
        .unwrap();

    let receipt = manager.confirm_payment(&order.id, t0()).unwrap();
    assert_eq!(receipt.order_id, order.id);
    assert_eq!(receipt.paid_at, t0());
    assert_eq!(receipt.lines.len(), 2);
    assert_eq!(receipt.lines[1].name, "Beef stroganoff");
    assert_eq!(receipt.lines[1].subtotal, 1300);
    assert_eq!(receipt.total, 450 + 1300);
}

#[test]
fn test_paid_and_in_kitchen_are_equivalent_for_ready() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let order = create_paid_order(&manager);
    let in_kitchen = manager.mark_in_kitchen(&order.id).unwrap();
    assert_eq!(in_kitchen.status, OrderStatus::InKitchen);

    // IN_KITCHEN is accepted by mark_ready exactly like PAID
    let info = manager.mark_ready(&order.id, None, t0()).unwrap();
    assert_eq!(info.cell_code, "A1");
}

#[test]
fn test_mark_in_kitchen_requires_payment() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let order = create_order(&manager);

    let err = manager.mark_in_kitchen(&order.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);
}

#[test]
fn test_mark_ready_requires_in_progress_status() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let order = create_order(&manager);

    let err = manager.mark_ready(&order.id, None, t0()).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidOrderStatus);

    let err = manager.mark_ready("no-such-order", None, t0()).unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
}

#[test]
fn test_kitchen_queue_order_and_content() {
    let manager = create_test_manager();
    seed_site(&manager, 10);

    let early = {
        let mut input = order_input(vec![line("itm-soup", 1)]);
        input.scheduled_for = Some(t0() + minutes(30));
        manager.create_order(&user(), input, t0()).unwrap()
    };
    let late = {
        let mut input = order_input(vec![line("itm-main", 1)]);
        input.scheduled_for = Some(t0() + minutes(90));
        manager.create_order(&user(), input, t0()).unwrap()
    };
    let unpaid = create_order(&manager);

    manager.confirm_payment(&late.id, t0()).unwrap();
    manager.confirm_payment(&early.id, t0()).unwrap();
    manager.mark_in_kitchen(&early.id).unwrap();

    let queue = manager.kitchen_queue().unwrap();
    let ids: Vec<&str> = queue.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec![early.id.as_str(), late.id.as_str()]);
    assert!(!ids.contains(&unpaid.id.as_str()));
}

#[test]
fn test_status_events_broadcast_after_commit() {
    let manager = create_test_manager();
    seed_site(&manager, 10);
    let mut rx = manager.subscribe();

    let order = create_order(&manager);
    manager.confirm_payment(&order.id, t0()).unwrap();

    let created = rx.try_recv().unwrap();
    assert_eq!(created.kind, OrderEventKind::Created);
    assert_eq!(created.order_id, order.id);
    assert_eq!(rx.try_recv().unwrap().kind, OrderEventKind::Paid);
}
