use super::*;
use crate::catalog::CatalogService;
use chrono::{NaiveTime, TimeZone};
use shared::models::{DailyMenu, DailyMenuEntry, MenuItem, Role, Site};

mod test_concurrency;
mod test_core;
mod test_expiry;

const SITE: &str = "site-1";

/// Fixed "now" for deterministic tests: 2026-03-02 09:00:00 UTC
fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn minutes(m: i64) -> Duration {
    Duration::minutes(m)
}

fn user() -> Principal {
    Principal::new("u-1", Role::User)
}

fn create_test_manager() -> OrderManager {
    let store = CanteenStore::open_in_memory().unwrap();
    OrderManager::new(store, PickupPolicy::default())
}

/// Site open 08:00-20:00 with the given locker bank, plus a lunch menu of
/// soup (450, stock 10) and a main (650, unlimited)
fn seed_site(manager: &OrderManager, cells: u32) {
    seed_site_closing_at(manager, cells, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
}

fn seed_site_closing_at(manager: &OrderManager, cells: u32, closing_time: NaiveTime) {
    let store = manager.store();
    crate::lockers::provision_site(
        store,
        &Site {
            id: SITE.to_string(),
            name: "Main canteen".to_string(),
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            closing_time,
            is_closed_manual: false,
        },
        cells,
    )
    .unwrap();

    let catalog = CatalogService::new(store.clone());
    catalog
        .upsert_menu_item(&MenuItem {
            id: "itm-soup".to_string(),
            name: "Borscht".to_string(),
            category: "first".to_string(),
            base_price: 450,
        })
        .unwrap();
    catalog
        .upsert_menu_item(&MenuItem {
            id: "itm-main".to_string(),
            name: "Beef stroganoff".to_string(),
            category: "second".to_string(),
            base_price: 650,
        })
        .unwrap();
    catalog
        .put_daily_menu(&DailyMenu {
            site_id: SITE.to_string(),
            menu_date: t0().date_naive(),
            meal_slot: MealSlot::Lunch,
            entries: vec![
                DailyMenuEntry {
                    menu_item_id: "itm-soup".to_string(),
                    stock_qty: Some(10),
                    is_available: true,
                },
                DailyMenuEntry {
                    menu_item_id: "itm-main".to_string(),
                    stock_qty: None,
                    is_available: true,
                },
            ],
        })
        .unwrap();
}

fn line(menu_item_id: &str, qty: u32) -> OrderLineInput {
    OrderLineInput {
        menu_item_id: menu_item_id.to_string(),
        qty,
        comment: None,
    }
}

fn order_input(lines: Vec<OrderLineInput>) -> CreateOrderInput {
    CreateOrderInput {
        site_id: SITE.to_string(),
        lines,
        scheduled_for: None,
        meal_slot: None,
    }
}

/// One soup + one main: total 1100
fn create_order(manager: &OrderManager) -> Order {
    manager
        .create_order(
            &user(),
            order_input(vec![line("itm-soup", 1), line("itm-main", 1)]),
            t0(),
        )
        .unwrap()
}

fn create_paid_order(manager: &OrderManager) -> Order {
    let order = create_order(manager);
    manager.confirm_payment(&order.id, t0()).unwrap();
    order
}

fn create_ready_order(manager: &OrderManager) -> (Order, ReadyInfo) {
    let order = create_paid_order(manager);
    let info = manager.mark_ready(&order.id, None, t0()).unwrap();
    (order, info)
}

fn cell_status(manager: &OrderManager, code: &str) -> shared::models::CellStatus {
    manager
        .store()
        .get_cell(SITE, code)
        .unwrap()
        .unwrap()
        .status
}
