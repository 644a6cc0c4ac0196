//! Menu catalog and daily availability
//!
//! The fulfillment core consumes exactly one thing from here:
//! [`reserve_line`], the per-line availability check and stock decrement
//! that runs inside the order-creation transaction. Everything else is
//! cook/admin surface for maintaining the catalog and the daily menus.

use crate::store::{CanteenStore, StorageResult};
use chrono::NaiveDate;
use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{DailyMenu, MealSlot, MenuItem};

/// Check one requested line against the daily menu and take its stock
///
/// Fails with `ItemNotFound` for an unknown item id and `ItemUnavailable`
/// when the item is off the menu, flagged unavailable, or out of stock.
/// Finite stock is decremented in the same transaction, so concurrent
/// orders cannot oversell; the caller aborting the transaction rolls the
/// decrement back.
pub fn reserve_line(
    store: &CanteenStore,
    txn: &WriteTransaction,
    site_id: &str,
    menu_date: NaiveDate,
    slot: MealSlot,
    menu_item_id: &str,
    qty: u32,
) -> AppResult<MenuItem> {
    let item = store
        .get_menu_item_txn(txn, menu_item_id)?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ItemNotFound,
                format!("menu item {} not found", menu_item_id),
            )
            .with_detail("item_id", menu_item_id)
        })?;

    let mut menu = store
        .get_daily_menu_txn(txn, site_id, menu_date, slot)?
        .ok_or_else(|| unavailable(&item, "not on the daily menu"))?;

    let entry = menu
        .entry_mut(menu_item_id)
        .ok_or_else(|| unavailable(&item, "not on the daily menu"))?;

    if !entry.is_available {
        return Err(unavailable(&item, "flagged unavailable"));
    }
    match entry.stock_qty {
        // None = unlimited
        None => {}
        Some(stock) if stock >= qty => {
            entry.stock_qty = Some(stock - qty);
            store.put_daily_menu(txn, &menu)?;
        }
        Some(_) => return Err(unavailable(&item, "out of stock")),
    }

    Ok(item)
}

fn unavailable(item: &MenuItem, reason: &str) -> AppError {
    AppError::with_message(
        ErrorCode::ItemUnavailable,
        format!("'{}' is unavailable: {}", item.name, reason),
    )
    .with_detail("item_id", item.id.clone())
}

/// Catalog maintenance operations (cook/admin surface)
#[derive(Clone)]
pub struct CatalogService {
    store: CanteenStore,
}

impl CatalogService {
    pub fn new(store: CanteenStore) -> Self {
        Self { store }
    }

    /// Create or replace a catalog item
    pub fn upsert_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        let txn = self.store.begin_write()?;
        self.store.put_menu_item(&txn, item)?;
        txn.commit()?;
        tracing::debug!(item_id = %item.id, "Menu item upserted");
        Ok(())
    }

    pub fn get_menu_item(&self, item_id: &str) -> StorageResult<Option<MenuItem>> {
        self.store.get_menu_item(item_id)
    }

    pub fn list_menu_items(&self) -> StorageResult<Vec<MenuItem>> {
        self.store.list_menu_items()
    }

    /// Replace the daily menu for (site, date, slot)
    ///
    /// The entry set is replaced wholesale: an item missing from the new
    /// list is gone, explicitly, rather than via any cascade. Every entry
    /// must reference an existing catalog item.
    pub fn put_daily_menu(&self, menu: &DailyMenu) -> AppResult<()> {
        let txn = self.store.begin_write()?;
        for entry in &menu.entries {
            if self
                .store
                .get_menu_item_txn(&txn, &entry.menu_item_id)?
                .is_none()
            {
                return Err(AppError::with_message(
                    ErrorCode::ItemNotFound,
                    format!("menu item {} not found", entry.menu_item_id),
                )
                .with_detail("item_id", entry.menu_item_id.clone()));
            }
        }
        self.store.put_daily_menu(&txn, menu)?;
        txn.commit().map_err(crate::store::StorageError::from)?;
        tracing::info!(
            site_id = %menu.site_id,
            date = %menu.menu_date,
            slot = %menu.meal_slot,
            entries = menu.entries.len(),
            "Daily menu saved"
        );
        Ok(())
    }

    pub fn get_daily_menu(
        &self,
        site_id: &str,
        date: NaiveDate,
        slot: MealSlot,
    ) -> StorageResult<Option<DailyMenu>> {
        self.store.get_daily_menu(site_id, date, slot)
    }
}
