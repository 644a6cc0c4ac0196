//! redb-based storage layer for fulfillment state
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `orders` | `order_id` | `Order` | Orders with their lines |
//! | `user_orders` | `(user_id, order_id)` | `()` | Per-user order index |
//! | `receipts` | `order_id` | `Receipt` | Payment snapshots (write-once) |
//! | `cells` | `(site_id, code)` | `LockerCell` | Locker pool |
//! | `reservations` | `reservation_id` | `Reservation` | Cell holds |
//! | `order_reservation` | `order_id` | `reservation_id` | Active-hold index |
//! | `credentials` | `token` | `PickupCredential` | Pickup credentials |
//! | `order_credentials` | `(order_id, token)` | `issued_at_millis` | Per-order credential index |
//! | `menu_items` | `item_id` | `MenuItem` | Catalog |
//! | `daily_menus` | `(site_id, date\|slot)` | `DailyMenu` | Daily availability |
//! | `sites` | `site_id` | `Site` | Sites and operating hours |
//!
//! # Concurrency
//!
//! redb admits a single write transaction at a time, so every multi-entity
//! mutation (order + receipt, cell + reservation, credential invalidation +
//! claim) is serialized and atomic by construction. Read paths use read
//! transactions; a read path that needs to mutate (lazy expiry) upgrades to
//! a write transaction and re-checks its premise inside it.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use shared::models::{
    DailyMenu, LockerCell, MealSlot, MenuItem, Order, PickupCredential, Receipt, Reservation, Site,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Orders: key = order_id, value = JSON-serialized Order (lines inline)
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// Per-user order index: key = (user_id, order_id), value = empty
const USER_ORDERS_TABLE: TableDefinition<(&str, &str), ()> = TableDefinition::new("user_orders");

/// Receipts: key = order_id, value = JSON-serialized Receipt
const RECEIPTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("receipts");

/// Locker cells: key = (site_id, code), value = JSON-serialized LockerCell
const CELLS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("cells");

/// Reservations: key = reservation_id, value = JSON-serialized Reservation
const RESERVATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("reservations");

/// Order -> reservation index: key = order_id, value = reservation_id
const ORDER_RESERVATION_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("order_reservation");

/// Credentials: key = token, value = JSON-serialized PickupCredential
const CREDENTIALS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("credentials");

/// Per-order credential index: key = (order_id, token), value = issued_at millis
const ORDER_CREDENTIALS_TABLE: TableDefinition<(&str, &str), i64> =
    TableDefinition::new("order_credentials");

/// Menu items: key = item_id, value = JSON-serialized MenuItem
const MENU_ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menu_items");

/// Daily menus: key = (site_id, "YYYY-MM-DD|slot"), value = JSON-serialized DailyMenu
const DAILY_MENUS_TABLE: TableDefinition<(&str, &str), &[u8]> =
    TableDefinition::new("daily_menus");

/// Sites: key = site_id, value = JSON-serialized Site
const SITES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sites");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for shared::AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Storage error");
        shared::AppError::database(err.to_string())
    }
}

/// Fulfillment state store backed by redb
///
/// redb uses `Durability::Immediate` by default: commits are persistent as
/// soon as `commit()` returns, with copy-on-write and an atomic pointer
/// swap, so the database file stays consistent across power loss.
#[derive(Clone)]
pub struct CanteenStore {
    db: Arc<Database>,
}

fn encode<T: serde::Serialize>(value: &T) -> StorageResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> StorageResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

fn daily_menu_key(date: chrono::NaiveDate, slot: MealSlot) -> String {
    format!("{}|{}", date, slot)
}

impl CanteenStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db: Arc::new(db) };
        store.init_tables()?;
        Ok(store)
    }

    /// Create all tables so later read transactions never see a missing table
    fn init_tables(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(USER_ORDERS_TABLE)?;
            let _ = write_txn.open_table(RECEIPTS_TABLE)?;
            let _ = write_txn.open_table(CELLS_TABLE)?;
            let _ = write_txn.open_table(RESERVATIONS_TABLE)?;
            let _ = write_txn.open_table(ORDER_RESERVATION_TABLE)?;
            let _ = write_txn.open_table(CREDENTIALS_TABLE)?;
            let _ = write_txn.open_table(ORDER_CREDENTIALS_TABLE)?;
            let _ = write_txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = write_txn.open_table(DAILY_MENUS_TABLE)?;
            let _ = write_txn.open_table(SITES_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    ///
    /// Blocks while another write transaction is open; this is the
    /// serialization point for all state transitions.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Orders ==========

    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let bytes = encode(order)?;
        {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            table.insert(order.id.as_str(), bytes.as_slice())?;
        }
        let mut index = txn.open_table(USER_ORDERS_TABLE)?;
        index.insert((order.user_id.as_str(), order.id.as_str()), ())?;
        Ok(())
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        table
            .get(order_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        table
            .get(order_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    /// All orders of one user, via the index
    pub fn list_user_orders(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_ORDERS_TABLE)?;
        let orders_table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in index.iter()? {
            let (key, _) = entry?;
            let (owner, order_id) = key.value();
            if owner != user_id {
                continue;
            }
            if let Some(guard) = orders_table.get(order_id)? {
                orders.push(decode(guard.value())?);
            }
        }
        Ok(orders)
    }

    /// Full order scan; callers filter
    pub fn list_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            orders.push(decode(value.value())?);
        }
        Ok(orders)
    }

    // ========== Receipts ==========

    pub fn put_receipt(&self, txn: &WriteTransaction, receipt: &Receipt) -> StorageResult<()> {
        let bytes = encode(receipt)?;
        let mut table = txn.open_table(RECEIPTS_TABLE)?;
        table.insert(receipt.order_id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    pub fn get_receipt(&self, order_id: &str) -> StorageResult<Option<Receipt>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECEIPTS_TABLE)?;
        table
            .get(order_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    // ========== Locker cells ==========

    pub fn put_cell(&self, txn: &WriteTransaction, cell: &LockerCell) -> StorageResult<()> {
        let bytes = encode(cell)?;
        let mut table = txn.open_table(CELLS_TABLE)?;
        table.insert((cell.site_id.as_str(), cell.code.as_str()), bytes.as_slice())?;
        Ok(())
    }

    pub fn get_cell_txn(
        &self,
        txn: &WriteTransaction,
        site_id: &str,
        code: &str,
    ) -> StorageResult<Option<LockerCell>> {
        let table = txn.open_table(CELLS_TABLE)?;
        table
            .get((site_id, code))?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    pub fn get_cell(&self, site_id: &str, code: &str) -> StorageResult<Option<LockerCell>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CELLS_TABLE)?;
        table
            .get((site_id, code))?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    /// All cells of a site
    pub fn list_cells(&self, site_id: &str) -> StorageResult<Vec<LockerCell>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CELLS_TABLE)?;
        let mut cells = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            if key.value().0 == site_id {
                cells.push(decode(value.value())?);
            }
        }
        Ok(cells)
    }

    /// Free cells of a site, unsorted (assignment policy sorts)
    pub fn free_cells_txn(
        &self,
        txn: &WriteTransaction,
        site_id: &str,
    ) -> StorageResult<Vec<LockerCell>> {
        let table = txn.open_table(CELLS_TABLE)?;
        let mut cells = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            if key.value().0 != site_id {
                continue;
            }
            let cell: LockerCell = decode(value.value())?;
            if cell.is_free() {
                cells.push(cell);
            }
        }
        Ok(cells)
    }

    // ========== Reservations ==========

    pub fn put_reservation(
        &self,
        txn: &WriteTransaction,
        reservation: &Reservation,
    ) -> StorageResult<()> {
        let bytes = encode(reservation)?;
        {
            let mut table = txn.open_table(RESERVATIONS_TABLE)?;
            table.insert(reservation.id.as_str(), bytes.as_slice())?;
        }
        let mut index = txn.open_table(ORDER_RESERVATION_TABLE)?;
        index.insert(reservation.order_id.as_str(), reservation.id.as_str())?;
        Ok(())
    }

    pub fn get_reservation_txn(
        &self,
        txn: &WriteTransaction,
        reservation_id: &str,
    ) -> StorageResult<Option<Reservation>> {
        let table = txn.open_table(RESERVATIONS_TABLE)?;
        table
            .get(reservation_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    pub fn reservation_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Reservation>> {
        let reservation_id = {
            let index = txn.open_table(ORDER_RESERVATION_TABLE)?;
            match index.get(order_id)? {
                Some(guard) => guard.value().to_string(),
                None => return Ok(None),
            }
        };
        self.get_reservation_txn(txn, &reservation_id)
    }

    pub fn reservation_for_order(&self, order_id: &str) -> StorageResult<Option<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let reservation_id = {
            let index = read_txn.open_table(ORDER_RESERVATION_TABLE)?;
            match index.get(order_id)? {
                Some(guard) => guard.value().to_string(),
                None => return Ok(None),
            }
        };
        let table = read_txn.open_table(RESERVATIONS_TABLE)?;
        table
            .get(reservation_id.as_str())?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    // ========== Pickup credentials ==========

    pub fn put_credential(
        &self,
        txn: &WriteTransaction,
        credential: &PickupCredential,
    ) -> StorageResult<()> {
        let bytes = encode(credential)?;
        {
            let mut table = txn.open_table(CREDENTIALS_TABLE)?;
            table.insert(credential.token.as_str(), bytes.as_slice())?;
        }
        let mut index = txn.open_table(ORDER_CREDENTIALS_TABLE)?;
        index.insert(
            (credential.order_id.as_str(), credential.token.as_str()),
            credential.issued_at.timestamp_millis(),
        )?;
        Ok(())
    }

    pub fn credential_by_token_txn(
        &self,
        txn: &WriteTransaction,
        token: &str,
    ) -> StorageResult<Option<PickupCredential>> {
        let table = txn.open_table(CREDENTIALS_TABLE)?;
        table
            .get(token)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    /// All credentials of an order, most recently issued first
    pub fn credentials_for_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Vec<PickupCredential>> {
        let tokens: Vec<String> = {
            let index = txn.open_table(ORDER_CREDENTIALS_TABLE)?;
            let mut keyed = Vec::new();
            for entry in index.iter()? {
                let (key, issued_at) = entry?;
                let (owner, token) = key.value();
                if owner == order_id {
                    keyed.push((issued_at.value(), token.to_string()));
                }
            }
            keyed.sort_by(|a, b| b.0.cmp(&a.0));
            keyed.into_iter().map(|(_, token)| token).collect()
        };
        let table = txn.open_table(CREDENTIALS_TABLE)?;
        let mut credentials = Vec::new();
        for token in tokens {
            if let Some(guard) = table.get(token.as_str())? {
                credentials.push(decode(guard.value())?);
            }
        }
        Ok(credentials)
    }

    /// Read-path variant of [`Self::credentials_for_order_txn`]
    pub fn credentials_for_order(&self, order_id: &str) -> StorageResult<Vec<PickupCredential>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(ORDER_CREDENTIALS_TABLE)?;
        let mut keyed = Vec::new();
        for entry in index.iter()? {
            let (key, issued_at) = entry?;
            let (owner, token) = key.value();
            if owner == order_id {
                keyed.push((issued_at.value(), token.to_string()));
            }
        }
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
        let table = read_txn.open_table(CREDENTIALS_TABLE)?;
        let mut credentials = Vec::new();
        for (_, token) in keyed {
            if let Some(guard) = table.get(token.as_str())? {
                credentials.push(decode(guard.value())?);
            }
        }
        Ok(credentials)
    }

    // ========== Menu ==========

    pub fn put_menu_item(&self, txn: &WriteTransaction, item: &MenuItem) -> StorageResult<()> {
        let bytes = encode(item)?;
        let mut table = txn.open_table(MENU_ITEMS_TABLE)?;
        table.insert(item.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    pub fn get_menu_item_txn(
        &self,
        txn: &WriteTransaction,
        item_id: &str,
    ) -> StorageResult<Option<MenuItem>> {
        let table = txn.open_table(MENU_ITEMS_TABLE)?;
        table
            .get(item_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    pub fn get_menu_item(&self, item_id: &str) -> StorageResult<Option<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
        table
            .get(item_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    pub fn list_menu_items(&self) -> StorageResult<Vec<MenuItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MENU_ITEMS_TABLE)?;
        let mut items = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            items.push(decode(value.value())?);
        }
        Ok(items)
    }

    pub fn put_daily_menu(&self, txn: &WriteTransaction, menu: &DailyMenu) -> StorageResult<()> {
        let bytes = encode(menu)?;
        let key = daily_menu_key(menu.menu_date, menu.meal_slot);
        let mut table = txn.open_table(DAILY_MENUS_TABLE)?;
        table.insert((menu.site_id.as_str(), key.as_str()), bytes.as_slice())?;
        Ok(())
    }

    pub fn get_daily_menu_txn(
        &self,
        txn: &WriteTransaction,
        site_id: &str,
        date: chrono::NaiveDate,
        slot: MealSlot,
    ) -> StorageResult<Option<DailyMenu>> {
        let key = daily_menu_key(date, slot);
        let table = txn.open_table(DAILY_MENUS_TABLE)?;
        table
            .get((site_id, key.as_str()))?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    pub fn get_daily_menu(
        &self,
        site_id: &str,
        date: chrono::NaiveDate,
        slot: MealSlot,
    ) -> StorageResult<Option<DailyMenu>> {
        let read_txn = self.db.begin_read()?;
        let key = daily_menu_key(date, slot);
        let table = read_txn.open_table(DAILY_MENUS_TABLE)?;
        table
            .get((site_id, key.as_str()))?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    // ========== Sites ==========

    pub fn put_site(&self, txn: &WriteTransaction, site: &Site) -> StorageResult<()> {
        let bytes = encode(site)?;
        let mut table = txn.open_table(SITES_TABLE)?;
        table.insert(site.id.as_str(), bytes.as_slice())?;
        Ok(())
    }

    pub fn get_site_txn(
        &self,
        txn: &WriteTransaction,
        site_id: &str,
    ) -> StorageResult<Option<Site>> {
        let table = txn.open_table(SITES_TABLE)?;
        table
            .get(site_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }

    pub fn get_site(&self, site_id: &str) -> StorageResult<Option<Site>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SITES_TABLE)?;
        table
            .get(site_id)?
            .map(|guard| decode(guard.value()))
            .transpose()
    }
}
