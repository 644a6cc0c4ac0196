//! Domain models
//!
//! Entities shared between the fulfillment core, its store, and the API
//! layer. All money amounts are integer minor-currency units; all instants
//! are UTC.

pub mod credential;
pub mod locker;
pub mod menu;
pub mod order;
pub mod principal;
pub mod site;

pub use credential::PickupCredential;
pub use locker::{CellStatus, LockerCell, Reservation};
pub use menu::{DailyMenu, DailyMenuEntry, MealSlot, MenuItem};
pub use order::{Order, OrderLine, OrderStatus, Receipt, ReceiptLine};
pub use principal::{Capability, Principal, Role};
pub use site::Site;
