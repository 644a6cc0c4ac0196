//! Menu and daily availability models
//!
//! The fulfillment core only consumes these through the availability check
//! at order creation; editing them is cook/admin surface.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Catalog item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    /// Display grouping: "first", "second", "salads", "drinks", "desserts"
    pub category: String,
    /// Current catalog price in minor currency units
    pub base_price: i64,
}

/// Meal slot of a daily menu
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MealSlot {
    Breakfast,
    #[default]
    Lunch,
    Dinner,
}

impl MealSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }
}

impl std::fmt::Display for MealSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability of one item on a daily menu
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMenuEntry {
    pub menu_item_id: String,
    /// None = unlimited
    pub stock_qty: Option<u32>,
    pub is_available: bool,
}

/// The set of items offered at a site for one date and meal slot
///
/// Entries are replaced wholesale on edit; removing an item from the list
/// is an explicit delete, not a cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyMenu {
    pub site_id: String,
    pub menu_date: NaiveDate,
    pub meal_slot: MealSlot,
    pub entries: Vec<DailyMenuEntry>,
}

impl DailyMenu {
    pub fn entry(&self, menu_item_id: &str) -> Option<&DailyMenuEntry> {
        self.entries.iter().find(|e| e.menu_item_id == menu_item_id)
    }

    pub fn entry_mut(&mut self, menu_item_id: &str) -> Option<&mut DailyMenuEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.menu_item_id == menu_item_id)
    }
}
