//! Order model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Transitions are one-directional except PAID ⇄ IN_KITCHEN, which are
/// interchangeable "in progress" states accepted identically downstream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
    Paid,
    InKitchen,
    Ready,
    PickedUp,
    Expired,
}

impl OrderStatus {
    /// PAID and IN_KITCHEN look the same to everything after the kitchen
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Paid | Self::InKitchen)
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PickedUp | Self::Expired)
    }
}

/// One line of an order
///
/// Created together with its order and immutable thereafter. `unit_price`
/// is snapshotted from the catalog at creation time, so later price edits
/// never change what the customer was charged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: String,
    /// Item name snapshot, for receipts and kitchen displays
    pub name: String,
    pub qty: u32,
    /// Price snapshot in minor currency units
    pub unit_price: i64,
    pub comment: Option<String>,
}

impl OrderLine {
    pub fn subtotal(&self) -> i64 {
        self.unit_price * self.qty as i64
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub site_id: String,
    pub status: OrderStatus,
    /// Requested pickup time
    pub scheduled_for: DateTime<Utc>,
    /// Sum of line subtotals in minor currency units
    pub total: i64,
    /// Cell hold expiry, set when the order becomes READY
    pub pickup_deadline_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub ready_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Recompute the total from the owned lines
    pub fn line_total(&self) -> i64 {
        self.lines.iter().map(OrderLine::subtotal).sum()
    }
}

/// One line of a receipt snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub qty: u32,
    pub unit_price: i64,
    pub subtotal: i64,
}

/// Immutable snapshot of paid order contents
///
/// Written exactly once when payment is confirmed, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub order_id: String,
    pub lines: Vec<ReceiptLine>,
    pub total: i64,
    pub paid_at: DateTime<Utc>,
}

impl Receipt {
    /// Snapshot the given order at payment time
    pub fn from_order(order: &Order, paid_at: DateTime<Utc>) -> Self {
        Self {
            order_id: order.id.clone(),
            lines: order
                .lines
                .iter()
                .map(|line| ReceiptLine {
                    name: line.name.clone(),
                    qty: line.qty,
                    unit_price: line.unit_price,
                    subtotal: line.subtotal(),
                })
                .collect(),
            total: order.total,
            paid_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InKitchen).unwrap(),
            "\"IN_KITCHEN\""
        );
        assert_eq!(
            serde_json::to_string(&OrderStatus::PickedUp).unwrap(),
            "\"PICKED_UP\""
        );
    }

    #[test]
    fn test_in_progress_classification() {
        assert!(OrderStatus::Paid.is_in_progress());
        assert!(OrderStatus::InKitchen.is_in_progress());
        assert!(!OrderStatus::Ready.is_in_progress());
        assert!(OrderStatus::Expired.is_terminal());
    }

    #[test]
    fn test_line_subtotal() {
        let line = OrderLine {
            menu_item_id: "itm-1".into(),
            name: "Borscht".into(),
            qty: 3,
            unit_price: 450,
            comment: None,
        };
        assert_eq!(line.subtotal(), 1350);
    }
}
