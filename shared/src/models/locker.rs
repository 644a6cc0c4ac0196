//! Locker cell and reservation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Locker cell status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellStatus {
    #[default]
    Free,
    Reserved,
    Occupied,
}

/// One physical locker cell at a site
///
/// Invariant: at most one active (unreleased) [`Reservation`] references a
/// cell at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockerCell {
    pub site_id: String,
    /// Human-readable code, e.g. "A7" - printed on the physical door
    pub code: String,
    pub status: CellStatus,
}

impl LockerCell {
    pub fn is_free(&self) -> bool {
        self.status == CellStatus::Free
    }
}

/// Hold of a cell for one order
///
/// Created when the kitchen marks an order ready; terminated (released_at
/// set, cell back to FREE) on successful claim or hold expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    /// At most one active reservation per order
    pub order_id: String,
    pub site_id: String,
    pub cell_code: String,
    /// Deadline after which the hold is forfeit
    pub hold_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// None while the hold is active
    pub released_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.released_at.is_none()
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.hold_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_overdue_is_strict() {
        let hold_until = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let reservation = Reservation {
            id: "res-1".into(),
            order_id: "ord-1".into(),
            site_id: "site-1".into(),
            cell_code: "A1".into(),
            hold_until,
            created_at: hold_until,
            released_at: None,
        };
        // The deadline instant itself is still inside the hold
        assert!(!reservation.is_overdue(hold_until));
        assert!(reservation.is_overdue(hold_until + chrono::Duration::seconds(1)));
    }
}
