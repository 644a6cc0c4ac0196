//! Site model

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// A physical location with operating hours and a locker pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    /// Daily operating window, UTC wall-clock
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    /// Manually closed by an admin regardless of the schedule
    pub is_closed_manual: bool,
}
