//! Pickup credential model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Proof of the right to claim one order's locker
///
/// The token is the QR payload; the PIN is the fallback channel when the
/// token cannot be scanned. Multiple credentials may exist per order over
/// time (reissue), but at most one is unused at any given moment - issuing
/// a new one invalidates all prior unused credentials for the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupCredential {
    pub id: String,
    pub order_id: String,
    /// Unguessable hex token, fixed length
    pub token: String,
    /// 6-digit numeric PIN
    pub pin: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// None while the credential is still claimable
    pub used_at: Option<DateTime<Utc>>,
}

impl PickupCredential {
    pub fn is_unused(&self) -> bool {
        self.used_at.is_none()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
