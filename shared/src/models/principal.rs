//! Roles and the acting principal
//!
//! The identity service authenticates callers; this module only decides
//! what an authenticated caller may do. Every entry point that needs
//! authorization takes the [`Principal`] as an explicit parameter - there
//! is no ambient auth context anywhere in the core.

use crate::error::{AppError, AppResult, ErrorCode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Closed role set
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Cook,
    Admin,
}

/// Things a caller may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PlaceOrder,
    ConfirmPayment,
    ViewOwnOrders,
    ViewKitchenQueue,
    MarkReady,
    ReissueCredential,
    ManageMenu,
    ManageSites,
}

impl Role {
    /// Single capability check consumed uniformly by every entry point
    pub fn allows(&self, cap: Capability) -> bool {
        use Capability::*;
        match self {
            Role::Admin => true,
            Role::Cook => matches!(
                cap,
                ViewKitchenQueue | MarkReady | ReissueCredential | ManageMenu
            ),
            Role::User => matches!(cap, PlaceOrder | ConfirmPayment | ViewOwnOrders),
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "cook" => Ok(Role::Cook),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::with_message(
                ErrorCode::ValidationFailed,
                format!("unknown role: {}", other),
            )),
        }
    }
}

/// The authenticated caller, supplied by the identity collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Fail with RoleRequired unless this principal holds the capability
    pub fn require(&self, cap: Capability) -> AppResult<()> {
        if self.role.allows(cap) {
            Ok(())
        } else {
            Err(AppError::with_message(
                ErrorCode::RoleRequired,
                format!("role {:?} may not perform {:?}", self.role, cap),
            ))
        }
    }

    /// Users see their own orders; kitchen staff see everyone's
    pub fn may_view_order_of(&self, owner_id: &str) -> bool {
        self.user_id == owner_id || matches!(self.role, Role::Cook | Role::Admin)
    }
}
