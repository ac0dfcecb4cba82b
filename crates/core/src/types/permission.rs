//! Caller identity and permission checks.
//!
//! The search gateway never looks up "the current user" itself; callers pass
//! a [`PermissionOracle`] explicitly.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::id::ShopId;

/// A capability a caller may hold within a shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Shop owner; holds every permission.
    Owner,
    /// Shop administrator; holds every catalog, account and order permission.
    Admin,
    /// Manage the catalog, including products that are not yet visible.
    CreateProduct,
    /// Read customer accounts.
    ReadAccounts,
    /// Read orders.
    ReadOrders,
}

impl Permission {
    /// Whether holding `self` grants `other`.
    #[must_use]
    pub const fn implies(self, other: Self) -> bool {
        match self {
            Self::Owner => true,
            Self::Admin => !matches!(other, Self::Owner),
            Self::CreateProduct => matches!(other, Self::CreateProduct),
            Self::ReadAccounts => matches!(other, Self::ReadAccounts),
            Self::ReadOrders => matches!(other, Self::ReadOrders),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::CreateProduct => write!(f, "create_product"),
            Self::ReadAccounts => write!(f, "read_accounts"),
            Self::ReadOrders => write!(f, "read_orders"),
        }
    }
}

impl std::str::FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "create_product" | "createProduct" => Ok(Self::CreateProduct),
            "read_accounts" | "accounts" => Ok(Self::ReadAccounts),
            "read_orders" | "orders" => Ok(Self::ReadOrders),
            _ => Err(format!("invalid permission: {s}")),
        }
    }
}

/// Answers "may this caller do X in shop S".
pub trait PermissionOracle {
    /// The shop the caller is acting in; searches are scoped to it.
    fn shop_id(&self) -> &ShopId;

    /// Whether the caller holds `permission` for `shop_id`.
    fn has_permission(&self, permission: Permission, shop_id: &ShopId) -> bool;
}

/// A concrete caller: the active shop plus the permissions granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    shop_id: ShopId,
    permissions: BTreeSet<Permission>,
}

impl Caller {
    /// A caller with no permissions (e.g. an anonymous shopper).
    #[must_use]
    pub const fn anonymous(shop_id: ShopId) -> Self {
        Self {
            shop_id,
            permissions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_permissions(
        shop_id: ShopId,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            shop_id,
            permissions: permissions.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn admin(shop_id: ShopId) -> Self {
        Self::with_permissions(shop_id, [Permission::Admin])
    }

    /// Grant an additional permission.
    #[must_use]
    pub fn grant(mut self, permission: Permission) -> Self {
        self.permissions.insert(permission);
        self
    }

    pub fn permissions(&self) -> impl Iterator<Item = Permission> + '_ {
        self.permissions.iter().copied()
    }
}

impl PermissionOracle for Caller {
    fn shop_id(&self) -> &ShopId {
        &self.shop_id
    }

    fn has_permission(&self, permission: Permission, shop_id: &ShopId) -> bool {
        shop_id == &self.shop_id && self.permissions.iter().any(|held| held.implies(permission))
    }
}
