//! Account roles and the areas of the site they may enter.

use serde::{Deserialize, Serialize};

/// Role of an authenticated account, as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Marketplace seller managing its own store.
    Vendor,
    /// Marketplace operator.
    Admin,
    /// Delivery courier.
    Rider,
    /// Buyer. Roles this frontend does not know map here.
    #[default]
    #[serde(other)]
    Customer,
}

impl Role {
    /// Where the account lands after logging in.
    #[must_use]
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Self::Customer => "/mis-pedidos",
            Self::Vendor => "/vendor",
            Self::Admin => "/admin",
            Self::Rider => "/rider",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Cliente",
            Self::Vendor => "Tienda",
            Self::Admin => "Administrador",
            Self::Rider => "Rider",
        }
    }
}

/// A guarded section of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// Pages of any signed-in account (orders, support, checkout).
    Account,
    /// Vendor dashboard.
    Vendor,
    /// Admin panel.
    Admin,
    /// Rider dashboard.
    Rider,
}

impl Area {
    /// Whether an account with `role` may enter this area.
    ///
    /// The vendor and rider areas admit only their own role; admins view a
    /// store through the read-only impersonation instead.
    #[must_use]
    pub const fn allows(self, role: Role) -> bool {
        match self {
            Self::Account => true,
            Self::Admin => matches!(role, Role::Admin),
            Self::Vendor => matches!(role, Role::Vendor),
            Self::Rider => matches!(role, Role::Rider),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        let role: Role = serde_json::from_str("\"rider\"").unwrap();
        assert_eq!(role, Role::Rider);
        assert_eq!(serde_json::to_string(&Role::Vendor).unwrap(), "\"vendor\"");
    }

    #[test]
    fn test_unknown_role_is_customer() {
        let role: Role = serde_json::from_str("\"subscriber\"").unwrap();
        assert_eq!(role, Role::Customer);

        let role: Role = serde_json::from_str("\"customer\"").unwrap();
        assert_eq!(role, Role::Customer);
        assert_eq!(Role::default(), Role::Customer);
    }

    #[test]
    fn test_area_access() {
        assert!(Area::Account.allows(Role::Customer));
        assert!(Area::Account.allows(Role::Rider));

        assert!(Area::Admin.allows(Role::Admin));
        assert!(!Area::Admin.allows(Role::Vendor));

        assert!(Area::Vendor.allows(Role::Vendor));
        assert!(!Area::Vendor.allows(Role::Admin));
        assert!(!Area::Vendor.allows(Role::Customer));
        assert!(!Area::Vendor.allows(Role::Rider));

        assert!(Area::Rider.allows(Role::Rider));
        assert!(!Area::Rider.allows(Role::Admin));
        assert!(!Area::Rider.allows(Role::Vendor));
    }

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(Role::Customer.dashboard_path(), "/mis-pedidos");
        assert_eq!(Role::Admin.dashboard_path(), "/admin");
    }
}
