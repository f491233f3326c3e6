//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use petsgo_core::{BearerToken, Role, UserId};

use crate::api::ApiUser;

/// Session-stored user identity.
///
/// A copy of the account the backend returned at login, restored on every
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Backend account id.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Name shown in the header, when the account has one.
    pub display_name: Option<String>,
    /// Account role.
    pub role: Role,
}

impl CurrentUser {
    /// Name to greet the visitor with.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

impl From<ApiUser> for CurrentUser {
    fn from(user: ApiUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
        }
    }
}

/// A signed-in visitor: identity plus the token used for backend calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user: CurrentUser,
    pub token: BearerToken,
}

/// Session keys for per-visitor state.
pub mod keys {
    /// Backend bearer token.
    pub const TOKEN: &str = "petsgo_token";

    /// The signed-in [`super::CurrentUser`].
    pub const USER: &str = "petsgo_user";

    /// Shopping cart.
    pub const CART: &str = "petsgo_cart";

    /// Guest chat transcript with its save time.
    pub const GUEST_CHAT: &str = "petsgo_guest_chat";

    /// Chat transcript of the signed-in account, mirrored to the backend.
    pub const ACCOUNT_CHAT: &str = "petsgo_chat";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(display_name: Option<&str>) -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            username: "ana".to_string(),
            email: "ana@petsgo.cl".to_string(),
            display_name: display_name.map(String::from),
            role: Role::Customer,
        }
    }

    #[test]
    fn test_name_prefers_display_name() {
        assert_eq!(user(Some("Ana Pérez")).name(), "Ana Pérez");
        assert_eq!(user(None).name(), "ana");
        assert_eq!(user(Some("  ")).name(), "ana");
    }
}
