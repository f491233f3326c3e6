//! Shared layout data for every page.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use petsgo_core::Role;

use crate::models::SessionUser;
use crate::services::cart;

use super::auth::load_session_user;

/// What the shared layout needs to know about the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Whether an account is signed in.
    pub signed_in: bool,
    /// Name shown in the header.
    pub display_name: String,
    /// Role of the signed-in account.
    pub role: Option<Role>,
    /// Link to the account's dashboard.
    pub dashboard_path: &'static str,
    /// Role label shown next to the name.
    pub role_label: &'static str,
    /// Units in the cart.
    pub cart_count: u32,
}

impl PageContext {
    /// Build the context for a visitor and its cart size.
    #[must_use]
    pub fn new(user: Option<&SessionUser>, cart_count: u32) -> Self {
        user.map_or_else(
            || Self {
                cart_count,
                ..Self::default()
            },
            |visitor| {
                let role = visitor.user.role;
                Self {
                    signed_in: true,
                    display_name: visitor.user.name().to_string(),
                    role: Some(role),
                    dashboard_path: role.dashboard_path(),
                    role_label: role.label(),
                    cart_count,
                }
            },
        )
    }

    /// Whether the admin menu should be shown.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };
        let user = load_session_user(session).await;
        let cart_count = cart::load(session).await.item_count();
        Ok(Self::new(user.as_ref(), cart_count))
    }
}

#[cfg(test)]
mod tests {
    use petsgo_core::{BearerToken, UserId};

    use super::*;
    use crate::models::CurrentUser;

    #[test]
    fn test_guest_context() {
        let page = PageContext::new(None, 3);
        assert!(!page.signed_in);
        assert_eq!(page.cart_count, 3);
        assert!(page.dashboard_path.is_empty());
    }

    #[test]
    fn test_vendor_context_links_to_dashboard() {
        let visitor = SessionUser {
            user: CurrentUser {
                id: UserId::new(2),
                username: "patitas".to_string(),
                email: "tienda@petsgo.cl".to_string(),
                display_name: Some("Patitas Felices".to_string()),
                role: Role::Vendor,
            },
            token: BearerToken::new("t"),
        };
        let page = PageContext::new(Some(&visitor), 0);
        assert!(page.signed_in);
        assert_eq!(page.display_name, "Patitas Felices");
        assert_eq!(page.dashboard_path, "/vendor");
        assert!(!page.is_admin());
    }
}
