//! Cart storage in the visitor session.

use tower_sessions::Session;

use petsgo_core::Cart;

use crate::models::session_keys;

/// The visitor's cart, empty when none was saved or it cannot be read.
pub async fn load(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read cart from session");
            Cart::default()
        }
    }
}

/// Save the visitor's cart.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn store(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}
