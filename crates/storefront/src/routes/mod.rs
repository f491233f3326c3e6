//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Health check
//!
//! # Catalog
//! GET  /tiendas                   - Store listing
//! GET  /tiendas/{id}              - Store page with its products
//! GET  /productos                 - Product listing (?categoria=&q=)
//! GET  /productos/{id}            - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /carrito                   - Cart page
//! POST /carrito/agregar           - Add to cart
//! POST /carrito/actualizar        - Set line quantity (0 removes)
//! POST /carrito/eliminar          - Remove line
//! POST /carrito/vaciar            - Empty the cart
//! GET  /carrito/contador          - Cart count badge (fragment)
//!
//! # Checkout (requires auth)
//! GET  /checkout                  - Order summary and shipping form
//! POST /checkout                  - Place the order
//!
//! # Auth
//! GET  /login                     - Login page
//! POST /login                     - Login action (rate limited)
//! GET  /registro                  - Register page
//! POST /registro                  - Register action (rate limited)
//! POST /logout                    - Logout action
//!
//! # Account (requires auth)
//! GET  /mis-pedidos               - Order history
//! GET  /soporte                   - Tickets and new-ticket form
//! POST /soporte                   - Open a ticket
//! GET  /soporte/{id}              - Ticket thread
//! POST /soporte/{id}/responder    - Reply to a ticket
//!
//! # Admin (admin role)
//! GET  /admin                     - Marketplace statistics
//! GET  /admin/tiendas             - Every store
//! GET  /admin/tiendas/{id}        - A store's dashboard, read only
//! GET  /admin/soporte             - Every ticket
//! POST /admin/soporte/{id}/estado - Change a ticket's status
//!
//! # Vendor (vendor role)
//! GET  /vendor                    - Vendor dashboard
//! GET  /vendor/pedidos            - Orders received
//! GET  /vendor/productos          - Inventory
//!
//! # Rider (rider role)
//! GET  /rider                     - Deliveries and figures
//! POST /rider/entregas/{id}/estado - Advance a delivery
//!
//! # Chat widget API (JSON, rate limited)
//! GET    /api/chat                - Settings and transcript
//! POST   /api/chat                - Send a message
//! DELETE /api/chat                - Clear the transcript
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod chat;
pub mod checkout;
pub mod home;
pub mod products;
pub mod rider;
pub mod stores;
pub mod support;
pub mod vendor;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, chat_rate_limiter};
use crate::state::AppState;

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/tiendas", get(stores::index))
        .route("/tiendas/{id}", get(stores::show))
        .route("/productos", get(products::index))
        .route("/productos/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/carrito", get(cart::show))
        .route("/carrito/agregar", post(cart::add))
        .route("/carrito/actualizar", post(cart::update))
        .route("/carrito/eliminar", post(cart::remove))
        .route("/carrito/vaciar", post(cart::clear))
        .route("/carrito/contador", get(cart::count))
        .route("/checkout", get(checkout::show).post(checkout::place_order))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/registro",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/mis-pedidos", get(account::orders))
        .route("/soporte", get(support::index).post(support::create))
        .route("/soporte/{id}", get(support::show))
        .route("/soporte/{id}/responder", post(support::reply))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/tiendas", get(admin::vendors))
        .route("/admin/tiendas/{id}", get(admin::impersonate))
        .route("/admin/soporte", get(admin::tickets))
        .route("/admin/soporte/{id}/estado", post(admin::update_ticket_status))
}

/// Create the vendor routes router.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/vendor", get(vendor::dashboard))
        .route("/vendor/pedidos", get(vendor::orders))
        .route("/vendor/productos", get(vendor::products))
}

/// Create the rider routes router.
pub fn rider_routes() -> Router<AppState> {
    Router::new()
        .route("/rider", get(rider::dashboard))
        .route("/rider/entregas/{id}/estado", post(rider::update_status))
}

/// Create the chat widget API router.
pub fn chat_routes() -> Router<AppState> {
    Router::new().route(
        "/api/chat",
        get(chat::bootstrap)
            .post(chat::send)
            .delete(chat::clear)
            .layer(chat_rate_limiter()),
    )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .merge(cart_routes())
        .merge(auth_routes())
        .merge(account_routes())
        .merge(admin_routes())
        .merge(vendor_routes())
        .merge(rider_routes())
        .merge(chat_routes())
}
