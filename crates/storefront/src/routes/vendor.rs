//! Vendor dashboard route handlers.
//!
//! Vendors see their own store. Admins see any store read-only through
//! `/admin/tiendas/{id}`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::api::{Order, Product, VendorDashboard};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireVendor};
use crate::state::AppState;

/// Vendor dashboard template.
///
/// Also rendered read-only when an admin impersonates a store.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/dashboard.html")]
pub struct VendorDashboardTemplate {
    pub page: PageContext,
    pub dashboard: VendorDashboard,
    pub read_only: bool,
}

/// Vendor orders template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/orders.html")]
pub struct VendorOrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
}

/// Vendor inventory template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/products.html")]
pub struct VendorProductsTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
}

/// Display the vendor dashboard.
#[instrument(skip_all, fields(user_id = %visitor.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireVendor(visitor): RequireVendor,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let dashboard = state.api().vendor_dashboard(&visitor.token).await?;
    Ok(VendorDashboardTemplate {
        page,
        dashboard,
        read_only: false,
    })
}

/// Display orders received by the store.
#[instrument(skip_all, fields(user_id = %visitor.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireVendor(visitor): RequireVendor,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let orders = state.api().vendor_orders(&visitor.token).await?;
    Ok(VendorOrdersTemplate { page, orders })
}

/// Display the store's inventory.
#[instrument(skip_all, fields(user_id = %visitor.user.id))]
pub async fn products(
    State(state): State<AppState>,
    RequireVendor(visitor): RequireVendor,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let products = state.api().vendor_products(&visitor.token).await?;
    Ok(VendorProductsTemplate { page, products })
}
