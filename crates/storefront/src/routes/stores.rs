//! Store route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::instrument;

use petsgo_core::VendorId;

use crate::api::{Product, ProductQuery, Vendor};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::services::catalog;
use crate::state::AppState;

/// Store listing template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/index.html")]
pub struct StoresIndexTemplate {
    pub page: PageContext,
    pub vendors: Vec<Vendor>,
    pub demo: bool,
}

/// Store page template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/show.html")]
pub struct StoreShowTemplate {
    pub page: PageContext,
    pub vendor: Vendor,
    pub products: Vec<Product>,
    pub demo: bool,
}

/// Display every store.
#[instrument(skip(state, page))]
pub async fn index(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let vendors = catalog::vendors(state.api()).await;
    StoresIndexTemplate {
        page,
        vendors: vendors.data,
        demo: vendors.demo,
    }
}

/// Display one store and its products.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<VendorId>,
) -> Result<impl IntoResponse> {
    let vendor = catalog::vendor(state.api(), id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("tienda {id}")))?;
    let products = catalog::products(state.api(), &ProductQuery::for_vendor(id)).await;

    Ok(StoreShowTemplate {
        page,
        vendor: vendor.data,
        products: products.data,
        demo: vendor.demo || products.demo,
    })
}
