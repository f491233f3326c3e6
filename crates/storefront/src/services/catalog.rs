//! Catalog reads with the demo fallback.
//!
//! Pages never fail because the backend is down: any error other than a
//! definite "not found" is logged and the built-in catalogue is served
//! instead, flagged so the page can say so.

use petsgo_core::{ProductId, VendorId};

use crate::api::{ApiClient, ApiError, Category, Product, ProductQuery, Vendor};
use crate::fallback;

/// Catalog data and whether it came from the demo catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub data: T,
    pub demo: bool,
}

impl<T> Loaded<T> {
    const fn live(data: T) -> Self {
        Self { data, demo: false }
    }

    const fn demo(data: T) -> Self {
        Self { data, demo: true }
    }
}

fn log_fallback(what: &str, error: &ApiError) {
    tracing::warn!(error = %error, "Backend unavailable for {what}, serving demo data");
}

/// Products matching `query`.
pub async fn products(api: &ApiClient, query: &ProductQuery) -> Loaded<Vec<Product>> {
    match api.products(query).await {
        Ok(products) => Loaded::live(products),
        Err(e) => {
            log_fallback("products", &e);
            Loaded::demo(fallback::search(query))
        }
    }
}

/// One product; `None` when it does not exist.
pub async fn product(api: &ApiClient, id: ProductId) -> Option<Loaded<Product>> {
    match api.product(id).await {
        Ok(product) => Some(Loaded::live(product)),
        Err(ApiError::NotFound(_)) => None,
        Err(e) => {
            log_fallback("product", &e);
            fallback::product_by_id(id).map(Loaded::demo)
        }
    }
}

/// All stores.
pub async fn vendors(api: &ApiClient) -> Loaded<Vec<Vendor>> {
    match api.vendors().await {
        Ok(vendors) => Loaded::live(vendors),
        Err(e) => {
            log_fallback("vendors", &e);
            Loaded::demo(fallback::vendors())
        }
    }
}

/// One store; `None` when it does not exist.
pub async fn vendor(api: &ApiClient, id: VendorId) -> Option<Loaded<Vendor>> {
    match api.vendor(id).await {
        Ok(vendor) => Some(Loaded::live(vendor)),
        Err(ApiError::NotFound(_)) => None,
        Err(e) => {
            log_fallback("vendor", &e);
            fallback::vendor_by_id(id).map(Loaded::demo)
        }
    }
}

/// Product categories.
pub async fn categories(api: &ApiClient) -> Loaded<Vec<Category>> {
    match api.categories().await {
        Ok(categories) => Loaded::live(categories),
        Err(e) => {
            log_fallback("categories", &e);
            Loaded::demo(fallback::categories())
        }
    }
}
