//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use petsgo_core::ProductId;

use crate::api::{Category, Product, ProductQuery};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::PageContext;
use crate::services::catalog;
use crate::state::AppState;

/// Listing filters as they appear in the URL.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub categoria: Option<String>,
    pub q: Option<String>,
}

impl ListingQuery {
    /// Backend query, ignoring blank filters.
    #[must_use]
    pub fn to_product_query(&self) -> ProductQuery {
        let clean = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        ProductQuery {
            category: clean(&self.categoria),
            vendor_id: None,
            search: clean(&self.q),
        }
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
    pub selected_category: String,
    pub search: String,
    pub demo: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub page: PageContext,
    pub product: Product,
    pub demo: bool,
}

/// Display the product listing, filtered by category and search text.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    page: PageContext,
    Query(query): Query<ListingQuery>,
) -> impl IntoResponse {
    let product_query = query.to_product_query();
    let (products, categories) = tokio::join!(
        catalog::products(state.api(), &product_query),
        catalog::categories(state.api()),
    );

    ProductsIndexTemplate {
        page,
        products: products.data,
        categories: categories.data,
        selected_category: product_query.category.unwrap_or_default(),
        search: product_query.search.unwrap_or_default(),
        demo: products.demo || categories.demo,
    }
}

/// Display product detail page.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    page: PageContext,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = catalog::product(state.api(), id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("producto {id}")))?;

    Ok(ProductShowTemplate {
        page,
        product: product.data,
        demo: product.demo,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_dropped() {
        let query = ListingQuery {
            categoria: Some("  ".to_string()),
            q: Some(" collar ".to_string()),
        };
        let product_query = query.to_product_query();
        assert!(product_query.category.is_none());
        assert_eq!(product_query.search.as_deref(), Some("collar"));
    }
}
