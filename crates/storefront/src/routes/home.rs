//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::api::{Category, Product, ProductQuery, Vendor};
use crate::filters;
use crate::middleware::PageContext;
use crate::services::catalog;
use crate::state::AppState;

const FEATURED_PRODUCTS: usize = 8;
const FEATURED_STORES: usize = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub vendors: Vec<Vendor>,
    pub demo: bool,
}

/// Display the home page.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let api = state.api();
    let query = ProductQuery::default();
    let (categories, products, vendors) = tokio::join!(
        catalog::categories(api),
        catalog::products(api, &query),
        catalog::vendors(api),
    );

    HomeTemplate {
        page,
        demo: categories.demo || products.demo || vendors.demo,
        categories: categories.data,
        products: products.data.into_iter().take(FEATURED_PRODUCTS).collect(),
        vendors: vendors.data.into_iter().take(FEATURED_STORES).collect(),
    }
}
