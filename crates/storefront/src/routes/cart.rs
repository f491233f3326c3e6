//! Cart route handlers.
//!
//! The cart lives in the visitor session. Mutations answer HTMX requests
//! with the count badge fragment plus an `HX-Trigger: cart-updated` header;
//! plain form posts are redirected back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use petsgo_core::{Cart, CartItem, CartLine, Price, ProductId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::PageContext;
use crate::services::{cart as cart_store, catalog};
use crate::state::AppState;

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Helpers
// =============================================================================

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// Response after a cart mutation.
fn after_change(headers: &HeaderMap, cart: &Cart) -> Response {
    if is_htmx(headers) {
        (
            AppendHeaders([("HX-Trigger", "cart-updated")]),
            CartCountTemplate {
                count: cart.item_count(),
            },
        )
            .into_response()
    } else {
        Redirect::to("/carrito").into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(session, page))]
pub async fn show(session: Session, page: PageContext) -> impl IntoResponse {
    let cart = cart_store::load(&session).await;
    CartShowTemplate {
        page,
        subtotal: cart.subtotal(),
        lines: cart.lines().to_vec(),
    }
}

/// Add a product to the cart.
///
/// The product is looked up so the cart records its current name and price;
/// demo products can be added while the backend is down.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let product = catalog::product(state.api(), form.product_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("producto {}", form.product_id)))?
        .data;

    if product.is_out_of_stock() {
        return Ok((StatusCode::CONFLICT, "Producto sin stock").into_response());
    }

    let item = CartItem {
        product_id: product.id,
        name: product.name,
        unit_price: product.price,
        vendor_id: product.vendor_id,
        image_url: product.image_url,
    };

    let mut cart = cart_store::load(&session).await;
    cart.add(item, form.quantity.unwrap_or(1));
    cart_store::store(&session, &cart).await?;

    let product_id = form.product_id.to_string();
    add_breadcrumb("cart", "Added product", Some(&[("product_id", product_id.as_str())]));

    Ok(after_change(&headers, &cart))
}

/// Set a line's quantity; 0 removes it.
#[instrument(skip(session, headers))]
pub async fn update(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    let mut cart = cart_store::load(&session).await;
    if cart.set_quantity(form.product_id, form.quantity) {
        cart_store::store(&session, &cart).await?;
    }
    Ok(after_change(&headers, &cart))
}

/// Remove a line from the cart.
#[instrument(skip(session, headers))]
pub async fn remove(
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = cart_store::load(&session).await;
    if cart.remove(form.product_id) {
        cart_store::store(&session, &cart).await?;
    }
    Ok(after_change(&headers, &cart))
}

/// Empty the cart.
#[instrument(skip(session, headers))]
pub async fn clear(session: Session, headers: HeaderMap) -> Result<Response> {
    let cart = Cart::default();
    cart_store::store(&session, &cart).await?;
    Ok(after_change(&headers, &cart))
}

/// Cart count badge (HTMX fragment).
pub async fn count(session: Session) -> impl IntoResponse {
    CartCountTemplate {
        count: cart_store::load(&session).await.item_count(),
    }
}
