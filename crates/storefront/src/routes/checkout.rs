//! Checkout route handlers.
//!
//! The whole cart goes to the backend as one order request; splitting it
//! per store, pricing delivery and payment are the backend's job.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use petsgo_core::{Cart, CartLine, Price};

use crate::api::{OrderLineRequest, OrderRequest};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::services::cart as cart_store;
use crate::state::AppState;

/// Accepted payment methods: (form value, label).
pub const PAYMENT_METHODS: &[(&str, &str)] = &[
    ("webpay", "Webpay (débito o crédito)"),
    ("transfer", "Transferencia bancaria"),
    ("cash", "Efectivo contra entrega"),
];

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub notes: String,
}

impl CheckoutForm {
    /// Whether `value` is the selected payment method.
    #[must_use]
    pub fn is_payment(&self, value: &str) -> bool {
        self.payment_method == value
    }

    /// Build the order request, or say what is missing.
    ///
    /// # Errors
    ///
    /// Returns a message for the visitor when a field is blank or the
    /// payment method is unknown.
    pub fn to_order(&self, cart: &Cart) -> std::result::Result<OrderRequest, &'static str> {
        let shipping_address = self.shipping_address.trim();
        let phone = self.phone.trim();
        let payment_method = self.payment_method.trim();

        if shipping_address.is_empty() {
            return Err("Ingresa una dirección de despacho.");
        }
        if phone.is_empty() {
            return Err("Ingresa un teléfono de contacto.");
        }
        if !PAYMENT_METHODS.iter().any(|(value, _)| *value == payment_method) {
            return Err("Selecciona un medio de pago.");
        }

        let notes = self.notes.trim();
        Ok(OrderRequest {
            items: cart
                .lines()
                .iter()
                .map(|line| OrderLineRequest {
                    product_id: line.item.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            shipping_address: shipping_address.to_string(),
            phone: phone.to_string(),
            payment_method: payment_method.to_string(),
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub store_count: usize,
    pub payment_methods: &'static [(&'static str, &'static str)],
    pub form: CheckoutForm,
    pub error: Option<String>,
}

impl CheckoutTemplate {
    fn new(page: PageContext, cart: &Cart, form: CheckoutForm, error: Option<String>) -> Self {
        Self {
            page,
            lines: cart.lines().to_vec(),
            subtotal: cart.subtotal(),
            store_count: cart.vendor_ids().len(),
            payment_methods: PAYMENT_METHODS,
            form,
            error,
        }
    }
}

/// Display the order summary and shipping form.
#[instrument(skip_all)]
pub async fn show(_auth: RequireAuth, session: Session, page: PageContext) -> Response {
    let cart = cart_store::load(&session).await;
    if cart.is_empty() {
        return Redirect::to("/carrito").into_response();
    }
    CheckoutTemplate::new(page, &cart, CheckoutForm::default(), None).into_response()
}

/// Place the order, empty the cart and show the order history.
#[instrument(skip_all, fields(user_id = %visitor.user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    RequireAuth(visitor): RequireAuth,
    session: Session,
    page: PageContext,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let mut cart = cart_store::load(&session).await;
    if cart.is_empty() {
        return Ok(Redirect::to("/carrito").into_response());
    }

    let order = match form.to_order(&cart) {
        Ok(order) => order,
        Err(message) => {
            return Ok(
                CheckoutTemplate::new(page, &cart, form, Some(message.to_string())).into_response(),
            );
        }
    };

    match state.api().create_order(&visitor.token, &order).await {
        Ok(created) => {
            tracing::info!(order_id = %created.id, total = %created.total, "Order placed");
            cart.clear();
            cart_store::store(&session, &cart).await?;
            Ok(Redirect::to(&format!("/mis-pedidos?pedido={}", created.id)).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Order rejected");
            let message = e.user_message();
            Ok(CheckoutTemplate::new(page, &cart, form, Some(message)).into_response())
        }
    }
}
