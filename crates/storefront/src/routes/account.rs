//! Account route handlers.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use petsgo_core::OrderId;

use crate::api::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::state::AppState;

/// Query parameters of the order history.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// Order just placed at checkout.
    pub pedido: Option<OrderId>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
    pub placed: Option<OrderId>,
}

/// Display the signed-in account's orders.
#[instrument(skip_all, fields(user_id = %visitor.user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(visitor): RequireAuth,
    page: PageContext,
    Query(query): Query<OrdersQuery>,
) -> Result<impl IntoResponse> {
    let orders = state.api().my_orders(&visitor.token).await?;

    Ok(OrdersTemplate {
        page,
        orders,
        placed: query.pedido,
    })
}
