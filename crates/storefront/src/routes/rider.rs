//! Rider dashboard route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use petsgo_core::{OrderId, OrderStatus};

use crate::api::{Order, RiderStats};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireRider};
use crate::state::AppState;

/// Delivery status form data.
#[derive(Debug, Deserialize)]
pub struct DeliveryStatusForm {
    pub status: String,
}

/// Rider dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "rider/dashboard.html")]
pub struct RiderDashboardTemplate {
    pub page: PageContext,
    pub deliveries: Vec<Order>,
    pub stats: RiderStats,
}

/// Check that a rider may move `current` to the requested status.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for unknown statuses and for anything
/// other than the next step of the delivery.
pub fn validate_transition(current: OrderStatus, requested: &str) -> Result<OrderStatus> {
    let target: OrderStatus = requested.parse().map_err(AppError::BadRequest)?;
    if current.can_rider_advance_to(target) {
        Ok(target)
    } else {
        Err(AppError::BadRequest(format!(
            "No se puede pasar de {} a {}",
            current.label(),
            target.label()
        )))
    }
}

/// Display assigned deliveries and the rider's figures.
#[instrument(skip_all, fields(user_id = %rider.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireRider(rider): RequireRider,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let (deliveries, stats) = tokio::join!(
        state.api().rider_deliveries(&rider.token),
        state.api().rider_stats(&rider.token),
    );

    let stats = stats.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load rider stats");
        RiderStats::default()
    });

    Ok(RiderDashboardTemplate {
        page,
        deliveries: deliveries?,
        stats,
    })
}

/// Advance one of the rider's deliveries.
#[instrument(skip_all, fields(user_id = %rider.user.id, order_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireRider(rider): RequireRider,
    Path(id): Path<OrderId>,
    Form(form): Form<DeliveryStatusForm>,
) -> Result<impl IntoResponse> {
    let deliveries = state.api().rider_deliveries(&rider.token).await?;
    let delivery = deliveries
        .iter()
        .find(|order| order.id == id)
        .ok_or_else(|| AppError::NotFound(format!("entrega {id}")))?;

    let target = validate_transition(delivery.status, &form.status)?;
    state
        .api()
        .update_delivery_status(&rider.token, id, target)
        .await?;

    tracing::info!(
        from = delivery.status.as_str(),
        to = target.as_str(),
        "Delivery advanced"
    );
    Ok(Redirect::to("/rider"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rider_moves_delivery_forward() {
        assert!(matches!(
            validate_transition(OrderStatus::Ready, "in_transit"),
            Ok(OrderStatus::InTransit)
        ));
        assert!(matches!(
            validate_transition(OrderStatus::InTransit, "delivered"),
            Ok(OrderStatus::Delivered)
        ));
    }

    #[test]
    fn test_rider_cannot_skip_or_go_back() {
        assert!(matches!(
            validate_transition(OrderStatus::Ready, "delivered"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_transition(OrderStatus::Delivered, "in_transit"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_transition(OrderStatus::Ready, "volando"),
            Err(AppError::BadRequest(_))
        ));
    }
}
