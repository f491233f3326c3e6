//! Admin panel route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use petsgo_core::{TicketId, TicketStatus, VendorId};

use crate::api::{AdminStats, Ticket, Vendor};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::state::AppState;

use super::vendor::VendorDashboardTemplate;

/// Statuses an admin may set on a ticket.
pub const TICKET_STATUSES: &[TicketStatus] = &[
    TicketStatus::Open,
    TicketStatus::InProgress,
    TicketStatus::Resolved,
    TicketStatus::Closed,
];

/// Ticket status form data.
#[derive(Debug, Deserialize)]
pub struct TicketStatusForm {
    pub status: String,
}

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct AdminDashboardTemplate {
    pub page: PageContext,
    pub stats: AdminStats,
}

/// Store list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/vendors.html")]
pub struct AdminVendorsTemplate {
    pub page: PageContext,
    pub vendors: Vec<Vendor>,
}

/// Ticket queue template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/tickets.html")]
pub struct AdminTicketsTemplate {
    pub page: PageContext,
    pub tickets: Vec<Ticket>,
    pub statuses: &'static [TicketStatus],
}

/// Display marketplace statistics.
#[instrument(skip_all, fields(user_id = %admin.user.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let stats = state.api().admin_dashboard(&admin.token).await?;
    Ok(AdminDashboardTemplate { page, stats })
}

/// Display every store.
#[instrument(skip_all, fields(user_id = %admin.user.id))]
pub async fn vendors(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let vendors = state.api().admin_vendors(&admin.token).await?;
    Ok(AdminVendorsTemplate { page, vendors })
}

/// Display a store's dashboard as its owner sees it, without actions.
#[instrument(skip_all, fields(user_id = %admin.user.id, vendor_id = %id))]
pub async fn impersonate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<VendorId>,
) -> Result<impl IntoResponse> {
    let dashboard = state.api().admin_vendor_dashboard(&admin.token, id).await?;
    let vendor_id = id.to_string();
    add_breadcrumb(
        "admin",
        "Viewing store dashboard",
        Some(&[("vendor_id", vendor_id.as_str())]),
    );
    Ok(VendorDashboardTemplate {
        page,
        dashboard,
        read_only: true,
    })
}

/// Display every ticket.
#[instrument(skip_all, fields(user_id = %admin.user.id))]
pub async fn tickets(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let tickets = state.api().admin_tickets(&admin.token).await?;
    Ok(AdminTicketsTemplate {
        page,
        tickets,
        statuses: TICKET_STATUSES,
    })
}

/// Change a ticket's status.
#[instrument(skip_all, fields(user_id = %admin.user.id, ticket_id = %id))]
pub async fn update_ticket_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<TicketId>,
    Form(form): Form<TicketStatusForm>,
) -> Result<impl IntoResponse> {
    let status: TicketStatus = form.status.parse().map_err(AppError::BadRequest)?;
    state
        .api()
        .update_ticket_status(&admin.token, id, status)
        .await?;
    tracing::info!(status = status.as_str(), "Ticket status changed");
    Ok(Redirect::to("/admin/soporte"))
}
