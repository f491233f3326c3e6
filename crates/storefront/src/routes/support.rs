//! Support ticket route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use petsgo_core::{TicketId, TicketPriority};

use crate::api::{NewTicket, Ticket, TicketDetail};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::state::AppState;

/// Ticket categories offered in the form: (value, label).
pub const CATEGORIES: &[(&str, &str)] = &[
    ("pedido", "Pedidos y despachos"),
    ("pago", "Pagos y boletas"),
    ("producto", "Productos"),
    ("cuenta", "Mi cuenta"),
    ("otro", "Otro"),
];

/// Priorities offered in the form.
pub const PRIORITIES: &[TicketPriority] = &[
    TicketPriority::Low,
    TicketPriority::Medium,
    TicketPriority::High,
    TicketPriority::Urgent,
];

/// New ticket form data.
#[derive(Debug, Default, Deserialize)]
pub struct TicketForm {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub description: String,
}

impl TicketForm {
    /// Whether `value` is the selected category.
    #[must_use]
    pub fn is_category(&self, value: &str) -> bool {
        self.category == value
    }

    /// Whether `priority` is the selected priority.
    #[must_use]
    pub fn is_priority(&self, priority: &TicketPriority) -> bool {
        self.priority == *priority
    }

    /// Validate into a backend request.
    ///
    /// # Errors
    ///
    /// Returns a message for the visitor when a field is missing.
    pub fn to_ticket(&self) -> std::result::Result<NewTicket, &'static str> {
        let subject = self.subject.trim();
        let description = self.description.trim();
        if subject.is_empty() || description.is_empty() {
            return Err("Ingresa un asunto y una descripción.");
        }
        let category = if CATEGORIES.iter().any(|(value, _)| *value == self.category) {
            self.category.clone()
        } else {
            "otro".to_string()
        };
        Ok(NewTicket {
            subject: subject.to_string(),
            category,
            priority: self.priority,
            description: description.to_string(),
        })
    }
}

/// Reply form data.
#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub message: String,
}

/// Ticket list and new-ticket form template.
#[derive(Template, WebTemplate)]
#[template(path = "support/index.html")]
pub struct SupportIndexTemplate {
    pub page: PageContext,
    pub tickets: Vec<Ticket>,
    pub categories: &'static [(&'static str, &'static str)],
    pub priorities: &'static [TicketPriority],
    pub form: TicketForm,
    pub error: Option<String>,
}

/// Ticket thread template.
#[derive(Template, WebTemplate)]
#[template(path = "support/show.html")]
pub struct SupportShowTemplate {
    pub page: PageContext,
    pub detail: TicketDetail,
    pub error: Option<String>,
}

/// Display the account's tickets.
#[instrument(skip_all, fields(user_id = %visitor.user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(visitor): RequireAuth,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let tickets = state.api().tickets(&visitor.token).await?;
    Ok(SupportIndexTemplate {
        page,
        tickets,
        categories: CATEGORIES,
        priorities: PRIORITIES,
        form: TicketForm::default(),
        error: None,
    })
}

/// Open a ticket.
#[instrument(skip_all, fields(user_id = %visitor.user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(visitor): RequireAuth,
    page: PageContext,
    Form(form): Form<TicketForm>,
) -> Result<Response> {
    let error = match form.to_ticket() {
        Ok(ticket) => match state.api().create_ticket(&visitor.token, &ticket).await {
            Ok(created) => {
                tracing::info!(ticket_id = %created.id, "Ticket opened");
                return Ok(Redirect::to(&format!("/soporte/{}", created.id)).into_response());
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ticket rejected");
                e.user_message()
            }
        },
        Err(message) => message.to_string(),
    };

    let tickets = state.api().tickets(&visitor.token).await.unwrap_or_default();
    Ok(SupportIndexTemplate {
        page,
        tickets,
        categories: CATEGORIES,
        priorities: PRIORITIES,
        form,
        error: Some(error),
    }
    .into_response())
}

/// Display a ticket thread.
#[instrument(skip_all, fields(user_id = %visitor.user.id, ticket_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(visitor): RequireAuth,
    page: PageContext,
    Path(id): Path<TicketId>,
) -> Result<impl IntoResponse> {
    let detail = state.api().ticket(&visitor.token, id).await?;
    Ok(SupportShowTemplate {
        page,
        detail,
        error: None,
    })
}

/// Reply to a ticket.
#[instrument(skip_all, fields(user_id = %visitor.user.id, ticket_id = %id))]
pub async fn reply(
    State(state): State<AppState>,
    RequireAuth(visitor): RequireAuth,
    page: PageContext,
    Path(id): Path<TicketId>,
    Form(form): Form<ReplyForm>,
) -> Result<Response> {
    let message = form.message.trim();
    let error = if message.is_empty() {
        "Escribe un mensaje.".to_string()
    } else {
        match state.api().reply_ticket(&visitor.token, id, message).await {
            Ok(_) => return Ok(Redirect::to(&format!("/soporte/{id}")).into_response()),
            Err(e) => {
                tracing::warn!(error = %e, "Ticket reply rejected");
                e.user_message()
            }
        }
    };

    let detail = state.api().ticket(&visitor.token, id).await?;
    Ok(SupportShowTemplate {
        page,
        detail,
        error: Some(error),
    }
    .into_response())
}
