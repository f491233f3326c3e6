//! Chat widget JSON API.
//!
//! Guests and signed-in accounts share these endpoints; [`ChatService`]
//! decides where the transcript lives.
//!
//! [`ChatService`]: crate::services::ChatService

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use petsgo_core::ChatTurn;

use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::services::validate_message;
use crate::state::AppState;

/// Widget bootstrap payload.
#[derive(Debug, Serialize)]
pub struct ChatBootstrap {
    pub enabled: bool,
    pub bot_name: String,
    pub greeting: String,
    pub messages: Vec<ChatTurn>,
}

/// Message sent from the widget.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub message: String,
}

/// Assistant answer.
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub reply: String,
}

/// Error body for rejected messages.
#[derive(Debug, Serialize)]
pub struct ChatErrorBody {
    pub error: String,
}

/// Settings and transcript for the widget.
#[instrument(skip_all, fields(signed_in = visitor.is_some()))]
pub async fn bootstrap(
    State(state): State<AppState>,
    OptionalAuth(visitor): OptionalAuth,
    session: Session,
) -> Json<ChatBootstrap> {
    let chat = state.chat();
    let (config, conversation) = tokio::join!(chat.config(), chat.load(&session, visitor.as_ref()));

    Json(ChatBootstrap {
        enabled: config.enabled,
        bot_name: config.bot_name,
        greeting: config.greeting,
        messages: conversation.into_turns(),
    })
}

/// Send a message and answer it.
#[instrument(skip_all, fields(signed_in = visitor.is_some()))]
pub async fn send(
    State(state): State<AppState>,
    OptionalAuth(visitor): OptionalAuth,
    session: Session,
    Json(request): Json<SendRequest>,
) -> Result<Response> {
    let message = match validate_message(&request.message) {
        Ok(message) => message,
        Err(e) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ChatErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response());
        }
    };

    let chat = state.chat();
    let mut conversation = chat.load(&session, visitor.as_ref()).await;
    conversation.push_user(message);

    let reply = chat.reply(&conversation).await;
    conversation.push_assistant(reply.clone());

    chat.save(&session, visitor.as_ref(), &conversation).await?;

    Ok(Json(SendResponse { reply }).into_response())
}

/// Forget the transcript.
#[instrument(skip_all, fields(signed_in = visitor.is_some()))]
pub async fn clear(
    State(state): State<AppState>,
    OptionalAuth(visitor): OptionalAuth,
    session: Session,
) -> Result<StatusCode> {
    state.chat().clear(&session, visitor.as_ref()).await?;
    Ok(StatusCode::NO_CONTENT)
}
