//! Chat widget service.
//!
//! Answers visitor messages through the language model and keeps the
//! transcript:
//! - Guests: in the session as a [`GuestTranscript`], discarded after 2 hours
//!   without activity.
//! - Signed-in accounts: in the session, loaded from the backend on first
//!   use and written back through [`HistorySync`].
//!
//! The widget never shows an error. A missing model, a disabled chatbot or
//! a failed call all answer with [`FALLBACK_REPLY`].

use chrono::Utc;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use petsgo_core::{ChatRole, ChatTurn, Conversation, GuestTranscript};

use crate::api::{ApiClient, ChatbotConfig};
use crate::claude::{ClaudeClient, Message};
use crate::models::{SessionUser, session_keys};

use super::history::HistorySync;

/// Reply used whenever the model cannot answer.
pub const FALLBACK_REPLY: &str = "Lo siento, no puedo responder en este momento. \
     Puedes escribirnos desde la sección de Soporte y te ayudaremos pronto. 🐾";

/// Longest message a visitor may send, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Rejected chat input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MessageError {
    #[error("El mensaje está vacío")]
    Empty,
    #[error("El mensaje supera los {max} caracteres")]
    TooLong { max: usize },
}

/// Trim a visitor message and check its length.
///
/// # Errors
///
/// Returns `MessageError` for blank or overlong messages.
pub fn validate_message(raw: &str) -> Result<String, MessageError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MessageError::Empty);
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(MessageError::TooLong {
            max: MAX_MESSAGE_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Model messages for a context window.
///
/// The Messages API requires the first message to come from the user, so
/// leading assistant turns (the greeting, or a window cut mid-exchange) are
/// dropped.
#[must_use]
pub fn build_messages(window: &[ChatTurn]) -> Vec<Message> {
    window
        .iter()
        .skip_while(|turn| turn.role == ChatRole::Assistant)
        .map(Message::from)
        .collect()
}

/// Chat widget service.
#[derive(Clone)]
pub struct ChatService {
    api: ApiClient,
    model: Option<ClaudeClient>,
    history: HistorySync<ApiClient>,
}

impl ChatService {
    /// Create the service. Without a model every reply is the fallback.
    #[must_use]
    pub const fn new(
        api: ApiClient,
        model: Option<ClaudeClient>,
        history: HistorySync<ApiClient>,
    ) -> Self {
        Self {
            api,
            model,
            history,
        }
    }

    /// Debounced history writer.
    #[must_use]
    pub const fn history(&self) -> &HistorySync<ApiClient> {
        &self.history
    }

    /// Chatbot settings, or the built-in defaults when the backend fails.
    pub async fn config(&self) -> ChatbotConfig {
        match self.api.chatbot_config().await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Using default chatbot config");
                ChatbotConfig::default()
            }
        }
    }

    /// Answer the latest user turn of `conversation`.
    #[instrument(skip(self, conversation), fields(turns = conversation.len()))]
    pub async fn reply(&self, conversation: &Conversation) -> String {
        let Some(model) = &self.model else {
            tracing::debug!("No language model configured");
            return FALLBACK_REPLY.to_string();
        };

        let config = self.config().await;
        if !config.enabled {
            return FALLBACK_REPLY.to_string();
        }

        let messages = build_messages(conversation.context_window());
        if messages.is_empty() {
            return FALLBACK_REPLY.to_string();
        }

        let system = Some(config.system_prompt).filter(|s| !s.trim().is_empty());
        match model.chat(messages, system).await {
            Ok(response) => {
                let text = response.text();
                let text = text.trim();
                if text.is_empty() {
                    tracing::warn!("Model returned no text");
                    FALLBACK_REPLY.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Model call failed");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Current transcript of the visitor.
    pub async fn load(&self, session: &Session, user: Option<&SessionUser>) -> Conversation {
        match user {
            None => load_guest(session).await,
            Some(user) => self.load_account(session, user).await,
        }
    }

    async fn load_account(&self, session: &Session, user: &SessionUser) -> Conversation {
        if let Ok(Some(conversation)) = session
            .get::<Conversation>(session_keys::ACCOUNT_CHAT)
            .await
        {
            return conversation;
        }

        let conversation = match self.api.chat_history(&user.token).await {
            Ok(turns) => Conversation::from_turns(turns),
            Err(e) => {
                tracing::warn!(user_id = %user.user.id, error = %e, "Failed to load chat history");
                Conversation::new()
            }
        };

        if let Err(e) = session
            .insert(session_keys::ACCOUNT_CHAT, &conversation)
            .await
        {
            tracing::warn!(error = %e, "Failed to cache chat history in session");
        }
        conversation
    }

    /// Persist the visitor's transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written. Backend writes
    /// happen later and only log their failures.
    pub async fn save(
        &self,
        session: &Session,
        user: Option<&SessionUser>,
        conversation: &Conversation,
    ) -> Result<(), tower_sessions::session::Error> {
        match user {
            None => {
                let transcript = GuestTranscript::new(conversation, Utc::now());
                session.insert(session_keys::GUEST_CHAT, transcript).await
            }
            Some(user) => {
                session
                    .insert(session_keys::ACCOUNT_CHAT, conversation)
                    .await?;
                self.history
                    .schedule(
                        user.user.id,
                        user.token.clone(),
                        conversation.turns().to_vec(),
                    )
                    .await;
                Ok(())
            }
        }
    }

    /// Forget the visitor's transcript.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    pub async fn clear(
        &self,
        session: &Session,
        user: Option<&SessionUser>,
    ) -> Result<(), tower_sessions::session::Error> {
        match user {
            None => {
                session
                    .remove::<GuestTranscript>(session_keys::GUEST_CHAT)
                    .await?;
            }
            Some(user) => {
                session
                    .insert(session_keys::ACCOUNT_CHAT, Conversation::new())
                    .await?;
                self.history.cancel(user.user.id).await;
                if let Err(e) = self.api.clear_chat_history(&user.token).await {
                    tracing::warn!(user_id = %user.user.id, error = %e, "Failed to clear chat history");
                }
            }
        }
        Ok(())
    }
}

/// Guest transcript, discarding it once expired.
async fn load_guest(session: &Session) -> Conversation {
    let transcript = session
        .get::<GuestTranscript>(session_keys::GUEST_CHAT)
        .await
        .ok()
        .flatten();

    let Some(transcript) = transcript else {
        return Conversation::new();
    };

    if let Some(conversation) = transcript.restore(Utc::now()) {
        return conversation;
    }

    tracing::debug!("Guest chat transcript expired");
    if let Err(e) = session
        .remove::<GuestTranscript>(session_keys::GUEST_CHAT)
        .await
    {
        tracing::warn!(error = %e, "Failed to drop expired guest transcript");
    }
    Conversation::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_message_trims() {
        assert_eq!(validate_message("  hola  "), Ok("hola".to_string()));
    }

    #[test]
    fn test_validate_message_rejects_blank() {
        assert_eq!(validate_message(" \n\t "), Err(MessageError::Empty));
    }

    #[test]
    fn test_validate_message_length_counts_chars() {
        let at_limit = "ñ".repeat(MAX_MESSAGE_CHARS);
        assert!(validate_message(&at_limit).is_ok());

        let over = "a".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(
            validate_message(&over),
            Err(MessageError::TooLong {
                max: MAX_MESSAGE_CHARS
            })
        );
    }

    #[test]
    fn test_build_messages_drops_leading_assistant_turns() {
        let window = vec![
            ChatTurn::assistant("¡Hola! Soy PetBot"),
            ChatTurn::assistant("¿En qué te ayudo?"),
            ChatTurn::user("Busco arena para gatos"),
            ChatTurn::assistant("Tenemos varias opciones"),
            ChatTurn::user("¿La más barata?"),
        ];
        let messages = build_messages(&window);
        assert_eq!(messages.len(), 3);
        assert!(messages.first().is_some_and(Message::is_user));
        assert!(messages.last().is_some_and(Message::is_user));
    }

    #[test]
    fn test_build_messages_keeps_later_assistant_turns() {
        let window = vec![ChatTurn::user("a"), ChatTurn::assistant("b")];
        let roles: Vec<_> = build_messages(&window)
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec!["user", "assistant"]);
    }

    #[test]
    fn test_build_messages_all_assistant_is_empty() {
        assert!(build_messages(&[ChatTurn::assistant("hola")]).is_empty());
    }
}
