//! Application state shared across handlers.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::StorefrontConfig;
use crate::services::{ChatService, HistorySync};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("backend client: {0}")]
    Api(#[from] ApiError),
    #[error("language model client: {0}")]
    Claude(#[from] ClaudeError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration, the backend client and the chat service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    api: ApiClient,
    chat: ChatService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Must be called inside a Tokio runtime: the chat history writer
    /// spawns its tasks there.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let api = ApiClient::new(&config.api)?;
        let model = config.chat.as_ref().map(ClaudeClient::new).transpose()?;
        if model.is_none() {
            tracing::warn!("ANTHROPIC_API_KEY not set, chat widget answers with the fallback reply");
        }

        let history = HistorySync::new(api.clone(), config.chat_history_debounce);
        let chat = ChatService::new(api.clone(), model, history);

        Ok(Self {
            inner: Arc::new(AppStateInner { config, api, chat }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the chat widget service.
    #[must_use]
    pub fn chat(&self) -> &ChatService {
        &self.inner.chat
    }
}
