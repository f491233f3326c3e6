//! Anthropic Messages API client backing the chat widget.
//!
//! Non-streaming only: the widget posts a message and waits for the whole
//! reply. Conversation storage lives in [`crate::services::chat`].

mod client;
mod error;
mod types;

pub use client::ClaudeClient;
pub use error::{ApiErrorResponse, ClaudeError};
pub use types::{ChatRequest, ChatResponse, ContentBlock, Message, StopReason, Usage};
