//! Types for the Claude API.
//!
//! These types match the Anthropic Messages API format for plain text
//! conversations.

use serde::{Deserialize, Serialize};

use petsgo_core::{ChatRole, ChatTurn};

/// A message in a conversation with Claude.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role of the message sender ("user" or "assistant").
    pub role: String,
    /// The text of the message.
    pub content: String,
}

impl From<&ChatTurn> for Message {
    fn from(turn: &ChatTurn) -> Self {
        Self {
            role: turn.role.as_str().to_string(),
            content: turn.content.clone(),
        }
    }
}

impl Message {
    /// Whether this message was sent by the visitor.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User.as_str()
    }
}

/// A content block within a response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text content.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },
    /// Any block the widget cannot render (tool use, thinking).
    #[serde(other)]
    Other,
}

/// Request body for the Claude Messages API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// System prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

/// Response from the Claude Messages API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Unique response ID.
    #[serde(default)]
    pub id: String,
    /// Model that generated the response.
    #[serde(default)]
    pub model: String,
    /// Reason the response stopped.
    #[serde(default)]
    pub stop_reason: Option<StopReason>,
    /// Response content blocks.
    pub content: Vec<ContentBlock>,
    /// Token usage information.
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// Concatenated text of every text block.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Natural end of response.
    EndTurn,
    /// Max tokens reached.
    MaxTokens,
    /// Stop sequence encountered.
    StopSequence,
    /// Tool use requested.
    ToolUse,
    /// Anything newer than this client.
    #[serde(other)]
    Other,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Usage {
    /// Number of input tokens.
    #[serde(default)]
    pub input_tokens: u32,
    /// Number of output tokens.
    #[serde(default)]
    pub output_tokens: u32,
}
