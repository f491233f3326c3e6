//! Chat widget transcripts.
//!
//! A conversation is an ordered list of turns. Only the most recent
//! [`CONTEXT_WINDOW`] turns are ever sent to the language model. Guests keep
//! their transcript in a [`GuestTranscript`], which expires two hours after
//! it was last saved.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Number of most recent turns sent to the model as context.
pub const CONTEXT_WINDOW: usize = 20;

/// Lifetime of a guest transcript, counted from its last save.
pub const GUEST_TRANSCRIPT_TTL_SECS: i64 = 2 * 60 * 60;

/// Who wrote a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name used by the model API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    /// A turn written by the visitor.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// A turn written by the assistant.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// An ordered chat transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Conversation {
    /// An empty conversation.
    #[must_use]
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Wrap existing turns.
    #[must_use]
    pub const fn from_turns(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }

    /// Append a visitor turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn::assistant(content));
    }

    /// All turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Consume into the turns.
    #[must_use]
    pub fn into_turns(self) -> Vec<ChatTurn> {
        self.turns
    }

    /// Number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether there are no turns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// The most recent [`CONTEXT_WINDOW`] turns, oldest first.
    #[must_use]
    pub fn context_window(&self) -> &[ChatTurn] {
        let start = self.turns.len().saturating_sub(CONTEXT_WINDOW);
        self.turns.get(start..).unwrap_or_default()
    }
}

/// A guest's cached transcript and when it was last saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestTranscript {
    pub saved_at: DateTime<Utc>,
    pub turns: Vec<ChatTurn>,
}

impl GuestTranscript {
    /// Snapshot a conversation at `now`.
    #[must_use]
    pub fn new(conversation: &Conversation, now: DateTime<Utc>) -> Self {
        Self {
            saved_at: now,
            turns: conversation.turns().to_vec(),
        }
    }

    /// How long a guest transcript lives.
    #[must_use]
    pub fn ttl() -> Duration {
        Duration::seconds(GUEST_TRANSCRIPT_TTL_SECS)
    }

    /// Whether the transcript is too old to restore.
    ///
    /// A `saved_at` in the future (clock skew) never counts as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.saved_at) >= Self::ttl()
    }

    /// The cached conversation, or `None` once expired.
    #[must_use]
    pub fn restore(self, now: DateTime<Utc>) -> Option<Conversation> {
        if self.is_expired(now) {
            None
        } else {
            Some(Conversation::from_turns(self.turns))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn conversation_with(n: usize) -> Conversation {
        let mut conversation = Conversation::new();
        for i in 0..n {
            if i % 2 == 0 {
                conversation.push_user(format!("pregunta {i}"));
            } else {
                conversation.push_assistant(format!("respuesta {i}"));
            }
        }
        conversation
    }

    #[test]
    fn test_context_window_keeps_most_recent_twenty() {
        let conversation = conversation_with(25);
        let window = conversation.context_window();

        assert_eq!(window.len(), CONTEXT_WINDOW);
        assert_eq!(window[0].content, "respuesta 5");
        assert_eq!(window[CONTEXT_WINDOW - 1].content, "pregunta 24");
    }

    #[test]
    fn test_context_window_short_conversation() {
        let conversation = conversation_with(3);
        assert_eq!(conversation.context_window().len(), 3);
        assert!(Conversation::new().context_window().is_empty());
    }

    #[test]
    fn test_guest_transcript_expires_after_two_hours() {
        let saved = Utc::now();
        let transcript = GuestTranscript::new(&conversation_with(2), saved);

        assert!(!transcript.is_expired(saved + Duration::minutes(119)));
        assert!(transcript.is_expired(saved + Duration::hours(2)));
        assert!(transcript.is_expired(saved + Duration::hours(5)));
    }

    #[test]
    fn test_guest_transcript_from_the_future_is_fresh() {
        let now = Utc::now();
        let transcript = GuestTranscript::new(&conversation_with(1), now + Duration::hours(3));
        assert!(!transcript.is_expired(now));
    }

    #[test]
    fn test_restore() {
        let saved = Utc::now();
        let transcript = GuestTranscript::new(&conversation_with(4), saved);

        let restored = transcript.clone().restore(saved + Duration::minutes(30));
        assert_eq!(restored.map(|c| c.len()), Some(4));

        assert!(transcript.restore(saved + Duration::hours(3)).is_none());
    }

    #[test]
    fn test_turn_wire_format() {
        let json = serde_json::to_string(&ChatTurn::user("hola")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hola"}"#);

        let conversation: Conversation =
            serde_json::from_str(r#"[{"role":"assistant","content":"¡Hola!"}]"#).unwrap();
        assert_eq!(conversation.turns()[0].role, ChatRole::Assistant);
    }
}
