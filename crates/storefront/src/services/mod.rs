//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart persistence in the visitor session
//! - `catalog` - Catalog reads falling back to the demo catalogue
//! - `chat` - Chat widget: replies from the language model and transcript
//!   storage for guests and signed-in accounts
//! - `history` - Debounced writer of account transcripts to the backend

pub mod cart;
pub mod catalog;
pub mod chat;
pub mod history;

pub use chat::{ChatService, FALLBACK_REPLY, MAX_MESSAGE_CHARS, MessageError, validate_message};
pub use history::{HistorySink, HistorySync};
