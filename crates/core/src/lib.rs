//! PetsGo Core - Shared domain types.
//!
//! This crate holds the types shared by the storefront and its tests:
//! - [`types`] - Newtype ids, prices, emails, roles, statuses and tokens
//! - [`cart`] - The shopping-cart state container
//! - [`chat`] - Chat transcripts and the guest chat cache
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no sessions. The storefront decides where these values live.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod chat;
pub mod types;

pub use cart::{Cart, CartItem, CartLine, MAX_LINE_QUANTITY};
pub use chat::{CONTEXT_WINDOW, ChatRole, ChatTurn, Conversation, GuestTranscript};
pub use types::*;
