//! Domain models for storefront.
//!
//! Per-visitor state kept in the session. The backend owns every other
//! record; its wire types live in [`crate::api::types`].

pub mod session;

pub use session::{CurrentUser, SessionUser, keys as session_keys};
