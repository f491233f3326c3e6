//! Core types for PetsGo.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod role;
pub mod status;
pub mod token;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use role::{Area, Role};
pub use status::*;
pub use token::BearerToken;
