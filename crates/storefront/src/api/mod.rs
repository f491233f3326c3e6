//! PetsGo REST backend client.
//!
//! # Architecture
//!
//! - The backend is the source of truth - NO local persistence, direct API calls
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//! - Calls made on behalf of a visitor carry their bearer token
//!
//! # Response Envelope
//!
//! Endpoints answer either `{ "data": ... }` or the bare payload. Both
//! shapes are accepted everywhere through [`Envelope`].
//!
//! # Example
//!
//! ```rust,ignore
//! use petsgo_storefront::api::{ApiClient, ProductQuery};
//!
//! let client = ApiClient::new(&config.api)?;
//! let products = client.products(&ProductQuery::default()).await?;
//! let auth = client.login("ana", "secreto").await?;
//! let orders = client.my_orders(&auth.token).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::ApiClient;
pub use types::*;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the credentials or token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Backend-provided message, or a snippet of the body.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// A message safe to show the visitor next to a form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized(_) => "Credenciales inválidas o sesión expirada.".to_string(),
            Self::NotFound(_) => "No encontramos lo que buscabas.".to_string(),
            Self::RateLimited(_) => {
                "Demasiados intentos. Espera un momento e inténtalo de nuevo.".to_string()
            }
            Self::Status { status, message } if *status < 500 && !message.is_empty() => {
                message.clone()
            }
            _ => "No pudimos conectar con PetsGo. Inténtalo más tarde.".to_string(),
        }
    }
}

/// Response payload, wrapped in `{ "data": ... }` or bare.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    /// `{ "data": payload }`
    Wrapped {
        /// The payload.
        data: T,
    },
    /// The payload itself.
    Bare(T),
}

impl<T> Envelope<T> {
    /// Unwrap the payload regardless of shape.
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_wrapped() {
        let envelope: Envelope<Vec<Category>> = serde_json::from_str(
            r#"{"data": [{"id": 1, "name": "Perros", "slug": "perros"}]}"#,
        )
        .unwrap();
        assert_eq!(envelope.into_inner().len(), 1);
    }

    #[test]
    fn test_envelope_bare() {
        let envelope: Envelope<Vec<Category>> =
            serde_json::from_str(r#"[{"id": 1, "name": "Gatos", "slug": "gatos"}]"#).unwrap();
        let categories = envelope.into_inner();
        assert_eq!(categories.first().map(|c| c.slug.as_str()), Some("gatos"));
    }

    #[test]
    fn test_envelope_bare_object() {
        let envelope: Envelope<Product> =
            serde_json::from_str(r#"{"id": 5, "name": "Collar", "price": 3990}"#).unwrap();
        assert_eq!(envelope.into_inner().name, "Collar");
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: 422,
            message: "Stock insuficiente".to_string(),
        };
        assert_eq!(err.to_string(), "Backend returned 422: Stock insuficiente");
        assert_eq!(err.user_message(), "Stock insuficiente");
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ApiError::Status {
            status: 500,
            message: "SQLSTATE[42S02]".to_string(),
        };
        assert!(!err.user_message().contains("SQLSTATE"));
    }
}
