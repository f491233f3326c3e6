//! Backend bearer token.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque bearer token issued by the backend at login.
///
/// Serializes transparently so it can be stored in the session as-is, but
/// never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BearerToken(String);

impl BearerToken {
    /// Wrap a raw token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts() {
        let token = BearerToken::new("abc.def.ghi");
        assert!(!format!("{token:?}").contains("abc"));
        assert_eq!(token.expose(), "abc.def.ghi");
    }

    #[test]
    fn test_serializes_verbatim() {
        let token = BearerToken::new("abc");
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"abc\"");
    }
}
