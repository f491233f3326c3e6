//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PETSGO_BASE_URL` - Public URL for the storefront
//! - `PETSGO_API_URL` - Base URL of the PetsGo REST backend
//!
//! ## Optional
//! - `PETSGO_HOST` - Bind address (default: 127.0.0.1)
//! - `PETSGO_PORT` - Listen port (default: 3000)
//! - `PETSGO_API_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `PETSGO_STATIC_DIR` - Static assets directory (default: crates/storefront/static)
//! - `PETSGO_CHAT_DEBOUNCE_MS` - Chat history sync debounce (default: 1500)
//! - `ANTHROPIC_API_KEY` - Language model key; without it the chat widget
//!   answers with a fixed fallback message
//! - `ANTHROPIC_MODEL` - Model name (default: claude-3-5-haiku-latest)
//! - `ANTHROPIC_API_URL` - Messages endpoint override
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default language model.
pub const DEFAULT_CHAT_MODEL: &str = "claude-3-5-haiku-latest";

/// Default Anthropic Messages API endpoint.
pub const DEFAULT_CHAT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Backend API configuration
    pub api: BackendConfig,
    /// Language model configuration (None disables the model)
    pub chat: Option<ChatModelConfig>,
    /// Quiet period before a chat transcript is written to the backend
    pub chat_history_debounce: Duration,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// PetsGo REST backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Language model configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ChatModelConfig {
    /// Anthropic API key
    pub api_key: SecretString,
    /// Model name
    pub model: String,
    /// Messages endpoint
    pub api_url: String,
}

impl std::fmt::Debug for ChatModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModelConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the model API key fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("PETSGO_HOST", "127.0.0.1")?;
        let port = parse_env("PETSGO_PORT", "3000")?;
        let base_url = get_url("PETSGO_BASE_URL")?;
        let api = BackendConfig::from_env()?;
        let chat = ChatModelConfig::from_env()?;
        let debounce_ms: u64 = parse_env("PETSGO_CHAT_DEBOUNCE_MS", "1500")?;
        let static_dir = PathBuf::from(get_env_or_default(
            "PETSGO_STATIC_DIR",
            "crates/storefront/static",
        ));

        Ok(Self {
            host,
            port,
            base_url,
            api,
            chat,
            chat_history_debounce: Duration::from_millis(debounce_ms),
            static_dir,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the public URL is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = parse_env("PETSGO_API_TIMEOUT_SECS", "15")?;
        Ok(Self {
            base_url: get_url("PETSGO_API_URL")?,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl ChatModelConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("ANTHROPIC_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "ANTHROPIC_API_KEY")?;

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            model: get_env_or_default("ANTHROPIC_MODEL", DEFAULT_CHAT_MODEL),
            api_url: get_env_or_default("ANTHROPIC_API_URL", DEFAULT_CHAT_API_URL),
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable (empty counts as unset).
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get a required absolute URL, normalized without a trailing slash.
fn get_url(key: &str) -> Result<String, ConfigError> {
    let value = get_required_env(key)?;
    normalize_url(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

fn normalize_url(value: &str) -> Result<String, String> {
    let url = Url::parse(value.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > 3.3);
    }

    #[test]
    fn test_placeholder_api_key_rejected() {
        let result = validate_secret_strength("your-anthropic-key", "ANTHROPIC_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_low_entropy_api_key_rejected() {
        let result = validate_secret_strength(&"k".repeat(40), "ANTHROPIC_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_real_looking_api_key_accepted() {
        assert!(validate_secret_strength("sk-ant-aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "K").is_ok());
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("https://api.petsgo.cl/wp-json/petsgo/v1/").unwrap(),
            "https://api.petsgo.cl/wp-json/petsgo/v1"
        );
        assert!(normalize_url("ftp://petsgo.cl").is_err());
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_chat_config_debug_redacts_key() {
        let config = ChatModelConfig {
            api_key: SecretString::from("sk-super-secret-value"),
            model: DEFAULT_CHAT_MODEL.to_string(),
            api_url: DEFAULT_CHAT_API_URL.to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(debug_output.contains(DEFAULT_CHAT_MODEL));
        assert!(!debug_output.contains("sk-super-secret-value"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            api: BackendConfig {
                base_url: "http://localhost:8080".to_string(),
                timeout: Duration::from_secs(5),
            },
            chat: None,
            chat_history_debounce: Duration::from_millis(1500),
            static_dir: PathBuf::from("static"),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }
}
