//! Claude API client for chat widget replies.

use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::ChatModelConfig;

use super::error::{ApiErrorResponse, ClaudeError};
use super::types::{ChatRequest, ChatResponse, Message};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Claude API client.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
    api_url: String,
}

impl ClaudeClient {
    /// Create a new Claude client.
    ///
    /// # Errors
    ///
    /// Returns `ClaudeError::InvalidKey` if the API key contains characters
    /// that cannot go in a header, or an HTTP error if the client cannot be
    /// built.
    pub fn new(config: &ChatModelConfig) -> Result<Self, ClaudeError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| ClaudeError::InvalidKey)?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
                api_url: config.api_url.clone(),
            }),
        })
    }

    /// Send a conversation and get the complete reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns an error response.
    #[instrument(skip(self, messages, system), fields(model = %self.inner.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
    ) -> Result<ChatResponse, ClaudeError> {
        let request = ChatRequest {
            model: self.inner.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            messages,
            system,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.api_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))?;

        tracing::debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Model reply received"
        );
        Ok(parsed)
    }
}

/// Turn an error status into a `ClaudeError`.
async fn error_from_response(status: StatusCode, response: reqwest::Response) -> ClaudeError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return ClaudeError::RateLimited(retry_after);
    }

    if status == StatusCode::UNAUTHORIZED {
        return ClaudeError::Unauthorized("Invalid API key".to_string());
    }

    match response.text().await {
        Ok(body) => serde_json::from_str::<ApiErrorResponse>(&body).map_or_else(
            |_| ClaudeError::Api {
                error_type: status.as_str().to_string(),
                message: body.chars().take(200).collect(),
            },
            |api_error| ClaudeError::Api {
                error_type: api_error.error.error_type,
                message: api_error.error.message,
            },
        ),
        Err(e) => ClaudeError::Http(e),
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_claude_client_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<ClaudeClient>();
    }

    #[test]
    fn test_claude_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClaudeClient>();
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let config = ChatModelConfig {
            api_key: SecretString::from("sk-ant-abc\ndef"),
            model: "claude-3-5-haiku-latest".to_string(),
            api_url: "http://127.0.0.1:9/v1/messages".to_string(),
        };
        assert!(matches!(
            ClaudeClient::new(&config),
            Err(ClaudeError::InvalidKey)
        ));
    }
}
