//! # Providers
//!
//! `LlmProvider` is the only thing the workflows see. Gemini backs the
//! support personas; the OpenAI client is the alternative persona backend
//! and supplies the model settings handed to the meme automation agent.

mod config;
mod message;

pub mod gemini;
pub mod openai;

pub use config::{ProviderConfig, ProviderType};
pub use gemini::GeminiProvider;
pub use message::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, Role, Usage, UsageTracker,
};
pub use openai::OpenAIProvider;

use std::time::Duration;

/// A chat-completion backend.
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &str;

    fn default_model(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// One user message in, the reply text out
    async fn prompt(&self, prompt: &str) -> Result<String, ProviderError> {
        let response = self
            .complete(CompletionRequest::new(vec![ChatMessage::user(prompt)]))
            .await?;
        match response.content {
            Some(text) => Ok(text),
            None => Err(ProviderError::Other(format!("{} returned no text", self.name()))),
        }
    }
}

/// Failure talking to a provider, before it is folded into `solace_error::Error`
#[derive(Debug)]
pub enum ProviderError {
    /// The request never got an HTTP response
    Network(String),
    /// Non-success status not covered by a more specific variant
    Api { status: u16, message: String },
    /// The body did not match the expected schema
    Parse(String),
    RateLimited { retry_after: Option<u64> },
    /// Rejected locally before anything was sent
    InvalidRequest(String),
    ModelNotFound(String),
    AuthenticationFailed,
    Other(String),
}

impl ProviderError {
    /// Classify a non-success HTTP status
    pub(crate) fn from_status(status: u16, retry_after: Option<u64>, body: String) -> Self {
        match status {
            401 | 403 => ProviderError::AuthenticationFailed,
            404 => ProviderError::ModelNotFound(body),
            429 => ProviderError::RateLimited { retry_after },
            _ => ProviderError::Api { status, message: body },
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Network(reason) => write!(f, "provider unreachable: {}", reason),
            ProviderError::Api { status, message } => {
                write!(f, "provider answered {}: {}", status, message)
            }
            ProviderError::Parse(reason) => write!(f, "unreadable provider response: {}", reason),
            ProviderError::RateLimited { retry_after: Some(secs) } => {
                write!(f, "rate limited, retry in {}s", secs)
            }
            ProviderError::RateLimited { retry_after: None } => f.write_str("rate limited"),
            ProviderError::InvalidRequest(reason) => write!(f, "invalid request: {}", reason),
            ProviderError::ModelNotFound(body) => write!(f, "unknown model: {}", body),
            ProviderError::AuthenticationFailed => f.write_str("API key rejected"),
            ProviderError::Other(reason) => f.write_str(reason),
        }
    }
}

impl std::error::Error for ProviderError {}

pub(crate) fn build_client(config: &ProviderConfig) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| ProviderError::Other(format!("http client setup failed: {}", e)))
}

/// Send and turn any non-2xx answer into a `ProviderError`
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(status.as_u16(), retry_after, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ProviderError::from_status(403, None, String::new()),
            ProviderError::AuthenticationFailed
        ));
        assert!(matches!(
            ProviderError::from_status(404, None, "models/nope".into()),
            ProviderError::ModelNotFound(_)
        ));
        assert!(matches!(
            ProviderError::from_status(429, Some(3), String::new()),
            ProviderError::RateLimited { retry_after: Some(3) }
        ));
        assert!(matches!(
            ProviderError::from_status(500, None, "oops".into()),
            ProviderError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_error_display() {
        let err = ProviderError::RateLimited { retry_after: Some(7) };
        assert_eq!(err.to_string(), "rate limited, retry in 7s");
        assert_eq!(ProviderError::AuthenticationFailed.to_string(), "API key rejected");
    }
}
