/// Groq HTTP client implementation.
///
/// This module provides `GroqClient` for opening streamed chat completions with
/// synchronous HTTP requests, along with error types and a builder for
/// configuration.
use std::io::BufReader;
use std::time::Duration;

use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::debug;

use super::stream::SseFragments;
use super::types::{ChatRequest, ErrorEnvelope};
use crate::config::Credential;

/// Default base URL of the OpenAI-compatible Groq API.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Ordered, finite sequence of generated text fragments.
pub type FragmentStream = Box<dyn Iterator<Item = Result<String, GroqError>> + Send>;

/// Errors that can occur when talking to the generation backend.
#[derive(Debug, Error)]
pub enum GroqError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Request timed out")]
    Timeout(#[source] reqwest::Error),

    /// Non-success HTTP status, with the backend's message when it sent one
    #[error("HTTP error: status {status}: {message}")]
    Http { status: u16, message: String },

    /// A stream frame could not be decoded
    #[error("Malformed stream chunk: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The backend reported an error inside the stream
    #[error("Groq API error: {message}")]
    Api { message: String },

    /// Reading the response body failed mid-stream
    #[error("Stream read error: {0}")]
    Io(#[source] std::io::Error),

    /// Invalid URL configuration error
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for GroqError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GroqError::Timeout(error)
        } else {
            GroqError::Network(error)
        }
    }
}

/// Trait for opening streamed chat completions.
///
/// This trait enables mocking in unit tests: a mock returns any iterator of
/// fragments without touching the network.
pub trait ChatStreamClient: Send + Sync {
    /// Sends `request` and returns the stream of generated fragments.
    ///
    /// # Errors
    ///
    /// Returns `GroqError` if the request cannot be sent or the backend rejects
    /// it before streaming starts. Errors after that point are yielded by the
    /// returned stream.
    fn stream_chat(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<FragmentStream, GroqError>;
}

/// Builder for constructing `GroqClient` instances.
///
/// # Examples
///
/// ```
/// use medha::groq::GroqClientBuilder;
///
/// let client = GroqClientBuilder::new()
///     .base_url("https://api.groq.com/openai/v1")
///     .build()
///     .expect("Failed to create client");
/// ```
#[derive(Debug, Default)]
pub struct GroqClientBuilder {
    base_url: Option<String>,
}

impl GroqClientBuilder {
    /// Creates a new `GroqClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL (e.g., "https://api.groq.com/openai/v1").
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the `GroqClient`.
    ///
    /// If `base_url()` was not called, the `GROQ_BASE_URL` environment variable
    /// is checked before falling back to `DEFAULT_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns `GroqError::InvalidUrl` for an unparseable URL, or
    /// `GroqError::Network` if the HTTP client cannot be created.
    pub fn build(self) -> Result<GroqClient, GroqError> {
        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
        };
        let base_url = base_url.trim_end_matches('/').to_string();

        reqwest::Url::parse(&base_url)
            .map_err(|e| GroqError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        // The timeout covers the whole streamed body, so it is generous
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(GroqError::Network)?;

        Ok(GroqClient { client, base_url })
    }
}

/// Synchronous client for Groq's streaming chat-completions endpoint.
pub struct GroqClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl GroqClient {
    /// Returns the base URL configured for this client.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ChatStreamClient for GroqClient {
    fn stream_chat(
        &self,
        request: &ChatRequest,
        credential: &Credential,
    ) -> Result<FragmentStream, GroqError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %request.model, max_tokens = request.max_tokens, "opening completion stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GroqError::Http {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        Ok(Box::new(SseFragments::new(BufReader::new(response))))
    }
}

/// Extracts the backend's error message from a failed response body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.trim().to_string())
}
