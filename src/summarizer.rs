//! Streamed article summarization.
//!
//! This module provides the `SummaryStreamer`, which sends a truncated article to
//! the generation backend and consumes the resulting fragment stream. Every
//! fragment is appended to an accumulator and the full text so far is
//! republished, followed by an in-progress marker while generation is active.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::{Credential, SummaryProfile};
use crate::groq::{ChatMessage, ChatRequest, ChatStreamClient, FragmentStream, GroqError};
use crate::wiki::Article;

/// Marker appended to the rendered summary while generation is in progress.
pub const IN_PROGRESS_MARKER: &str = " █";

/// A single summarization request.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    system_instruction: String,
    user_content: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl SummaryRequest {
    /// Builds the request for `article` under `profile`.
    ///
    /// The article body is cut to the profile's truncation length; the cut is
    /// a hard character limit.
    pub fn for_article(profile: &SummaryProfile, article: &Article) -> Self {
        Self {
            system_instruction: profile.system_instruction().to_string(),
            user_content: article.excerpt(profile.truncation_length()).to_string(),
            model: profile.model().to_string(),
            temperature: profile.temperature(),
            max_output_tokens: profile.max_output_tokens(),
        }
    }

    /// Returns the system instruction.
    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Returns the (truncated) article text sent as the user message.
    pub fn user_content(&self) -> &str {
        &self.user_content
    }

    /// Returns the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Returns the generation token budget.
    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    /// Converts to the chat-completions wire request with streaming enabled.
    pub fn to_chat_request(&self) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.system_instruction.as_str()),
                ChatMessage::user(self.user_content.as_str()),
            ],
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
            stream: true,
        }
    }
}

/// A generation failure, carrying whatever text arrived before it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct GenerationError {
    partial: String,
    #[source]
    source: GroqError,
}

impl GenerationError {
    /// Returns the summary text received before the failure.
    pub fn partial(&self) -> &str {
        &self.partial
    }
}

/// Append-only accumulator for streamed fragments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummaryAccumulator {
    text: String,
    fragments: usize,
}

impl SummaryAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next fragment.
    pub fn push(&mut self, fragment: &str) {
        self.text.push_str(fragment);
        self.fragments += 1;
    }

    /// Returns the text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of fragments received.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    /// Returns the accumulated text followed by the in-progress marker.
    pub fn in_progress_view(&self) -> String {
        format!("{}{}", self.text, IN_PROGRESS_MARKER)
    }

    /// Consumes the accumulator, returning the text.
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Streams summaries from a chat-completions backend.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use medha::config::{Credential, SummaryProfile};
/// use medha::groq::GroqClientBuilder;
/// use medha::summarizer::{SummaryRequest, SummaryStreamer};
/// use medha::wiki::Article;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GroqClientBuilder::new().build()?;
/// let streamer = SummaryStreamer::new(Arc::new(client));
/// let credential = Credential::new("gsk_...").expect("non-empty key");
///
/// let article = Article::new("Rust (programming language)", "Rust is a ...");
/// let request = SummaryRequest::for_article(&SummaryProfile::default(), &article);
///
/// let summary = streamer.stream_into(&request, &credential, |text| println!("{text}"))?;
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SummaryStreamer {
    client: Arc<dyn ChatStreamClient>,
}

impl SummaryStreamer {
    /// Creates a new `SummaryStreamer` over the given client.
    #[must_use]
    pub fn new(client: Arc<dyn ChatStreamClient>) -> Self {
        Self { client }
    }

    /// Opens the fragment stream for `request`.
    ///
    /// The stream is finite and cannot be restarted; a new call sends a new
    /// request.
    ///
    /// # Errors
    ///
    /// Returns `GroqError` if the backend cannot be reached or rejects the
    /// request before streaming starts.
    pub fn stream(
        &self,
        request: &SummaryRequest,
        credential: &Credential,
    ) -> Result<FragmentStream, GroqError> {
        self.client.stream_chat(&request.to_chat_request(), credential)
    }

    /// Streams `request` to completion, publishing through `render`.
    ///
    /// After every fragment `render` receives the full text so far followed by
    /// `IN_PROGRESS_MARKER`. When the stream ends, `render` receives the final
    /// text without the marker, which is also returned. A stream with no
    /// fragments produces an empty summary.
    ///
    /// # Errors
    ///
    /// On the first error the stream is abandoned, `render` receives the partial
    /// text without the marker, and a `GenerationError` carrying that text is
    /// returned.
    pub fn stream_into<F>(
        &self,
        request: &SummaryRequest,
        credential: &Credential,
        mut render: F,
    ) -> Result<String, GenerationError>
    where
        F: FnMut(&str),
    {
        let stream = self.stream(request, credential).map_err(|source| {
            debug!(error = %source, "completion request failed");
            GenerationError {
                partial: String::new(),
                source,
            }
        })?;

        let mut accumulator = SummaryAccumulator::new();
        for item in stream {
            match item {
                Ok(fragment) => {
                    accumulator.push(&fragment);
                    render(&accumulator.in_progress_view());
                }
                Err(source) => {
                    debug!(error = %source, fragments = accumulator.fragments(), "stream aborted");
                    render(accumulator.text());
                    return Err(GenerationError {
                        partial: accumulator.into_text(),
                        source,
                    });
                }
            }
        }

        debug!(fragments = accumulator.fragments(), "stream complete");
        render(accumulator.text());
        Ok(accumulator.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SummaryProfileBuilder;
    use serial_test::serial;
    use std::sync::Mutex;

    /// Replays canned fragments and records the requests it receives.
    struct MockChatClient {
        fragments: Vec<Result<&'static str, &'static str>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl MockChatClient {
        fn new(fragments: Vec<Result<&'static str, &'static str>>) -> Self {
            Self {
                fragments,
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl ChatStreamClient for MockChatClient {
        fn stream_chat(
            &self,
            request: &ChatRequest,
            _credential: &Credential,
        ) -> Result<FragmentStream, GroqError> {
            self.requests.lock().unwrap().push(request.clone());
            let items: Vec<Result<String, GroqError>> = self
                .fragments
                .iter()
                .map(|item| match item {
                    Ok(text) => Ok(text.to_string()),
                    Err(message) => Err(GroqError::Api {
                        message: message.to_string(),
                    }),
                })
                .collect();
            Ok(Box::new(items.into_iter()))
        }
    }

    struct RejectingClient;

    impl ChatStreamClient for RejectingClient {
        fn stream_chat(
            &self,
            _request: &ChatRequest,
            _credential: &Credential,
        ) -> Result<FragmentStream, GroqError> {
            Err(GroqError::Http {
                status: 401,
                message: "Invalid API Key".to_string(),
            })
        }
    }

    fn credential() -> Credential {
        Credential::new("gsk_test").unwrap()
    }

    fn request() -> SummaryRequest {
        let profile = SummaryProfile::default();
        SummaryRequest::for_article(&profile, &Article::new("Rust", "Rust is a language."))
    }

    #[test]
    #[serial]
    fn request_truncates_body_to_profile_length() {
        let profile = SummaryProfileBuilder::new()
            .truncation_length(5000)
            .model("llama3-8b-8192")
            .build()
            .unwrap();
        let body = format!("{}tail", "é".repeat(5000));
        let article = Article::new("Rust", body.clone());

        let request = SummaryRequest::for_article(&profile, &article);
        assert_eq!(request.user_content(), "é".repeat(5000));
        assert_eq!(request.model(), "llama3-8b-8192");
        assert_eq!(article.body(), body);
    }

    #[test]
    fn default_request_bounds_content_to_6000_chars() {
        let article = Article::new("Long", "x".repeat(9000));
        let request = SummaryRequest::for_article(&SummaryProfile::default(), &article);
        assert_eq!(request.user_content().chars().count(), 6000);
    }

    #[test]
    fn chat_request_carries_instruction_then_content() {
        let chat = request().to_chat_request();
        assert!(chat.stream);
        assert_eq!(chat.max_tokens, 600);
        assert!((chat.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(chat.messages.len(), 2);
        assert!(chat.messages[0].content.contains("bullet points"));
        assert_eq!(chat.messages[1].content, "Rust is a language.");
    }

    #[test]
    fn republishes_full_text_with_marker_after_each_fragment() {
        let client = MockChatClient::new(vec![Ok("• One"), Ok("\n• Two"), Ok(" more")]);
        let streamer = SummaryStreamer::new(Arc::new(client));
        let mut published = Vec::new();

        let summary = streamer
            .stream_into(&request(), &credential(), |text| published.push(text.to_string()))
            .unwrap();

        assert_eq!(summary, "• One\n• Two more");
        assert_eq!(
            published,
            vec![
                "• One █".to_string(),
                "• One\n• Two █".to_string(),
                "• One\n• Two more █".to_string(),
                "• One\n• Two more".to_string(),
            ]
        );
    }

    #[test]
    fn concatenation_of_fragments_equals_final_text() {
        let fragments: Vec<Result<&'static str, &'static str>> =
            vec![Ok("a"), Ok("b c"), Ok(" "), Ok("d\n"), Ok("é")];
        let expected: String = fragments.iter().map(|f| f.unwrap()).collect();
        let streamer = SummaryStreamer::new(Arc::new(MockChatClient::new(fragments)));

        let mut last = String::new();
        let summary = streamer
            .stream_into(&request(), &credential(), |text| last = text.to_string())
            .unwrap();

        assert_eq!(summary, expected);
        assert_eq!(last, expected);
    }

    #[test]
    fn zero_fragments_produce_empty_summary() {
        let streamer = SummaryStreamer::new(Arc::new(MockChatClient::new(vec![])));
        let mut published = Vec::new();

        let summary = streamer
            .stream_into(&request(), &credential(), |text| published.push(text.to_string()))
            .unwrap();

        assert_eq!(summary, "");
        assert_eq!(published, vec![String::new()]);
    }

    #[test]
    fn mid_stream_error_keeps_partial_text_without_marker() {
        let client = MockChatClient::new(vec![
            Ok("• First point"),
            Err("connection reset"),
            Ok("never seen"),
        ]);
        let streamer = SummaryStreamer::new(Arc::new(client));
        let mut published = Vec::new();

        let error = streamer
            .stream_into(&request(), &credential(), |text| published.push(text.to_string()))
            .unwrap_err();

        assert_eq!(error.partial(), "• First point");
        assert!(error.to_string().contains("connection reset"));
        assert_eq!(published.last().unwrap(), "• First point");
        assert!(!published.iter().any(|text| text.contains("never seen")));
    }

    #[test]
    fn rejected_request_fails_without_rendering() {
        let streamer = SummaryStreamer::new(Arc::new(RejectingClient));
        let mut renders = 0;

        let error = streamer
            .stream_into(&request(), &credential(), |_| renders += 1)
            .unwrap_err();

        assert_eq!(renders, 0);
        assert_eq!(error.partial(), "");
        assert!(error.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn each_call_sends_a_new_request() {
        let client = Arc::new(MockChatClient::new(vec![Ok("x")]));
        let streamer = SummaryStreamer::new(client.clone());

        streamer.stream_into(&request(), &credential(), |_| {}).unwrap();
        streamer.stream_into(&request(), &credential(), |_| {}).unwrap();

        assert_eq!(client.requests.lock().unwrap().len(), 2);
    }

    #[test]
    fn accumulator_tracks_fragment_count() {
        let mut acc = SummaryAccumulator::new();
        acc.push("a");
        acc.push("");
        acc.push("b");
        assert_eq!(acc.text(), "ab");
        assert_eq!(acc.fragments(), 3);
        assert_eq!(acc.in_progress_view(), "ab █");
    }
}
