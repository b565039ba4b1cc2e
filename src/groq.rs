/// Groq chat-completions client module.
///
/// This module provides a synchronous client for the OpenAI-compatible streaming
/// chat endpoint, the request wire types, and the server-sent event decoder that
/// turns a response body into an ordered sequence of text fragments.
mod client;
mod stream;
mod types;

pub use client::{
    ChatStreamClient, DEFAULT_BASE_URL, FragmentStream, GroqClient, GroqClientBuilder, GroqError,
};
pub use stream::SseFragments;
pub use types::{ChatMessage, ChatRequest, Role};
