//! Types for article lookup results.

use thiserror::Error;

/// A resolved encyclopedia article.
///
/// The title is the canonical title the lookup service resolved to, which can
/// differ from what the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    title: String,
    body: String,
}

impl Article {
    /// Creates a new article.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Returns the resolved title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the full, untruncated body text.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns the first `max_chars` characters of the body.
    ///
    /// Counts Unicode scalar values, so a multi-byte character is never split.
    /// No attempt is made to stop at a word or sentence boundary.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.body.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &self.body[..byte_idx],
            None => &self.body,
        }
    }
}

/// Errors returned by an article lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The query resolved to a disambiguation page
    #[error("\"{title}\" may refer to: {}", .candidates.join(", "))]
    Ambiguous {
        title: String,
        candidates: Vec<String>,
    },

    /// No article matches the query
    #[error("No article found for \"{query}\"")]
    NotFound { query: String },

    /// Transport or service failure
    #[error("Lookup failed: {message}")]
    Failure { message: String },
}
