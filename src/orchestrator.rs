//! Per-submission pipeline: fetch the article, stream the summary, report.
//!
//! The `Orchestrator` drives one submission through the state machine
//!
//! ```text
//! Idle -> Fetching -> Fetched -> Generating -> Done
//!             |                      |
//!             +-> AmbiguousError     +-> GenerationFailure
//!             +-> NotFoundError
//!             +-> FetchFailure
//! Idle -> CredentialMissing
//! ```
//!
//! Every error is turned into exactly one user-facing message on the display
//! sink. Nothing carries over between submissions.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::config::{Credential, SummaryProfile};
use crate::export::ExportArtifact;
use crate::summarizer::{SummaryRequest, SummaryStreamer};
use crate::wiki::{Article, ArticleFetcher, LookupError};

/// Number of disambiguation candidates shown to the user.
const SHOWN_CANDIDATES: usize = 3;

/// Submission lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Fetching,
    Fetched,
    Generating,
    Done,
    AmbiguousError,
    NotFoundError,
    FetchFailure,
    GenerationFailure,
    CredentialMissing,
}

impl State {
    /// Returns true for states that end a submission.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Done
                | Self::AmbiguousError
                | Self::NotFoundError
                | Self::FetchFailure
                | Self::GenerationFailure
                | Self::CredentialMissing
        )
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::AmbiguousError => "ambiguous",
            Self::NotFoundError => "not_found",
            Self::FetchFailure => "fetch_failure",
            Self::GenerationFailure => "generation_failure",
            Self::CredentialMissing => "credential_missing",
        };
        f.write_str(name)
    }
}

/// Errors that end a submission, with user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Groq API key required. Enter your key to continue.")]
    CredentialMissing,

    #[error("Ambiguous topic. Did you mean: {}?", first_candidates(.candidates))]
    Ambiguous { candidates: Vec<String> },

    #[error("Topic not found. Try a different spelling or a more specific title.")]
    NotFound,

    #[error("Lookup failed: {message}")]
    LookupFailure { message: String },

    #[error("Generation failed: {message}")]
    GenerationFailure { message: String },
}

impl SubmissionError {
    /// Returns the terminal state this error leads to.
    pub fn state(&self) -> State {
        match self {
            Self::CredentialMissing => State::CredentialMissing,
            Self::Ambiguous { .. } => State::AmbiguousError,
            Self::NotFound => State::NotFoundError,
            Self::LookupFailure { .. } => State::FetchFailure,
            Self::GenerationFailure { .. } => State::GenerationFailure,
        }
    }
}

impl From<LookupError> for SubmissionError {
    fn from(error: LookupError) -> Self {
        match error {
            LookupError::Ambiguous { candidates, .. } => Self::Ambiguous { candidates },
            LookupError::NotFound { .. } => Self::NotFound,
            LookupError::Failure { message } => Self::LookupFailure { message },
        }
    }
}

fn first_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .take(SHOWN_CANDIDATES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Presentation surface a submission reports to.
///
/// Exclusively borrowed by the orchestrator for the duration of one submission.
pub trait DisplaySink {
    /// Shows or clears the loading indicator.
    fn set_loading(&mut self, loading: bool);

    /// Appends a progress line.
    fn status(&mut self, message: &str);

    /// Shows the resolved article title.
    fn show_title(&mut self, title: &str);

    /// Replaces the rendered summary with `text`.
    ///
    /// While generation is active `text` ends with the in-progress marker.
    fn render_summary(&mut self, text: &str);

    /// Shows the single error message of a failed submission.
    fn show_error(&mut self, message: &str);

    /// Shows a warning that blocked the submission.
    fn show_warning(&mut self, message: &str);

    /// Called on every state transition.
    fn state_changed(&mut self, _state: State) {}
}

/// Result of one submission.
#[derive(Debug, Clone)]
pub struct Outcome {
    state: State,
    article: Option<Article>,
    summary: String,
    error: Option<SubmissionError>,
    model: String,
    raw_export: bool,
    finished_at: Option<OffsetDateTime>,
}

impl Outcome {
    fn new(profile: &SummaryProfile) -> Self {
        Self {
            state: State::Idle,
            article: None,
            summary: String::new(),
            error: None,
            model: profile.model().to_string(),
            raw_export: profile.raw_export(),
            finished_at: None,
        }
    }

    /// Returns the final state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the resolved article, if the fetch succeeded.
    pub fn article(&self) -> Option<&Article> {
        self.article.as_ref()
    }

    /// Returns the summary text: complete when `Done`, partial after a
    /// generation failure, empty otherwise.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns the error that ended the submission.
    pub fn error(&self) -> Option<&SubmissionError> {
        self.error.as_ref()
    }

    /// Returns the export artifacts available for this outcome.
    ///
    /// Only a `Done` submission has exports: the summary report, plus the raw
    /// article when the profile enables it.
    pub fn exports(&self) -> Vec<ExportArtifact> {
        let (State::Done, Some(article)) = (self.state, self.article.as_ref()) else {
            return Vec::new();
        };

        let generated_at = self.finished_at.unwrap_or_else(OffsetDateTime::now_utc);
        let mut artifacts = vec![ExportArtifact::summary(
            article.title(),
            &self.summary,
            &self.model,
            generated_at,
        )];
        if self.raw_export {
            artifacts.push(ExportArtifact::raw(article.title(), article.body()));
        }
        artifacts
    }

    fn transition(&mut self, sink: &mut dyn DisplaySink, state: State) {
        self.state = state;
        sink.state_changed(state);
    }

    fn fail(&mut self, sink: &mut dyn DisplaySink, error: SubmissionError) {
        self.transition(sink, error.state());
        if matches!(error, SubmissionError::CredentialMissing) {
            sink.show_warning(&error.to_string());
        } else {
            sink.show_error(&error.to_string());
        }
        self.error = Some(error);
    }
}

/// Runs submissions through fetch and summary generation.
///
/// The credential is injected at construction and never changes. A new
/// orchestrator is cheap to build, so callers that collect a key per session
/// construct one per submission.
pub struct Orchestrator {
    fetcher: Arc<dyn ArticleFetcher>,
    streamer: SummaryStreamer,
    profile: SummaryProfile,
    credential: Option<Credential>,
}

impl Orchestrator {
    /// Creates a new orchestrator.
    pub fn new(
        fetcher: Arc<dyn ArticleFetcher>,
        streamer: SummaryStreamer,
        profile: SummaryProfile,
        credential: Option<Credential>,
    ) -> Self {
        Self {
            fetcher,
            streamer,
            profile,
            credential,
        }
    }

    /// Runs one submission to a terminal state.
    ///
    /// A blank query leaves the machine `Idle` and touches nothing. Without a
    /// credential the submission ends in `CredentialMissing` before any lookup.
    /// Otherwise the loading indicator is raised for the duration of the
    /// pipeline and cleared whatever the outcome.
    pub fn submit(&self, query: &str, sink: &mut dyn DisplaySink) -> Outcome {
        let mut outcome = Outcome::new(&self.profile);

        if query.trim().is_empty() {
            return outcome;
        }

        let Some(credential) = self.credential.as_ref() else {
            outcome.fail(sink, SubmissionError::CredentialMissing);
            return outcome;
        };

        sink.set_loading(true);
        self.run(query, credential, sink, &mut outcome);
        sink.set_loading(false);

        info!(state = %outcome.state, "submission finished");
        outcome
    }

    fn run(
        &self,
        query: &str,
        credential: &Credential,
        sink: &mut dyn DisplaySink,
        outcome: &mut Outcome,
    ) {
        outcome.transition(sink, State::Fetching);
        sink.status("Scanning knowledge base...");

        let article = match self.fetcher.fetch(query) {
            Ok(article) => article,
            Err(error) => {
                outcome.fail(sink, error.into());
                return;
            }
        };

        info!(query, title = article.title(), "article resolved");
        sink.status(&format!("Target locked: {}", article.title()));
        sink.show_title(article.title());
        outcome.transition(sink, State::Fetched);

        let request = SummaryRequest::for_article(&self.profile, &article);
        outcome.article = Some(article);

        sink.status(&format!("Engaging {}...", request.model()));
        outcome.transition(sink, State::Generating);

        let result = self
            .streamer
            .stream_into(&request, credential, |text| sink.render_summary(text));

        match result {
            Ok(summary) => {
                outcome.summary = summary;
                outcome.finished_at = Some(OffsetDateTime::now_utc());
                outcome.transition(sink, State::Done);
            }
            Err(error) => {
                outcome.summary = error.partial().to_string();
                outcome.fail(
                    sink,
                    SubmissionError::GenerationFailure {
                        message: error.to_string(),
                    },
                );
            }
        }
    }
}
