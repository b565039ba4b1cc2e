pub mod config;
pub mod console;
pub mod export;
pub mod groq;
pub mod logging;
pub mod orchestrator;
pub mod summarizer;
pub mod tui;
pub mod wiki;

pub use config::{Credential, CredentialMode, SummaryProfile, SummaryProfileBuilder};
pub use export::{ExportArtifact, ExportKind};
pub use orchestrator::{DisplaySink, Orchestrator, Outcome, State, SubmissionError};
pub use summarizer::{SummaryRequest, SummaryStreamer};
pub use wiki::{Article, ArticleFetcher, LookupError};
