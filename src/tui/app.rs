use std::path::Path;

use crate::export::ExportKind;
use crate::orchestrator::{DisplaySink, Outcome, State};

/// Application state for the TUI.
///
/// Holds the input fields, the progress of the current submission and the
/// outcome of the last one. Implements `DisplaySink` so the orchestrator can
/// report into it directly.
#[derive(Debug, Clone)]
pub struct App {
    /// Topic input buffer
    query: String,
    /// Masked credential input buffer (manual key mode only)
    api_key: String,
    /// Whether the credential input is shown
    key_input: bool,
    /// Whether the raw article can be viewed and exported
    raw_export: bool,
    /// Currently focused input
    focus: Focus,
    /// Progress lines of the current submission
    status: Vec<String>,
    /// Resolved article title
    title: Option<String>,
    /// Rendered summary, with the in-progress marker while streaming
    summary: String,
    /// Loading indicator
    loading: bool,
    /// Last message shown to the user
    notice: Option<Notice>,
    /// Current submission state
    state: State,
    /// Result of the last finished submission
    outcome: Option<Outcome>,
    /// Whether the raw article replaces the summary in the content panel
    show_raw: bool,
    /// Scroll offset of the content panel
    scroll: u16,
}

/// Input focus for keyboard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Topic input receives typed characters
    Query,
    /// Credential input receives typed characters
    ApiKey,
}

/// Severity of a notice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A one-line message shown under the content panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    kind: NoticeKind,
    text: String,
}

impl Notice {
    /// Returns the severity.
    pub fn kind(&self) -> NoticeKind {
        self.kind
    }

    /// Returns the message.
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl App {
    /// Creates a new App with empty inputs.
    ///
    /// `key_input` shows the masked credential field; `raw_export` enables the
    /// raw article view and export.
    ///
    /// # Examples
    ///
    /// ```
    /// use medha::tui::{App, Focus};
    ///
    /// let app = App::new(true, true);
    /// assert_eq!(app.focus(), Focus::Query);
    /// assert!(app.summary().is_empty());
    /// ```
    pub fn new(key_input: bool, raw_export: bool) -> Self {
        Self {
            query: String::new(),
            api_key: String::new(),
            key_input,
            raw_export,
            focus: Focus::Query,
            status: Vec::new(),
            title: None,
            summary: String::new(),
            loading: false,
            notice: None,
            state: State::Idle,
            outcome: None,
            show_raw: false,
            scroll: 0,
        }
    }

    /// Returns the topic input buffer.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns the credential input buffer.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns true if the credential input is shown.
    pub fn has_key_input(&self) -> bool {
        self.key_input
    }

    /// Returns true if the raw article view and export are enabled.
    pub fn raw_export_enabled(&self) -> bool {
        self.raw_export
    }

    /// Returns the current focus.
    pub fn focus(&self) -> Focus {
        self.focus
    }

    /// Returns the progress lines of the current submission.
    pub fn status_lines(&self) -> &[String] {
        &self.status
    }

    /// Returns the resolved article title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the rendered summary.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Returns true while a submission is running.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns the notice line, if any.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Returns the current submission state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the outcome of the last finished submission.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Returns true if the raw article replaces the summary.
    pub fn showing_raw(&self) -> bool {
        self.show_raw
    }

    /// Returns the content panel scroll offset.
    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    /// Returns the untruncated article body when the raw view is active.
    pub fn raw_view(&self) -> Option<&str> {
        if !self.show_raw {
            return None;
        }
        self.outcome
            .as_ref()
            .and_then(Outcome::article)
            .map(|article| article.body())
    }

    /// Moves focus between the topic and credential inputs.
    ///
    /// Without a credential input focus stays on the topic.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Query if self.key_input => Focus::ApiKey,
            _ => Focus::Query,
        };
    }

    /// Adds a character to the focused input.
    pub fn push_char(&mut self, c: char) {
        match self.focus {
            Focus::Query => self.query.push(c),
            Focus::ApiKey => self.api_key.push(c),
        }
    }

    /// Removes the last character from the focused input.
    pub fn pop_char(&mut self) {
        match self.focus {
            Focus::Query => self.query.pop(),
            Focus::ApiKey => self.api_key.pop(),
        };
    }

    /// Clears everything left over from the previous submission.
    pub fn begin_submission(&mut self) {
        self.status.clear();
        self.title = None;
        self.summary.clear();
        self.loading = false;
        self.notice = None;
        self.state = State::Idle;
        self.outcome = None;
        self.show_raw = false;
        self.scroll = 0;
    }

    /// Stores the outcome of a finished submission.
    pub fn finish_submission(&mut self, outcome: Outcome) {
        self.state = outcome.state();
        self.loading = false;
        self.outcome = Some(outcome);
    }

    /// Switches between the summary and the raw article.
    ///
    /// Only possible once an article has been fetched and raw export is on.
    pub fn toggle_raw_view(&mut self) {
        let has_article = self
            .outcome
            .as_ref()
            .is_some_and(|outcome| outcome.article().is_some());

        if self.raw_export && has_article {
            self.show_raw = !self.show_raw;
            self.scroll = 0;
        }
    }

    /// Scrolls the content panel down.
    pub fn scroll_down(&mut self, amount: u16) {
        self.scroll = self.scroll.saturating_add(amount);
    }

    /// Scrolls the content panel up.
    pub fn scroll_up(&mut self, amount: u16) {
        self.scroll = self.scroll.saturating_sub(amount);
    }

    /// Writes the requested artifact of the last outcome into `dir`.
    ///
    /// The result is reported through the notice line.
    pub fn export(&mut self, kind: ExportKind, dir: &Path) {
        if kind == ExportKind::Raw && !self.raw_export {
            self.set_notice(NoticeKind::Warning, "Raw export is disabled.");
            return;
        }

        let artifact = self
            .outcome
            .as_ref()
            .and_then(|outcome| outcome.exports().into_iter().find(|a| a.kind() == kind));

        let Some(artifact) = artifact else {
            self.set_notice(
                NoticeKind::Warning,
                "Nothing to export yet. Finish a summary first.",
            );
            return;
        };

        match artifact.write_to(dir) {
            Ok(path) => self.set_notice(NoticeKind::Info, &format!("Saved {}", path.display())),
            Err(e) => self.set_notice(NoticeKind::Error, &format!("Export failed: {e:#}")),
        }
    }

    fn set_notice(&mut self, kind: NoticeKind, text: &str) {
        self.notice = Some(Notice {
            kind,
            text: text.to_string(),
        });
    }
}

impl DisplaySink for App {
    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn status(&mut self, message: &str) {
        self.status.push(message.to_string());
    }

    fn show_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    fn render_summary(&mut self, text: &str) {
        self.summary.clear();
        self.summary.push_str(text);
    }

    fn show_error(&mut self, message: &str) {
        self.set_notice(NoticeKind::Error, message);
    }

    fn show_warning(&mut self, message: &str) {
        self.set_notice(NoticeKind::Warning, message);
    }

    fn state_changed(&mut self, state: State) {
        self.state = state;
    }
}
