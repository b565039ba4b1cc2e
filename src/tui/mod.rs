//! Terminal User Interface module for medha.
//!
//! Provides an interactive session: type a topic, watch the summary stream in,
//! export the result. Uses ratatui for rendering and crossterm for terminal
//! management.

use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};

use crate::config::{Credential, CredentialMode, SummaryProfile};
use crate::orchestrator::{DisplaySink, Orchestrator, State};
use crate::summarizer::SummaryStreamer;
use crate::wiki::ArticleFetcher;

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus, Notice, NoticeKind};
use event::Action;

/// Everything an interactive session needs to run submissions.
pub struct Session {
    fetcher: Arc<dyn ArticleFetcher>,
    streamer: SummaryStreamer,
    profile: SummaryProfile,
    credential: Option<Credential>,
    export_dir: PathBuf,
}

impl Session {
    /// Creates a session.
    ///
    /// `credential` is the key loaded at startup; in manual key mode it may be
    /// `None`, and the key typed into the credential input is used instead.
    pub fn new(
        fetcher: Arc<dyn ArticleFetcher>,
        streamer: SummaryStreamer,
        profile: SummaryProfile,
        credential: Option<Credential>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            fetcher,
            streamer,
            profile,
            credential,
            export_dir,
        }
    }

    /// Creates the app state matching this session's profile.
    pub fn app(&self) -> App {
        App::new(
            self.profile.credential_mode() == CredentialMode::Manual,
            self.profile.raw_export(),
        )
    }

    /// Builds the orchestrator for one submission.
    ///
    /// In manual key mode a key typed into the app wins over the startup key.
    fn orchestrator(&self, app: &App) -> Orchestrator {
        let credential = match self.profile.credential_mode() {
            CredentialMode::Manual => {
                Credential::new(app.api_key()).or_else(|| self.credential.clone())
            }
            CredentialMode::Store => self.credential.clone(),
        };

        Orchestrator::new(
            Arc::clone(&self.fetcher),
            self.streamer.clone(),
            self.profile.clone(),
            credential,
        )
    }

    /// Runs one submission for the app's current topic, redrawing `terminal`
    /// on every update.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails.
    pub fn submit<B: Backend>(&self, app: &mut App, terminal: &mut Terminal<B>) -> Result<State> {
        let orchestrator = self.orchestrator(app);
        let query = app.query().to_string();

        app.begin_submission();
        let mut sink = TerminalSink::new(app, terminal);
        let outcome = orchestrator.submit(&query, &mut sink);
        let draw_error = sink.draw_error.take();

        let state = outcome.state();
        app.finish_submission(outcome);

        match draw_error {
            Some(message) => Err(anyhow::anyhow!("failed to draw terminal: {message}")),
            None => Ok(state),
        }
    }
}

/// Display sink that updates the app and redraws after every change.
struct TerminalSink<'a, B: Backend> {
    app: &'a mut App,
    terminal: &'a mut Terminal<B>,
    draw_error: Option<String>,
}

impl<'a, B: Backend> TerminalSink<'a, B> {
    fn new(app: &'a mut App, terminal: &'a mut Terminal<B>) -> Self {
        Self {
            app,
            terminal,
            draw_error: None,
        }
    }

    fn redraw(&mut self) {
        if self.draw_error.is_some() {
            return;
        }
        let app = &*self.app;
        if let Err(e) = self.terminal.draw(|frame| ui::draw(frame, app)) {
            self.draw_error = Some(e.to_string());
        }
    }
}

impl<B: Backend> DisplaySink for TerminalSink<'_, B> {
    fn set_loading(&mut self, loading: bool) {
        self.app.set_loading(loading);
        self.redraw();
    }

    fn status(&mut self, message: &str) {
        self.app.status(message);
        self.redraw();
    }

    fn show_title(&mut self, title: &str) {
        self.app.show_title(title);
        self.redraw();
    }

    fn render_summary(&mut self, text: &str) {
        self.app.render_summary(text);
        self.redraw();
    }

    fn show_error(&mut self, message: &str) {
        self.app.show_error(message);
        self.redraw();
    }

    fn show_warning(&mut self, message: &str) {
        self.app.show_warning(message);
        self.redraw();
    }

    fn state_changed(&mut self, state: State) {
        self.app.state_changed(state);
    }
}

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This should always be called before exiting the TUI, even in error cases,
/// to prevent terminal corruption.
///
/// # Errors
///
/// Returns an error if terminal restoration fails.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic handler.
///
/// Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Initializes a panic hook that restores the terminal before panicking.
///
/// The original panic hook is preserved and called after terminal restoration.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the interactive session until the user quits.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations fail.
/// Terminal state is always restored, even on error.
pub fn run(session: &Session) -> Result<()> {
    init_panic_hook();

    let mut app = session.app();
    let mut terminal = init_terminal()?;

    let result = run_event_loop(session, &mut app, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result.context("TUI event loop failed")
}

/// Polls for keyboard events, updates app state, and re-renders.
///
/// Submissions run on this thread; the terminal is redrawn from inside the
/// display sink while a summary streams in.
fn run_event_loop(
    session: &Session,
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
        {
            match event::handle_key_event(app, key) {
                Action::Quit => break,
                Action::Submit => {
                    session.submit(app, terminal)?;
                }
                Action::Export(kind) => app.export(kind, &session.export_dir),
                Action::None => {}
            }
        }
    }

    Ok(())
}
