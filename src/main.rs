use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medha::config::{ConfigError, Credential, CredentialMode, credential_from_env};
use medha::console::ConsoleSink;
use medha::export::default_export_dir;
use medha::groq::GroqClientBuilder;
use medha::logging::init_logging;
use medha::tui::{self, Session};
use medha::wiki::{WikiClient, WikiClientBuilder};
use medha::{Orchestrator, Outcome, State, SummaryProfile, SummaryProfileBuilder, SummaryStreamer};

/// medha - streamed bullet-point summaries of encyclopedia articles
#[derive(Parser)]
#[command(name = "medha")]
#[command(about = "Look up an encyclopedia article and stream an AI summary of it")]
#[command(version)]
struct Cli {
    /// Generation model identifier (overrides MEDHA_MODEL)
    #[arg(long, global = true, value_name = "MODEL")]
    model: Option<String>,

    /// Ask for the Groq API key per session instead of requiring GROQ_API_KEY
    #[arg(long, global = true)]
    manual_key: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Summarize one topic and print the result (interactive TUI when omitted)
    Ask(AskCommand),
}

/// Summarize a single topic
#[derive(Parser)]
struct AskCommand {
    /// The topic to look up
    #[arg(value_name = "TOPIC", required = true, num_args = 1..)]
    topic: Vec<String>,

    /// Write the summary (and raw article, if enabled) into this directory
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Ask(cmd)) => handle_ask(&cli, cmd),
        None => handle_tui(&cli),
    };

    match result {
        Ok(true) => {}
        // The failure was already reported through the display sink
        Ok(false) => std::process::exit(1),
        Err(e) => {
            let exit_code = if is_user_error(&e) { 1 } else { 2 };
            eprintln!("Error: {e:#}");
            std::process::exit(exit_code);
        }
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are configuration problems the user can fix: a missing
/// credential, an invalid override, an empty topic.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<ConfigError>())
        || error.to_string().contains("cannot be empty")
}

/// Resolves the profile from environment and command-line overrides.
fn build_profile(cli: &Cli) -> Result<SummaryProfile> {
    let mut builder = SummaryProfileBuilder::new();
    if let Some(model) = &cli.model {
        builder = builder.model(model.clone());
    }
    if cli.manual_key {
        builder = builder.credential_mode(CredentialMode::Manual);
    }
    Ok(builder.build()?)
}

/// Loads the startup credential.
///
/// In store mode a missing key is fatal. In manual mode it is optional and
/// submissions without one end in a warning.
fn load_credential(profile: &SummaryProfile) -> Result<Option<Credential>> {
    match profile.credential_mode() {
        CredentialMode::Store => Ok(Some(credential_from_env()?)),
        CredentialMode::Manual => Ok(credential_from_env().ok()),
    }
}

/// Builds the lookup client and summary streamer from the environment.
fn build_clients() -> Result<(Arc<WikiClient>, SummaryStreamer)> {
    let wiki = WikiClientBuilder::new()
        .build()
        .context("Failed to create encyclopedia client")?;
    let groq = GroqClientBuilder::new()
        .build()
        .context("Failed to create generation client")?;

    Ok((Arc::new(wiki), SummaryStreamer::new(Arc::new(groq))))
}

/// Handles the ask command: one submission streamed to stdout.
///
/// Returns `false` if the submission did not reach `Done`.
fn handle_ask(cli: &Cli, cmd: &AskCommand) -> Result<bool> {
    init_logging();

    let topic = cmd.topic.join(" ");
    if topic.trim().is_empty() {
        anyhow::bail!("Topic cannot be empty");
    }

    let profile = build_profile(cli)?;
    let credential = load_credential(&profile)?;
    let (fetcher, streamer) = build_clients()?;
    let orchestrator = Orchestrator::new(fetcher, streamer, profile, credential);

    let stdout = io::stdout();
    let mut sink = if stdout.is_terminal() {
        ConsoleSink::new(stdout)
    } else {
        ConsoleSink::plain(stdout)
    };
    let outcome = orchestrator.submit(&topic, &mut sink);
    sink.finish().context("Failed to write to stdout")?;

    if outcome.state() != State::Done {
        return Ok(false);
    }

    if let Some(dir) = &cmd.export_dir {
        write_exports(&outcome, dir)?;
    }

    Ok(true)
}

/// Writes every export artifact of a finished outcome into `dir`.
fn write_exports(outcome: &Outcome, dir: &Path) -> Result<()> {
    for artifact in outcome.exports() {
        let path = artifact
            .write_to(dir)
            .with_context(|| format!("Failed to export {}", artifact.file_name()))?;
        println!("Saved {}", path.display());
    }
    Ok(())
}

/// Handles the interactive TUI session.
fn handle_tui(cli: &Cli) -> Result<bool> {
    let profile = build_profile(cli)?;
    let credential = load_credential(&profile)?;
    let (fetcher, streamer) = build_clients()?;

    let session = Session::new(fetcher, streamer, profile, credential, default_export_dir());
    tui::run(&session)?;

    Ok(true)
}
