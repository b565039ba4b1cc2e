//! Line-oriented display sink for one-shot runs.
//!
//! Streams the summary in place: each render only writes what changed since the
//! previous one, erasing the in-progress marker with cursor movement rather
//! than reprinting the whole text. When the output is not a terminal the sink
//! writes plain text instead: no colors, no progress lines, and only the final
//! form of each summary fragment.

use std::io::{self, Write};

use crossterm::cursor::MoveLeft;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

use crate::orchestrator::DisplaySink;
use crate::summarizer::IN_PROGRESS_MARKER;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Display sink writing ANSI-colored output to any writer.
pub struct ConsoleSink<W: Write> {
    out: W,
    styled: bool,
    shown: String,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleSink<W> {
    /// Creates a sink for a terminal: colored, streaming in place.
    pub fn new(out: W) -> Self {
        Self {
            out,
            styled: true,
            shown: String::new(),
            error: None,
        }
    }

    /// Creates a sink for a pipe or file.
    ///
    /// The summary is appended as it grows, without the in-progress marker or
    /// any escape sequence.
    pub fn plain(out: W) -> Self {
        Self {
            styled: false,
            ..Self::new(out)
        }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.styled {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Terminates the summary line and returns the writer.
    ///
    /// # Errors
    ///
    /// Returns the first write error encountered by any sink call.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.shown.is_empty() {
            let result = writeln!(self.out);
            self.record(result);
        }
        let result = self.out.flush();
        self.record(result);

        match self.error {
            Some(error) => Err(error),
            None => Ok(self.out),
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(error) = result
            && self.error.is_none()
        {
            self.error = Some(error);
        }
    }

    fn line(&mut self, text: &str) {
        let result = self.break_summary().and_then(|()| writeln!(self.out, "{text}"));
        self.record(result);
    }

    /// Moves past a summary still on the current line.
    fn break_summary(&mut self) -> io::Result<()> {
        if self.shown.is_empty() {
            return Ok(());
        }
        self.shown.clear();
        writeln!(self.out)
    }

    fn append(&mut self, text: &str) -> io::Result<()> {
        let text = text.strip_suffix(IN_PROGRESS_MARKER).unwrap_or(text);
        match text.strip_prefix(self.shown.as_str()) {
            Some(tail) => write!(self.out, "{tail}")?,
            None => {
                writeln!(self.out)?;
                write!(self.out, "{text}")?;
            }
        }

        self.shown.clear();
        self.shown.push_str(text);
        self.out.flush()
    }

    fn rewrite(&mut self, text: &str) -> io::Result<()> {
        let common = common_prefix_len(&self.shown, text);
        let stale = &self.shown[common..];

        if stale.contains('\n') {
            // Cannot erase across lines; start over below
            writeln!(self.out)?;
            write!(self.out, "{text}")?;
        } else {
            let columns = stale.chars().count();
            if columns > 0 {
                let columns = u16::try_from(columns).unwrap_or(u16::MAX);
                queue!(self.out, MoveLeft(columns), Clear(ClearType::UntilNewLine))?;
            }
            write!(self.out, "{}", &text[common..])?;
        }

        self.shown.clear();
        self.shown.push_str(text);
        self.out.flush()
    }
}

impl<W: Write> DisplaySink for ConsoleSink<W> {
    fn set_loading(&mut self, _loading: bool) {}

    fn status(&mut self, message: &str) {
        if self.styled {
            let text = self.paint(DIM, message);
            self.line(&text);
        }
    }

    fn show_title(&mut self, title: &str) {
        let heading = self.paint(
            &format!("{BOLD}{GREEN}"),
            &format!("ANALYSIS: {}", title.to_uppercase()),
        );
        self.line(&format!("\n{heading}\n"));
    }

    fn render_summary(&mut self, text: &str) {
        let result = if self.styled {
            self.rewrite(text)
        } else {
            self.append(text)
        };
        self.record(result);
    }

    fn show_error(&mut self, message: &str) {
        let label = self.paint(&format!("{RED}{BOLD}"), "Error:");
        self.line(&format!("{label} {message}"));
    }

    fn show_warning(&mut self, message: &str) {
        let label = self.paint(&format!("{YELLOW}{BOLD}"), "Warning:");
        self.line(&format!("{label} {message}"));
    }
}

/// Byte length of the longest common prefix, on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((idx, _), _)| idx)
        .unwrap_or_else(|| a.len().min(b.len()))
}
