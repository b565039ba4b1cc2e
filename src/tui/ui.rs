//! UI rendering functions for the TUI.
//!
//! Stacks the topic input, the optional credential input, the status trail and
//! the content panel, with a notice line and shortcut bar at the bottom.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::app::{App, Focus, NoticeKind};

/// Number of status lines kept visible.
const STATUS_LINES: u16 = 3;

/// Main rendering function for the TUI.
///
/// # Arguments
///
/// * `frame` - The ratatui Frame to render into
/// * `app` - The application state
pub fn draw(frame: &mut Frame, app: &App) {
    let key_height = if app.has_key_input() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                // Header
            Constraint::Length(3),                // Topic input
            Constraint::Length(key_height),       // Key input
            Constraint::Length(STATUS_LINES + 2), // Status trail
            Constraint::Min(0),                   // Content
            Constraint::Length(1),                // Notice
            Constraint::Length(1),                // Shortcut bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0]);
    render_input(
        frame,
        chunks[1],
        "Topic",
        app.query().to_string(),
        app.focus() == Focus::Query,
    );
    if app.has_key_input() {
        render_input(
            frame,
            chunks[2],
            "Groq API key",
            "•".repeat(app.api_key().chars().count()),
            app.focus() == Focus::ApiKey,
        );
    }
    render_status(frame, app, chunks[3]);
    render_content(frame, app, chunks[4]);
    render_notice(frame, app, chunks[5]);
    render_shortcut_bar(frame, app, chunks[6]);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            "MEDHA",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  encyclopedia summaries",
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Renders a single-line input with a cursor indicator when focused.
fn render_input(frame: &mut Frame, area: Rect, title: &str, mut content: String, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .border_style(border_style);

    if focused {
        content.push('▏');
    }

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Renders the last few progress lines, marking the block while loading.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.is_loading() {
        "Status (working...)"
    } else {
        "Status"
    };
    let block = Block::default().borders(Borders::ALL).title(title);

    let skip = app.status_lines().len().saturating_sub(usize::from(STATUS_LINES));
    let lines: Vec<Line> = app
        .status_lines()
        .iter()
        .skip(skip)
        .map(|line| Line::from(Span::styled(line.clone(), Style::default().fg(Color::DarkGray))))
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the summary as markdown, or the raw article when toggled.
fn render_content(frame: &mut Frame, app: &App, area: Rect) {
    let title = match (app.title(), app.raw_view()) {
        (Some(title), Some(_)) => format!("RAW DATA: {}", title.to_uppercase()),
        (Some(title), None) => format!("ANALYSIS: {}", title.to_uppercase()),
        (None, _) => "Analysis".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        ));

    let text = match app.raw_view() {
        Some(body) => Text::raw(body),
        None if app.summary().is_empty() => Text::styled(
            "Enter a topic and press Enter.",
            Style::default().fg(Color::DarkGray),
        ),
        None => tui_markdown::from_str(app.summary()),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn render_notice(frame: &mut Frame, app: &App, area: Rect) {
    let Some(notice) = app.notice() else {
        return;
    };

    let style = match notice.kind() {
        NoticeKind::Info => Style::default().fg(Color::Green),
        NoticeKind::Warning => Style::default().fg(Color::Yellow),
        NoticeKind::Error => Style::default().fg(Color::Red),
    };

    frame.render_widget(
        Paragraph::new(Span::styled(notice.text().to_string(), style)),
        area,
    );
}

/// Renders the shortcut bar at the bottom of the screen.
///
/// Format: `Key: action | Key: action` with keys highlighted in cyan.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut spans = vec![
        Span::styled("Esc", key_style),
        Span::raw(": quit"),
        Span::styled(" | ", sep_style),
        Span::styled("Enter", key_style),
        Span::raw(": summarize"),
        Span::styled(" | ", sep_style),
        Span::styled("Ctrl+S", key_style),
        Span::raw(": save summary"),
    ];

    if app.raw_export_enabled() {
        spans.push(Span::styled(" | ", sep_style));
        spans.push(Span::styled("Ctrl+R", key_style));
        spans.push(Span::raw(": save raw"));
        spans.push(Span::styled(" | ", sep_style));
        spans.push(Span::styled("Ctrl+V", key_style));
        spans.push(Span::raw(": raw view"));
    }

    if app.has_key_input() {
        spans.push(Span::styled(" | ", sep_style));
        spans.push(Span::styled("Tab", key_style));
        spans.push(Span::raw(": switch input"));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
