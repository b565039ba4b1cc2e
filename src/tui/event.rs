//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Keys that need
//! more than the app state (running a submission, writing a file) are returned
//! as an `Action` for the event loop to carry out.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::App;
use crate::export::ExportKind;

/// Work requested by a key press that the event loop performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing beyond the state change already applied
    None,
    /// Leave the application
    Quit,
    /// Run a submission for the current topic
    Submit,
    /// Write an artifact of the last outcome
    Export(ExportKind),
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Esc`: Quit application
/// - `Enter`: Submit the topic
/// - `Tab` / `Shift+Tab`: Switch between topic and key inputs
/// - `Ctrl+S`: Export the summary
/// - `Ctrl+R`: Export the raw article
/// - `Ctrl+V`: Toggle the raw article view
/// - `Up` / `Down` / `PageUp` / `PageDown`: Scroll the content panel
/// - Characters and `Backspace` edit the focused input
///
/// # Examples
///
/// ```
/// use medha::tui::{App, event::{Action, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new(false, true);
/// let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
/// assert_eq!(handle_key_event(&mut app, key), Action::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Action::Export(ExportKind::Summary),
            KeyCode::Char('r') => Action::Export(ExportKind::Raw),
            KeyCode::Char('v') => {
                app.toggle_raw_view();
                Action::None
            }
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Enter => return Action::Submit,
        KeyCode::Tab | KeyCode::BackTab => app.next_focus(),
        KeyCode::Backspace => app.pop_char(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown => app.scroll_down(10),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_char(c);
        }
        _ => {}
    }

    Action::None
}
