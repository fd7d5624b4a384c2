// Keyboard input handling and command dispatch.
//
// Translates crossterm key events into UserCommand messages sent to the
// app orchestrator, or into local ViewState mutations (e.g. tab switching,
// selection, the login modal).

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{TabId, ViewState};
use crate::auth;
use crate::board::question::QuestionStatus;
use crate::protocol::UserCommand;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator (e.g. SubmitQuestion, Resolve). Returns `None` when the
/// key press was handled locally by mutating `ViewState` (e.g. tab switching,
/// selection, typing into the login modal).
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress; ignoring
    // non-Press events prevents double-processing.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode (escape hatch)
    if key_event.modifiers.contains(KeyModifiers::CONTROL)
        && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    // Clear confirmation mode: only y confirms, n/Esc cancel, everything else blocked
    if view_state.confirm_clear {
        return handle_confirm_clear(key_event, view_state);
    }

    // Login modal: capture the password, Enter checks it, Esc cancels
    if view_state.login_modal {
        return handle_login_modal(key_event, view_state);
    }

    // Chat input mode: capture printable characters, Enter submits
    if view_state.input_mode {
        return handle_input_mode(key_event, view_state);
    }

    // Normal mode key dispatch
    match key_event.code {
        // Tab switching; the dashboard is gated behind the speaker password
        KeyCode::Char('1') => {
            view_state.active_tab = TabId::Chat;
            None
        }
        KeyCode::Char('2') => {
            view_state.active_tab = TabId::Board;
            None
        }
        KeyCode::Char('3') => {
            if view_state.authenticated {
                view_state.active_tab = TabId::Dashboard;
            } else {
                view_state.login_modal = true;
                view_state.password_text.clear();
                view_state.login_error = None;
            }
            None
        }

        // Selection / scrolling
        KeyCode::Up | KeyCode::Char('k') => {
            move_up(view_state);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_down(view_state);
            None
        }

        // Chat input entry
        KeyCode::Char('i') | KeyCode::Enter => {
            if view_state.active_tab == TabId::Chat {
                view_state.input_mode = true;
            }
            None
        }

        // Feedback on the most recent reply that still offers it
        KeyCode::Char('g') => feedback_command(view_state, true),
        KeyCode::Char('b') => feedback_command(view_state, false),

        // Dashboard actions
        KeyCode::Char('p') => {
            if view_state.active_tab == TabId::Dashboard {
                view_state.dashboard_tab = match view_state.dashboard_tab {
                    QuestionStatus::Pending => QuestionStatus::Resolved,
                    QuestionStatus::Resolved => QuestionStatus::Pending,
                };
                view_state.selected = 0;
            }
            None
        }
        KeyCode::Char('h') => {
            if view_state.active_tab == TabId::Dashboard {
                return view_state.selected_question_id().map(UserCommand::ToggleHidden);
            }
            None
        }
        KeyCode::Char('r') => {
            if view_state.active_tab == TabId::Dashboard {
                return view_state.selected_question_id().map(UserCommand::Resolve);
            }
            None
        }
        KeyCode::Char('e') => {
            if view_state.active_tab == TabId::Dashboard {
                return Some(UserCommand::Export);
            }
            None
        }
        KeyCode::Char('x') => {
            if view_state.active_tab == TabId::Dashboard {
                view_state.confirm_clear = true;
            }
            None
        }

        // Escape: dismiss the current notice
        KeyCode::Esc => {
            view_state.notice = None;
            None
        }

        KeyCode::Char('q') => Some(UserCommand::Quit),

        _ => None,
    }
}

/// Handle key events while the clear-all confirmation dialog is open.
///
/// - `y` confirms (sends UserCommand::ClearAll)
/// - `n` or `Esc` cancels
/// - All other keys are blocked
fn handle_confirm_clear(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            view_state.confirm_clear = false;
            Some(UserCommand::ClearAll)
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_clear = false;
            None
        }
        _ => None, // Block all other input
    }
}

/// Handle key events while the speaker login modal is open.
///
/// The password check is local: the expected password comes from config
/// and never leaves the process. A wrong password keeps the modal open
/// with an error line; Esc abandons the attempt.
fn handle_login_modal(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.login_modal = false;
            view_state.password_text.clear();
            view_state.login_error = None;
            None
        }
        KeyCode::Enter => {
            if auth::check_password(&view_state.password_text, &view_state.speaker_password) {
                view_state.authenticated = true;
                view_state.login_modal = false;
                view_state.active_tab = TabId::Dashboard;
                view_state.password_text.clear();
                view_state.login_error = None;
            } else {
                view_state.login_error = Some(auth::LOGIN_ERROR.to_string());
                view_state.password_text.clear();
            }
            None
        }
        KeyCode::Backspace => {
            view_state.password_text.pop();
            None
        }
        KeyCode::Char(c) => {
            view_state.password_text.push(c);
            None
        }
        _ => None,
    }
}

/// Handle key events while the chat input box has focus.
///
/// - Printable characters are appended to the input buffer
/// - Backspace removes the last character
/// - Enter submits the question (blank input is ignored)
/// - Esc leaves input mode, keeping the draft text
fn handle_input_mode(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Esc => {
            view_state.input_mode = false;
            None
        }
        KeyCode::Enter => {
            let text = view_state.input_text.trim().to_string();
            if text.is_empty() {
                return None;
            }
            view_state.input_text.clear();
            Some(UserCommand::SubmitQuestion(text))
        }
        KeyCode::Backspace => {
            view_state.input_text.pop();
            None
        }
        KeyCode::Char(c) => {
            view_state.input_text.push(c);
            None
        }
        _ => None,
    }
}

/// Build a feedback command targeting the most recent reply still
/// offering feedback. Only meaningful on the chat tab.
fn feedback_command(view_state: &ViewState, helpful: bool) -> Option<UserCommand> {
    if view_state.active_tab != TabId::Chat {
        return None;
    }
    view_state
        .transcript
        .iter()
        .rposition(|m| m.show_feedback)
        .map(|message_index| UserCommand::Feedback {
            message_index,
            helpful,
        })
}

/// Move the dashboard selection up, or scroll the active panel up.
fn move_up(view_state: &mut ViewState) {
    if view_state.active_tab == TabId::Dashboard {
        view_state.selected = view_state.selected.saturating_sub(1);
    } else {
        let key = scroll_key(view_state);
        let offset = view_state.scroll_offset.entry(key.to_string()).or_insert(0);
        *offset = offset.saturating_sub(1);
    }
}

/// Move the dashboard selection down, or scroll the active panel down.
fn move_down(view_state: &mut ViewState) {
    if view_state.active_tab == TabId::Dashboard {
        let len = view_state.dashboard_questions().len();
        if len > 0 && view_state.selected + 1 < len {
            view_state.selected += 1;
        }
    } else {
        let key = scroll_key(view_state);
        let offset = view_state.scroll_offset.entry(key.to_string()).or_insert(0);
        *offset = offset.saturating_add(1);
    }
}

/// Get the widget key for scroll state based on the active tab.
fn scroll_key(view_state: &ViewState) -> &'static str {
    match view_state.active_tab {
        TabId::Chat => "chat",
        TabId::Board => "board",
        TabId::Dashboard => "dashboard",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
