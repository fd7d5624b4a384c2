// TUI: layout, input handling, and widget rendering.
//
// The TUI owns a `ViewState` that mirrors the board state for rendering.
// The app orchestrator pushes `UiUpdate` messages over an mpsc channel;
// the TUI applies them to `ViewState` and re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::collections::HashMap;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyModifiers};
use futures_util::StreamExt;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::Frame;
use tokio::sync::mpsc;

use crate::board::question::{ChatMessage, Question, QuestionStatus};
use crate::protocol::{BoardSnapshot, UiUpdate, UserCommand};

use layout::{build_layout, AppLayout};

// ---------------------------------------------------------------------------
// TabId
// ---------------------------------------------------------------------------

/// Which view occupies the main panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabId {
    /// Audience chat: submit questions, read replies, give feedback.
    Chat,
    /// Public board: pending questions visible to the room.
    Board,
    /// Speaker dashboard: triage, resolve, hide, export.
    Dashboard,
}

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// TUI-local state that mirrors the board state for rendering.
///
/// Updated via `UiUpdate` messages from the app orchestrator. The
/// `render_frame` function reads this struct to draw the screen.
pub struct ViewState {
    /// All questions for the dashboard, newest first.
    pub questions: Vec<Question>,
    /// Pending, non-hidden questions for the public board, newest first.
    pub public_board: Vec<Question>,
    /// Chat transcript, oldest first.
    pub transcript: Vec<ChatMessage>,
    /// True while a submitted question is waiting for its reply.
    pub awaiting_reply: bool,
    /// Whether the remote backend is active (vs offline canned replies).
    pub remote_enabled: bool,
    /// Transient notice shown in the status bar (export result, reset, ...).
    pub notice: Option<String>,
    /// Which tab is active in the main panel.
    pub active_tab: TabId,
    /// Dashboard sub-tab: pending or resolved questions.
    pub dashboard_tab: QuestionStatus,
    /// Selected row in the dashboard question list.
    pub selected: usize,
    /// Per-widget scroll offsets (keyed by widget name).
    pub scroll_offset: HashMap<String, usize>,
    /// Chat input buffer.
    pub input_text: String,
    /// Whether the chat input box has keyboard focus.
    pub input_mode: bool,
    /// Whether the speaker login modal is open.
    pub login_modal: bool,
    /// Password buffer for the login modal.
    pub password_text: String,
    /// Error line shown in the login modal after a wrong password.
    pub login_error: Option<String>,
    /// Whether the speaker has unlocked the dashboard this session.
    pub authenticated: bool,
    /// Whether the clear-all confirmation dialog is open.
    pub confirm_clear: bool,
    /// Expected speaker password, from config.
    pub speaker_password: String,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            questions: Vec::new(),
            public_board: Vec::new(),
            transcript: Vec::new(),
            awaiting_reply: false,
            remote_enabled: false,
            notice: None,
            active_tab: TabId::Chat,
            dashboard_tab: QuestionStatus::Pending,
            selected: 0,
            scroll_offset: HashMap::new(),
            input_text: String::new(),
            input_mode: false,
            login_modal: false,
            password_text: String::new(),
            login_error: None,
            authenticated: false,
            confirm_clear: false,
            speaker_password: String::new(),
        }
    }
}

impl ViewState {
    /// Apply a full board snapshot from the app orchestrator.
    ///
    /// UI-local state (tab, selection mode, input buffers) is left
    /// unchanged; the selection index is clamped to the new list.
    pub fn apply_snapshot(&mut self, snapshot: BoardSnapshot) {
        self.questions = snapshot.questions;
        self.public_board = snapshot.public_board;
        self.transcript = snapshot.transcript;
        self.awaiting_reply = snapshot.awaiting_reply;
        self.remote_enabled = snapshot.remote_enabled;
        self.clamp_selection();
    }

    /// Questions shown on the current dashboard sub-tab.
    pub fn dashboard_questions(&self) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|q| q.status == self.dashboard_tab)
            .collect()
    }

    /// ID of the currently selected dashboard question, if any.
    pub fn selected_question_id(&self) -> Option<String> {
        self.dashboard_questions()
            .get(self.selected)
            .map(|q| q.id.clone())
    }

    /// Keep the selection index inside the current dashboard list.
    pub fn clamp_selection(&mut self) {
        let len = self.dashboard_questions().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// True when a modal or text-entry mode is consuming keystrokes.
    pub fn modal_active(&self) -> bool {
        self.input_mode || self.login_modal || self.confirm_clear
    }
}

// ---------------------------------------------------------------------------
// UiUpdate processing
// ---------------------------------------------------------------------------

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Snapshot(snapshot) => {
            state.apply_snapshot(*snapshot);
        }
        UiUpdate::Notice(text) => {
            state.notice = Some(text);
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

/// Render the complete frame: status bar, active tab panel, help bar,
/// and any modal overlay.
fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);

    match state.active_tab {
        TabId::Chat => widgets::chat::render(frame, layout.main_panel, state),
        TabId::Board => widgets::public_board::render(frame, layout.main_panel, state),
        TabId::Dashboard => widgets::dashboard::render(frame, layout.main_panel, state),
    }

    render_help_bar(frame, &layout, state);

    if state.login_modal {
        widgets::login_modal::render(frame, frame.area(), state);
    }
    if state.confirm_clear {
        widgets::clear_confirm::render(frame, frame.area());
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = help_text(state);
    let paragraph = ratatui::widgets::Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

/// Keyboard hints for the current mode and tab.
fn help_text(state: &ViewState) -> &'static str {
    if state.confirm_clear {
        " y:確認清除 | n/Esc:取消"
    } else if state.login_modal {
        " Enter:登入 | Esc:取消"
    } else if state.input_mode {
        " Enter:送出問題 | Esc:離開輸入"
    } else {
        match state.active_tab {
            TabId::Chat => " q:Quit | 1-3:Tabs | i:輸入問題 | g:有幫助 b:沒幫助",
            TabId::Board => " q:Quit | 1-3:Tabs | j/k:Scroll",
            TabId::Dashboard => {
                " q:Quit | 1-3:Tabs | p:切換狀態 | j/k:選取 | h:隱藏 r:解決 | e:匯出 x:清除"
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal (raw mode, alternate screen).
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, keyboard input, render ticks.
/// 4. Restores the terminal on clean exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    speaker_password: String,
) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    // Chain our restore hook before the original panic hook.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = ratatui::restore();
        original_hook(panic_info);
    }));

    let mut view_state = ViewState {
        speaker_password,
        ..ViewState::default()
    };

    let mut event_stream = EventStream::new();

    // Render interval (~30fps)
    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            // UI updates from the app orchestrator
            update = ui_rx.recv() => {
                match update {
                    Some(ui_update) => {
                        apply_ui_update(&mut view_state, ui_update);
                    }
                    None => {
                        // Channel closed: app is shutting down
                        break;
                    }
                }
            }

            // Keyboard input
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        // Ctrl+C always quits
                        if key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(KeyModifiers::CONTROL)
                        {
                            let _ = cmd_tx.send(UserCommand::Quit).await;
                            break;
                        }
                        // 'q' quits unless a modal or input box owns the key
                        if key_event.code == KeyCode::Char('q') && !view_state.modal_active() {
                            let _ = cmd_tx.send(UserCommand::Quit).await;
                            break;
                        }
                        if let Some(cmd) = input::handle_key(key_event, &mut view_state) {
                            let quit = matches!(cmd, UserCommand::Quit);
                            let _ = cmd_tx.send(cmd).await;
                            if quit {
                                break;
                            }
                        }
                    }
                    Some(Ok(_)) => {
                        // Mouse events, resize events, etc.
                    }
                    Some(Err(_)) => {
                        break;
                    }
                    None => {
                        break;
                    }
                }
            }

            // Render tick
            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, status: QuestionStatus) -> Question {
        let mut q = Question::new(format!("question {id}"), "未分類".to_string());
        q.id = id.to_string();
        q.status = status;
        q
    }

    fn snapshot_with(questions: Vec<Question>) -> BoardSnapshot {
        BoardSnapshot {
            questions,
            public_board: Vec::new(),
            transcript: Vec::new(),
            awaiting_reply: false,
            remote_enabled: true,
        }
    }

    #[test]
    fn view_state_default_is_sensible() {
        let state = ViewState::default();
        assert!(state.questions.is_empty());
        assert!(state.public_board.is_empty());
        assert!(state.transcript.is_empty());
        assert!(!state.awaiting_reply);
        assert!(state.notice.is_none());
        assert_eq!(state.active_tab, TabId::Chat);
        assert_eq!(state.dashboard_tab, QuestionStatus::Pending);
        assert_eq!(state.selected, 0);
        assert!(!state.input_mode);
        assert!(!state.login_modal);
        assert!(!state.authenticated);
        assert!(!state.confirm_clear);
    }

    #[test]
    fn apply_snapshot_updates_board_fields() {
        let mut state = ViewState::default();
        let mut snap = snapshot_with(vec![question("a", QuestionStatus::Pending)]);
        snap.awaiting_reply = true;
        state.apply_snapshot(snap);
        assert_eq!(state.questions.len(), 1);
        assert!(state.awaiting_reply);
        assert!(state.remote_enabled);
    }

    #[test]
    fn apply_snapshot_clamps_selection() {
        let mut state = ViewState::default();
        state.selected = 5;
        state.apply_snapshot(snapshot_with(vec![
            question("a", QuestionStatus::Pending),
            question("b", QuestionStatus::Pending),
        ]));
        assert_eq!(state.selected, 1);
    }

    #[test]
    fn apply_snapshot_resets_selection_when_empty() {
        let mut state = ViewState::default();
        state.selected = 3;
        state.apply_snapshot(snapshot_with(Vec::new()));
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn dashboard_questions_filter_by_sub_tab() {
        let mut state = ViewState::default();
        state.questions = vec![
            question("a", QuestionStatus::Pending),
            question("b", QuestionStatus::Resolved),
            question("c", QuestionStatus::Pending),
        ];
        let pending = state.dashboard_questions();
        assert_eq!(pending.len(), 2);
        state.dashboard_tab = QuestionStatus::Resolved;
        let resolved = state.dashboard_questions();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, "b");
    }

    #[test]
    fn selected_question_id_follows_selection() {
        let mut state = ViewState::default();
        state.questions = vec![
            question("a", QuestionStatus::Pending),
            question("b", QuestionStatus::Pending),
        ];
        state.selected = 1;
        assert_eq!(state.selected_question_id().as_deref(), Some("b"));
    }

    #[test]
    fn selected_question_id_none_when_empty() {
        let state = ViewState::default();
        assert!(state.selected_question_id().is_none());
    }

    #[test]
    fn apply_ui_update_notice() {
        let mut state = ViewState::default();
        apply_ui_update(&mut state, UiUpdate::Notice("已匯出".to_string()));
        assert_eq!(state.notice.as_deref(), Some("已匯出"));
    }

    #[test]
    fn apply_ui_update_snapshot() {
        let mut state = ViewState::default();
        apply_ui_update(
            &mut state,
            UiUpdate::Snapshot(Box::new(snapshot_with(vec![question(
                "a",
                QuestionStatus::Pending,
            )]))),
        );
        assert_eq!(state.questions.len(), 1);
    }

    #[test]
    fn modal_active_covers_all_modes() {
        let mut state = ViewState::default();
        assert!(!state.modal_active());
        state.input_mode = true;
        assert!(state.modal_active());
        state.input_mode = false;
        state.login_modal = true;
        assert!(state.modal_active());
        state.login_modal = false;
        state.confirm_clear = true;
        assert!(state.modal_active());
    }

    #[test]
    fn help_text_matches_mode() {
        let mut state = ViewState::default();
        assert!(help_text(&state).contains("i:輸入問題"));
        state.active_tab = TabId::Dashboard;
        assert!(help_text(&state).contains("e:匯出"));
        state.input_mode = true;
        assert!(help_text(&state).contains("送出"));
        state.confirm_clear = true;
        assert!(help_text(&state).contains("確認清除"));
    }
}
