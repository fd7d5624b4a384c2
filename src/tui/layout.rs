// Screen layout: panel arrangement and sizing.
//
// Divides the terminal area into fixed zones for the Q&A board:
//
// +--------------------------------------------------+
// | Status Bar (1 row)                                |
// +--------------------------------------------------+
// | Main Panel (fill, switched by active tab)         |
// |                                                   |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+
//
// The chat tab further splits the main panel into a transcript area
// and a fixed-height input box at the bottom.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas for each zone.
#[derive(Debug, Clone)]
pub struct AppLayout {
    /// Top row: backend mode indicator and tab bar.
    pub status_bar: Rect,
    /// Middle section: tab-switched content area.
    pub main_panel: Rect,
    /// Bottom row: keyboard shortcut hints.
    pub help_bar: Rect,
}

/// Build the board layout from the available terminal area.
pub fn build_layout(area: Rect) -> AppLayout {
    // Vertical: status(1) | main(fill) | help(1)
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(8),    // main panel
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        main_panel: vertical[1],
        help_bar: vertical[2],
    }
}

/// Split the main panel for the chat tab: transcript above, input box below.
pub fn chat_layout(main_panel: Rect) -> (Rect, Rect) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(4),    // transcript
            Constraint::Length(3), // input box (bordered single line)
        ])
        .split(main_panel);

    (vertical[0], vertical[1])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
