// Status bar widget: backend mode indicator, tab bar, transient notice.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::tui::{TabId, ViewState};

/// Render the status bar into the given area.
///
/// Layout: [mode indicator] [tab bar] [notice]
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut spans = Vec::new();

    // Backend mode indicator
    let (dot, dot_color) = mode_indicator(state.remote_enabled);
    spans.push(Span::styled(
        format!(" {} ", dot),
        Style::default().fg(dot_color),
    ));
    spans.push(Span::styled(
        mode_label(state.remote_enabled),
        Style::default().fg(Color::White),
    ));

    // Separator
    spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));

    // Tab bar
    spans.extend(tab_spans(state.active_tab));

    // Transient notice
    if let Some(notice) = &state.notice {
        spans.push(Span::styled(" | ", Style::default().fg(Color::Gray)));
        spans.push(Span::styled(
            notice.clone(),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Return the mode dot character and its color.
pub fn mode_indicator(remote_enabled: bool) -> (&'static str, Color) {
    if remote_enabled {
        ("●", Color::Green)
    } else {
        ("●", Color::Blue)
    }
}

/// Return the label for the backend mode.
pub fn mode_label(remote_enabled: bool) -> &'static str {
    if remote_enabled {
        "遠端模式"
    } else {
        "離線模式"
    }
}

/// Build tab indicator spans with labels and the active tab highlighted.
/// E.g. "[1:提問] [2:公開看板] [3:講者後台]"
pub fn tab_spans(active: TabId) -> Vec<Span<'static>> {
    let tabs = [
        (TabId::Chat, "1:提問"),
        (TabId::Board, "2:公開看板"),
        (TabId::Dashboard, "3:講者後台"),
    ];

    let mut spans = Vec::new();
    for (tab_id, label) in tabs {
        let style = if tab_id == active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        spans.push(Span::styled(format!("[{}]", label), style));
        spans.push(Span::raw(" "));
    }
    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
