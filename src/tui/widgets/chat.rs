// Chat widget: transcript of questions and replies, plus the input box.
//
// Transcript is oldest-first; the visible window sticks to the bottom
// unless the user scrolls up. While a submission is in flight a typing
// indicator is appended after the last message.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::board::question::{ChatMessage, MessageKind};
use crate::tui::layout::chat_layout;
use crate::tui::ViewState;

/// Shown after the last message while a reply is pending.
pub const TYPING_INDICATOR: &str = "助理正在輸入…";

/// Reminder appended to replies that still accept feedback.
pub const FEEDBACK_HINT: &str = "(g:有幫助 b:沒幫助)";

/// Render the chat tab: transcript above, input box below.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (transcript_area, input_area) = chat_layout(area);

    render_transcript(frame, transcript_area, state);
    render_input_box(frame, input_area, state);
}

fn render_transcript(frame: &mut Frame, area: Rect, state: &ViewState) {
    let mut lines: Vec<Line> = state.transcript.iter().map(message_line).collect();
    if state.awaiting_reply {
        lines.push(Line::from(Span::styled(
            format!("  {}", TYPING_INDICATOR),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    let visible_rows = (area.height as usize).saturating_sub(2);
    let total = lines.len();

    // Scroll offset counts lines up from the bottom
    let scroll_up = state.scroll_offset.get("chat").copied().unwrap_or(0);
    let max_up = total.saturating_sub(visible_rows);
    let scroll_up = scroll_up.min(max_up);
    let skip = max_up - scroll_up;

    let items: Vec<ListItem> = lines
        .into_iter()
        .skip(skip)
        .take(visible_rows.max(1))
        .map(ListItem::new)
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("提問助理"));
    frame.render_widget(list, area);
}

fn render_input_box(frame: &mut Frame, area: Rect, state: &ViewState) {
    let (title, border_style) = if state.input_mode {
        ("輸入問題", Style::default().fg(Color::Cyan))
    } else {
        ("輸入問題 (i)", Style::default())
    };

    let content = if state.input_mode {
        format!("{}▏", state.input_text)
    } else {
        state.input_text.clone()
    };

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    frame.render_widget(paragraph, area);
}

/// Format a single transcript message for display.
pub fn message_line(message: &ChatMessage) -> Line<'static> {
    match message.kind {
        MessageKind::User => Line::from(Span::styled(
            format!("我: {}", message.text),
            Style::default().fg(Color::Cyan),
        )),
        MessageKind::System => {
            let mut spans = vec![Span::styled(
                format!("助理: {}", message.text),
                Style::default().fg(Color::Green),
            )];
            if message.show_feedback {
                spans.push(Span::styled(
                    format!(" {}", FEEDBACK_HINT),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            Line::from(spans)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
