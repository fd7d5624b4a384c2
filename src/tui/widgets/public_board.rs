// Public board widget: pending, non-hidden questions for the room.
//
// Newest first. Each row: "[category] question text".

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::board::question::Question;
use crate::tui::ViewState;

/// Shown when no question is waiting for the speaker.
pub const EMPTY_BOARD: &str = "目前沒有待回覆的問題";

/// Render the public board into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let title = format!("公開提問看板 ({})", state.public_board.len());

    if state.public_board.is_empty() {
        let paragraph = Paragraph::new(format!("  {}", EMPTY_BOARD))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_rows = (area.height as usize).saturating_sub(2);
    let total = state.public_board.len();

    let scroll_offset = state.scroll_offset.get("board").copied().unwrap_or(0);
    let scroll_offset = scroll_offset.min(total.saturating_sub(visible_rows));

    let items: Vec<ListItem> = state
        .public_board
        .iter()
        .skip(scroll_offset)
        .take(visible_rows.max(1))
        .map(|q| ListItem::new(question_line(q)))
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

/// Format a single board entry.
pub fn question_line(question: &Question) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("[{}] ", question.category),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(question.text.clone(), Style::default().fg(Color::White)),
    ])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
