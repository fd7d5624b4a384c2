// Speaker dashboard widget: triage list plus a detail pane.
//
// Two sub-tabs (pending / resolved), newest first. Hidden questions stay
// listed here with a marker; they are only dropped from the public board.
// The detail pane shows the selected question's suggested replies.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::board::question::{Question, QuestionStatus};
use crate::tui::ViewState;

/// Marker appended to questions hidden from the public board.
pub const HIDDEN_MARKER: &str = "(隱藏中)";

/// Shown when the current sub-tab has no questions.
pub const EMPTY_LIST: &str = "此分類目前沒有問題";

/// Render the dashboard into the given area.
pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // question list
            Constraint::Length(6), // detail pane
        ])
        .split(area);

    render_list(frame, sections[0], state);
    render_detail(frame, sections[1], state);
}

fn render_list(frame: &mut Frame, area: Rect, state: &ViewState) {
    let questions = state.dashboard_questions();
    let title = format!("{} ({})", sub_tab_title(state.dashboard_tab), questions.len());

    if questions.is_empty() {
        let paragraph = Paragraph::new(format!("  {}", EMPTY_LIST))
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_rows = (area.height as usize).saturating_sub(2);
    let total = questions.len();

    // Keep the selection inside the visible window
    let window_start = state
        .selected
        .saturating_sub(visible_rows.saturating_sub(1))
        .min(total.saturating_sub(visible_rows));

    let items: Vec<ListItem> = questions
        .iter()
        .enumerate()
        .skip(window_start)
        .take(visible_rows.max(1))
        .map(|(i, q)| {
            let mut line = question_line(q);
            if i == state.selected {
                line = line.style(
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                );
            }
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(list, area);
}

fn render_detail(frame: &mut Frame, area: Rect, state: &ViewState) {
    let questions = state.dashboard_questions();
    let content: Vec<Line> = match questions.get(state.selected) {
        Some(q) if !q.suggested_replies.is_empty() => q
            .suggested_replies
            .iter()
            .map(|r| Line::from(format!("・{}", r)))
            .collect(),
        Some(_) => vec![Line::from(Span::styled(
            "（無建議回覆）",
            Style::default().fg(Color::DarkGray),
        ))],
        None => Vec::new(),
    };

    let paragraph =
        Paragraph::new(content).block(Block::default().borders(Borders::ALL).title("建議回覆"));
    frame.render_widget(paragraph, area);
}

/// Title for the dashboard sub-tab.
pub fn sub_tab_title(tab: QuestionStatus) -> &'static str {
    match tab {
        QuestionStatus::Pending => "待處理問題",
        QuestionStatus::Resolved => "已解決問題",
    }
}

/// Format a single dashboard row.
pub fn question_line(question: &Question) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            format!("[{}] ", question.category),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(question.text.clone(), Style::default().fg(Color::White)),
    ];
    if question.is_hidden {
        spans.push(Span::styled(
            format!(" {}", HIDDEN_MARKER),
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
