//! Input line
//!
//! Displays the input buffer with cursor. The prompt names the private target
//! so it is clear where a line will go.

use parley_app::{App, ConversationMode, InputState};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
};

const INPUT_LINE_OFFSET_Y: u16 = 1; // inside top border
const LEFT_PADDING: u16 = 1; // inside left border
const RIGHT_PADDING: u16 = 1; // inside right border

/// Prompt shown before the buffer.
pub fn prompt(mode: &ConversationMode) -> String {
    match mode {
        ConversationMode::Public => "> ".to_owned(),
        ConversationMode::Private { target: Some(target) } => format!("{target}> "),
        ConversationMode::Private { target: None } => "?> ".to_owned(),
    }
}

/// Render the input line.
pub fn render(frame: &mut Frame, app: &App, input: &InputState, area: Rect) {
    let block = Block::default().borders(Borders::ALL);

    let prompt = prompt(app.mode());
    let paragraph = Paragraph::new(format!("{prompt}{}", input.buffer()))
        .style(Style::default().fg(Color::White))
        .block(block);

    frame.render_widget(paragraph, area);

    // Wide characters take two columns.
    let before_cursor: String = input.buffer().chars().take(input.cursor()).collect();
    let offset = Span::raw(prompt).width() + Span::raw(before_cursor).width();
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);

    let cursor_x = area.x.saturating_add(LEFT_PADDING).saturating_add(offset);
    let cursor_y = area.y.saturating_add(INPUT_LINE_OFFSET_Y);
    let max_x = area.x.saturating_add(area.width).saturating_sub(RIGHT_PADDING);

    frame.set_cursor_position((cursor_x.min(max_x), cursor_y));
}
