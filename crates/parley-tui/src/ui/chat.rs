//! Chat area
//!
//! Displays the transcript, newest line at the bottom.

use parley_app::{App, ChatMessage, ChatMode, ConversationMode, Origin};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const BORDER_SIZE: u16 = 2;

/// Render the chat area.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.mode() {
        ConversationMode::Public => " Public ".to_owned(),
        ConversationMode::Private { target: Some(target) } => format!(" Private: {target} "),
        ConversationMode::Private { target: None } => " Private (Tab to pick) ".to_owned(),
    };

    let block = Block::default().borders(Borders::ALL).title(title);

    let items: Vec<ListItem> = if app.transcript().is_empty() {
        vec![ListItem::new(Line::from(Span::styled(
            "Waiting for the server...",
            Style::default().fg(Color::DarkGray),
        )))]
    } else {
        app.transcript().iter().map(|msg| ListItem::new(message_line(msg))).collect()
    };

    let visible_height = area.height.saturating_sub(BORDER_SIZE) as usize;
    let skip = items.len().saturating_sub(visible_height);
    let visible_items: Vec<_> = items.into_iter().skip(skip).collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

/// One transcript line, styled by origin and channel.
pub fn message_line(msg: &ChatMessage) -> Line<'static> {
    let sender = msg.sender.as_deref().filter(|s| !s.is_empty());

    match (msg.origin, sender) {
        (Origin::System, _) | (_, None) => Line::from(Span::styled(
            format!("* {}", msg.text),
            Style::default().fg(Color::DarkGray),
        )),
        (origin, Some(sender)) => {
            let color = match (origin, msg.mode) {
                (_, ChatMode::Private) => Color::Magenta,
                (Origin::SelfAuthored, ChatMode::Public) => Color::Cyan,
                _ => Color::Green,
            };
            let mut spans = Vec::with_capacity(4);
            if msg.mode == ChatMode::Private {
                spans.push(Span::styled("[private] ", Style::default().fg(Color::Magenta)));
            }
            spans.push(Span::styled(
                format!("<{sender}>"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(" "));
            spans.push(Span::raw(msg.text.clone()));
            Line::from(spans)
        },
    }
}
