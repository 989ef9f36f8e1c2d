//! Status bar
//!
//! Displays connection state, our name and the latest status message.

use parley_app::{App, ConnectionState};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Render the status bar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let connection_status = match app.connection_state() {
        ConnectionState::Disconnected => {
            Span::styled("Disconnected", Style::default().fg(Color::Red))
        },
        ConnectionState::Connecting => {
            Span::styled("Connecting...", Style::default().fg(Color::Yellow))
        },
        ConnectionState::Connected => Span::styled(
            "Connected",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };

    let status_line = Line::from(vec![
        Span::raw(" "),
        connection_status,
        Span::styled(details(app), Style::default().fg(Color::Gray)),
    ]);

    let paragraph =
        Paragraph::new(status_line).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn details(app: &App) -> String {
    let mut out = String::new();
    if let Some(name) = app.identity() {
        out.push_str(" | ");
        out.push_str(name);
    }
    if let Some(message) = app.status_message() {
        out.push_str(" | ");
        out.push_str(message);
    }
    out
}
