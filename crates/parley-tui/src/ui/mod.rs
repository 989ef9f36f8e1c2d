//! UI rendering
//!
//! Rendering functions that convert App state into terminal output using
//! ratatui widgets. All functions are pure (no I/O), taking state and
//! returning widget trees.

mod chat;
mod input;
mod roster;
mod status;

use parley_app::{App, InputState};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
};

pub use chat::message_line;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App, input: &InputState) {
    const MAIN_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(MAIN_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [main_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    render_main_area(frame, app, *main_area);
    input::render(frame, app, input, *input_area);
    status::render(frame, app, *status_area);
}

/// Render the main area (chat + roster sidebar).
fn render_main_area(frame: &mut Frame, app: &App, area: Rect) {
    const ROSTER_SIDEBAR_WIDTH: u16 = 18;
    const CHAT_AREA_MIN_WIDTH: u16 = 20;

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(CHAT_AREA_MIN_WIDTH), Constraint::Length(ROSTER_SIDEBAR_WIDTH)])
        .split(area);

    let [chat_area, roster_area] = chunks.as_ref() else {
        return;
    };

    chat::render(frame, app, *chat_area);
    roster::render(frame, app, *roster_area);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_app::{AppEvent, ChatMessage, ChatMode};
    use parley_client::Roster;
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;

    fn screen(app: &App, input: &InputState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 16)).unwrap();
        terminal.draw(|frame| render(frame, app, input)).unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn empty_app_renders() {
        let app = App::new("localhost:8888".into());
        let screen = screen(&app, &InputState::new());

        assert!(screen.contains("Disconnected"));
        assert!(screen.contains("Online (0)"));
    }

    #[test]
    fn connected_app_shows_roster_and_transcript() {
        let mut app = App::new("localhost:8888".into());
        let _ = app.handle(AppEvent::Connected);
        let _ = app.handle(AppEvent::IdentityChanged { name: "alice".into() });
        let names = ["alice", "bob"].into_iter().map(String::from).collect();
        let _ = app.handle(AppEvent::RosterUpdated(Roster::from_collected(names, Some("alice"))));
        let _ = app.handle(AppEvent::Message(ChatMessage::peer(ChatMode::Public, "bob", "hey")));

        let screen = screen(&app, &InputState::new());

        assert!(screen.contains("Connected"));
        assert!(screen.contains("Online (2)"));
        assert!(screen.contains("<bob> hey"));
        assert!(screen.contains("alice (you)"));
    }
}
