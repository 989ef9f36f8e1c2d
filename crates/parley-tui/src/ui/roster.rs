//! Online users sidebar
//!
//! Lists the roster with ourselves first and the private target highlighted.

use parley_app::App;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

const TARGET_PREFIX: &str = ">";
const PLAIN_PREFIX: &str = " ";
const SELF_SUFFIX: &str = " (you)";

/// Render the roster sidebar.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let target = app.mode().target();

    let items: Vec<ListItem> = app
        .roster()
        .names()
        .iter()
        .map(|name| {
            let is_self = app.identity() == Some(name.as_str());
            let is_target = target == Some(name.as_str());

            let (prefix, suffix, style) = if is_self {
                (PLAIN_PREFIX, SELF_SUFFIX, Style::default().add_modifier(Modifier::BOLD))
            } else if is_target {
                (
                    TARGET_PREFIX,
                    "",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )
            } else {
                (PLAIN_PREFIX, "", Style::default())
            };

            ListItem::new(Line::from(vec![
                Span::raw(prefix),
                Span::styled(name.clone(), style),
                Span::styled(suffix, Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let title = format!(" Online ({}) ", app.roster().len());
    let block = Block::default().borders(Borders::ALL).title(title);

    frame.render_widget(List::new(items).block(block), area);
}
