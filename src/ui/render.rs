//! Terminal drawing: an external-collaborator concern per the component
//! design (ncurses/ratatui primitives aren't part of the core), kept to a
//! thin frame-builder so [`super::App`] stays render-library agnostic.

use super::{App, View};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

/// Draws one frame: a title bar, the scrolling result list (highlighting
/// the selection and the now-playing row), and a bottom search/info line.
/// Mirrors the original's three-window layout (`win_top`/`win_middle`/
/// `win_info`).
pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
        .split(area);

    draw_title(frame, app, chunks[0]);
    draw_list(frame, app, chunks[1]);
    draw_info(frame, app, chunks[2]);
}

fn draw_title(frame: &mut Frame, app: &App, area: Rect) {
    let label = match app.view {
        View::Splash => "glaciera".to_string(),
        View::Results => format!("glaciera — {} tracks", app.displaytunes.len()),
        View::Playlists | View::PlaylistSort { .. } => "playlists".to_string(),
        View::Context => "context".to_string(),
    };
    frame.render_widget(Paragraph::new(label), area);
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .displaytunes
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let mut style = Style::default();
            if Some(i) == app.now_playing_index {
                style = style.add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(Span::styled(slot.display().to_string(), style)))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::NONE)).highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_info(frame: &mut Frame, app: &App, area: Rect) {
    let text = if app.search_string.is_empty() {
        "Type to search, F2 View, F4 Context, F6 Playlists, F7 Save, Ctrl-P Pause".to_string()
    } else {
        format!("/{}", app.search_string)
    };
    frame.render_widget(Paragraph::new(text), area);
}
