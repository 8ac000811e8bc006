//! TUI views and rendering
//!
//! Draws the AppState; never modifies it.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tracing::trace;

use super::state::AppState;
use crate::pipeline::MessageTone;

mod colors {
    use ratatui::style::Color;

    pub const ACCENT: Color = Color::Rgb(0, 204, 238);
    pub const SUCCESS: Color = Color::Rgb(50, 205, 50);
    pub const WORKING: Color = Color::Rgb(255, 215, 0);
    pub const FAILED: Color = Color::Rgb(220, 20, 60);
    pub const DIM: Color = Color::DarkGray;
}

pub const TITLE: &str = "Coding Roadmap Generator";

/// Main render function
pub fn render(state: &AppState, frame: &mut Frame) {
    trace!(busy = state.is_busy(), "render: called");
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(3), // Idea input
            Constraint::Length(3), // Status
            Constraint::Min(0),    // Roadmap
            Constraint::Length(1), // Keys
        ])
        .split(frame.area());

    render_title(frame, chunks[0]);
    render_input(state, frame, chunks[1]);
    render_status(state, frame, chunks[2]);
    render_roadmap(state, frame, chunks[3]);
    render_footer(state, frame, chunks[4]);
}

fn render_title(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(TITLE, Style::default().fg(colors::ACCENT).add_modifier(Modifier::BOLD)),
        Span::styled(format!("  v{}", env!("CARGO_PKG_VERSION")), Style::default().fg(colors::DIM)),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_input(state: &AppState, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::ACCENT))
        .title(" Enter your app idea ");

    let content = if state.input.is_empty() && !state.is_busy() {
        Line::from(Span::styled(
            "Describe your app idea here...",
            Style::default().fg(colors::DIM),
        ))
    } else {
        Line::from(state.input.as_str())
    };
    frame.render_widget(Paragraph::new(content).block(block), area);

    if !state.is_busy() {
        let column = state.input[..state.cursor].chars().count() as u16;
        let x = (area.x + 1 + column).min(area.right().saturating_sub(2));
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}

fn render_status(state: &AppState, frame: &mut Frame, area: Rect) {
    let color = if state.failed {
        colors::FAILED
    } else {
        match MessageTone::of(&state.status) {
            MessageTone::Success => colors::SUCCESS,
            MessageTone::Starting | MessageTone::Info => colors::WORKING,
        }
    };

    let mut spans = vec![Span::styled(
        state.status.as_str(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if let Some(activity) = &state.activity {
        spans.push(Span::raw("   "));
        spans.push(Span::styled(activity.text(), Style::default().fg(colors::ACCENT)));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::ACCENT))
        .title(" Status ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_roadmap(state: &AppState, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::ACCENT))
        .title(" Roadmap ");

    let paragraph = if state.roadmap.is_empty() {
        Paragraph::new(Span::styled(
            "Roadmap will appear here.",
            Style::default().fg(colors::DIM),
        ))
    } else {
        Paragraph::new(tui_markdown::from_str(&state.roadmap)).scroll((state.scroll, 0))
    };
    frame.render_widget(paragraph.wrap(Wrap { trim: false }).block(block), area);
}

fn render_footer(state: &AppState, frame: &mut Frame, area: Rect) {
    let keys: &[(&str, &str)] = if state.is_busy() {
        &[("Ctrl-C", "cancel"), ("↑↓ PgUp PgDn", "scroll")]
    } else {
        &[("Enter", "generate"), ("↑↓ PgUp PgDn", "scroll"), ("Esc", "quit")]
    };

    let mut spans = Vec::new();
    for (key, action) in keys {
        spans.push(Span::styled(*key, Style::default().fg(colors::ACCENT)));
        spans.push(Span::styled(format!(" {}  ", action), Style::default().fg(Color::Gray)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
