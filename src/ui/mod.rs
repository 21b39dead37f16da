mod page_view;
mod popup;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::App;
use crate::shortcuts::PageContext;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    page_view::render(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    if app.dispatcher.help_open() {
        popup::render_help(frame, &app.page);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let context = PageContext::detect(&app.page);
    let mut spans = vec![Span::styled(
        format!("blitz - {}", app.page.location()),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(project) = &context.project {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("project: {}", project),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(
        format!("{:?}", app.dispatcher.locale()).to_lowercase(),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if let Some(effect) = &app.last_effect {
        Line::from(vec![Span::styled(
            effect.as_str(),
            Style::default().fg(Color::Green),
        )])
    } else {
        let mut spans = vec![Span::styled(
            "?: shortcuts | F1: help | Ctrl+C: quit",
            Style::default().fg(Color::Gray),
        )];
        let pending = app.dispatcher.chord_keys();
        if !pending.is_empty() {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                pending,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if app.dispatcher.is_busy() {
            spans.push(Span::styled(" ...", Style::default().fg(Color::Yellow)));
        }
        Line::from(spans)
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}
