use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use once_cell::sync::Lazy;

use crate::dom::{NodeId, Page, Selector};
use crate::shortcuts::OVERLAY_ID;

const KEY_WIDTH: usize = 22;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("built-in selector"));
static ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("built-in selector"));

/// Render the shortcut overlay the page holds as a centered popup.
pub fn render_help(frame: &mut Frame, page: &dyn Page) {
    let Some(overlay) = page.element_by_id(OVERLAY_ID) else {
        return;
    };
    let title = page
        .select(Some(overlay), &TITLE)
        .map(|node| page.text(node).to_string())
        .unwrap_or_default();

    let lines: Vec<Line> = page
        .select_all(Some(overlay), &ROWS)
        .into_iter()
        .flat_map(|row| row_lines(page, row))
        .collect();

    let height = (lines.len() + 2) as u16;
    let area = centered_rect(60, height, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(lines).block(
        Block::default().borders(Borders::ALL).title(Span::styled(
            format!(" {} ", title),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    );
    frame.render_widget(popup, area);
}

fn row_lines(page: &dyn Page, row: NodeId) -> Vec<Line<'static>> {
    if page.has_class(row, "separator") {
        return vec![Line::from(Span::styled(
            "─".repeat(KEY_WIDTH + 12),
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let cells: Vec<String> = page
        .children(row)
        .iter()
        .map(|&cell| cell_text(page, cell))
        .collect();
    let [keys, label] = cells.as_slice() else {
        return Vec::new();
    };
    let header = page
        .children(row)
        .first()
        .is_some_and(|&cell| page.tag(cell) == "th");

    let key_style = if header {
        Style::default().fg(Color::Gray)
    } else {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    };

    // Long labels wrap onto continuation lines under the action column
    label
        .split('\n')
        .enumerate()
        .map(|(i, part)| {
            let key = if i == 0 { keys.as_str() } else { "" };
            Line::from(vec![
                Span::styled(format!("{key:<KEY_WIDTH$}"), key_style),
                Span::raw(part.to_string()),
            ])
        })
        .collect()
}

fn cell_text(page: &dyn Page, node: NodeId) -> String {
    let mut text = page.text(node).to_string();
    for &child in page.children(node) {
        text.push_str(&cell_text(page, child));
    }
    text
}

/// Create a centered rect using percentage of the outer rect
fn centered_rect(width: u16, height: u16, outer: Rect) -> Rect {
    let popup_width = width.min(outer.width);
    let popup_height = height.min(outer.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((outer.height.saturating_sub(popup_height)) / 2),
            Constraint::Length(popup_height),
            Constraint::Min(0),
        ])
        .split(outer);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length((outer.width.saturating_sub(popup_width)) / 2),
            Constraint::Length(popup_width),
            Constraint::Min(0),
        ])
        .split(vertical[1]);

    horizontal[1]
}
