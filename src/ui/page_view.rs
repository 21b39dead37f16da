use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::dom::{MemoryPage, NodeId, Page, ScrollTarget};
use crate::shortcuts::{OVERLAY_ID, SELECTED_CLASS};

/// Elements drawn as a single line with their descendants inlined.
const LINE_TAGS: &[&str] = &[
    "tr", "dt", "dd", "li", "h1", "h2", "h3", "h4", "p", "hr", "label", "a", "b", "span", "input",
    "textarea", "select", "button",
];

const CURSOR: &str = "▏";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let page = &app.page;
    let mut outline = Outline {
        page,
        focused: page.active_element(),
        anchor: page.scroll_anchor(),
        anchor_line: None,
        lines: Vec::new(),
    };
    outline.block(page.body(), 0);

    let height = area.height.saturating_sub(2) as usize;
    let total = outline.lines.len();
    let scroll = match outline.anchor_line {
        Some(line) => line.saturating_sub(height / 2),
        None => match app.scroll {
            ScrollTarget::Top => 0,
            ScrollTarget::Bottom => total.saturating_sub(height),
        },
    }
    .min(total.saturating_sub(height.min(total)));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", page.location()));
    let paragraph = Paragraph::new(outline.lines)
        .block(block)
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

struct Outline<'a> {
    page: &'a MemoryPage,
    focused: Option<NodeId>,
    anchor: Option<NodeId>,
    anchor_line: Option<usize>,
    lines: Vec<Line<'a>>,
}

impl<'a> Outline<'a> {
    fn skip(&self, node: NodeId) -> bool {
        !self.page.is_visible(node) || self.page.attr(node, "id") == Some(OVERLAY_ID)
    }

    fn block(&mut self, node: NodeId, depth: usize) {
        if self.skip(node) {
            return;
        }
        if self.anchor == Some(node) {
            self.anchor_line = Some(self.lines.len());
        }

        let page = self.page;
        if LINE_TAGS.contains(&page.tag(node)) {
            self.line(node, depth);
            return;
        }

        let text = page.text(node);
        let depth = if text.is_empty() {
            depth
        } else {
            self.lines.push(Line::from(vec![
                Span::raw(indent(depth)),
                Span::styled(text, Style::default().fg(Color::Gray)),
            ]));
            depth + 1
        };
        for &child in page.children(node) {
            self.block(child, depth);
        }
    }

    fn line(&mut self, node: NodeId, depth: usize) {
        let selected = self.page.has_class(node, SELECTED_CLASS);
        let mut spans = vec![Span::raw(indent(depth))];
        if selected {
            spans.push(Span::styled("▌ ", Style::default().fg(Color::Green)));
        }
        self.inline(node, &mut spans);

        let mut line = Line::from(spans);
        if selected {
            line = line.style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );
        }
        self.lines.push(line);
    }

    fn inline(&mut self, node: NodeId, spans: &mut Vec<Span<'a>>) {
        let page = self.page;
        if self.anchor == Some(node) && self.anchor_line.is_none() {
            self.anchor_line = Some(self.lines.len());
        }

        let text = page.text(node);
        let tag = page.tag(node);
        match tag {
            "input" if page.attr(node, "type") == Some("checkbox") => {
                let mark = if page.is_checked(node) { "[x]" } else { "[ ]" };
                push(spans, Span::raw(mark));
            }
            "input" | "textarea" | "select" => {
                let focused = self.focused == Some(node);
                let mut style = Style::default().add_modifier(Modifier::UNDERLINED);
                if focused {
                    style = style.fg(Color::Yellow);
                }
                let cursor = if focused { CURSOR } else { "" };
                push(
                    spans,
                    Span::styled(format!("[{}{}]", page.value(node), cursor), style),
                );
            }
            "hr" => push(spans, Span::styled("────────", Style::default().fg(Color::DarkGray))),
            "a" if !text.is_empty() => push(
                spans,
                Span::styled(
                    text,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ),
            "b" | "th" | "h1" | "h2" | "h3" | "h4" if !text.is_empty() => push(
                spans,
                Span::styled(text, Style::default().add_modifier(Modifier::BOLD)),
            ),
            _ if !text.is_empty() => push(spans, Span::raw(text)),
            _ => {}
        }

        for &child in page.children(node) {
            if !self.skip(child) {
                self.inline(child, spans);
            }
        }
    }
}

/// Append `span`, separated from the previous content by a space.
fn push<'a>(spans: &mut Vec<Span<'a>>, span: Span<'a>) {
    let needs_gap = spans
        .last()
        .is_some_and(|last| !last.content.is_empty() && !last.content.ends_with(' '));
    if needs_gap {
        spans.push(Span::raw(" "));
    }
    spans.push(span);
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::action::Action;
    use crate::config::Config;
    use crate::dom::Site;
    use crate::shortcuts::KeyInput;

    const SITE: &str = r#"
start = "/projects/demo/issues"
layout = ""

[[pages]]
path = "/projects/demo/issues"
body_class = "project-demo controller-issues"
outline = """
div#content
  h2 | Issues
  table.list.issues
    tbody
      tr.issue
        td.checkbox
          input[type="checkbox"]
        td.subject
          a[href="/issues/1"] | Crash on save
      tr.issue
        td.checkbox
          input[type="checkbox"]
        td.subject
          a[href="/issues/2"] | Slow search
"""
"#;

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(50, 10)).unwrap();
        terminal
            .draw(|frame| render(frame, app, frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn rows_render_as_lines_with_selection_marker() {
        let site = Site::from_toml(SITE).unwrap();
        let mut app = App::new(site, Config::default(), None).unwrap();
        let before = screen(&app);
        assert!(before.contains("[ ] Crash on save"));
        assert!(!before.contains('▌'));

        app.update(Action::Key(KeyInput::char('j')));
        app.update(Action::Key(KeyInput::char('x')));
        let after = screen(&app);
        assert!(after.contains("▌ [x] Crash on save"));
        assert!(after.contains("[ ] Slow search"));
    }
}
