//! Page fixtures: a TOML "site" of pages whose bodies are written as an
//! indented outline, one element per line:
//!
//! ```text
//! table.issues
//!   tbody
//!     tr.issue
//!       td
//!         input[type="checkbox"]
//!       td
//!         a[href="/issues/12"] | Crash on save
//! ```
//!
//! Each line is `tag#id.class[name="value"]`, any part optional, followed
//! by an optional ` | text`. The attribute names `value`, `checked`,
//! `hidden` and `deferred` set element state instead of attributes.

use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use serde::Deserialize;
use tracing::debug;

use crate::error::{BlitzError, Result};

use super::{Element, IssuePeople, MemoryPage};

#[derive(Debug, Clone, Deserialize)]
pub struct PageFixture {
    pub path: String,
    #[serde(default)]
    pub body_class: String,
    #[serde(default)]
    pub outline: String,
    pub author: Option<u64>,
    pub last_updated_by: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Site {
    #[serde(default = "default_language")]
    pub language: String,
    pub start: Option<String>,
    /// Outline shared by every page, placed before the page's own elements.
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub pages: Vec<PageFixture>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Site {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let site: Site = toml::from_str(content)?;
        if site.pages.is_empty() {
            return Err(BlitzError::Fixture("site has no pages".to_string()));
        }
        parse_outline(&site.layout)?;
        for page in &site.pages {
            parse_outline(&page.outline).map_err(|err| {
                BlitzError::Fixture(format!("page {}: {}", page.path, err))
            })?;
        }
        Ok(site)
    }

    pub fn start(&self) -> &str {
        self.start
            .as_deref()
            .or_else(|| self.pages.first().map(|p| p.path.as_str()))
            .unwrap_or("/")
    }

    /// Load the page at `location`. Paths the site does not define open as
    /// a page holding only the shared layout.
    pub fn open(&self, location: &str) -> Result<MemoryPage> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location);

        let Some(fixture) = self.pages.iter().find(|p| p.path == path) else {
            debug!(location, "no fixture for location, opening blank page");
            return MemoryPage::from_outline(location, &self.language, "", &self.layout);
        };

        let outline = format!("{}\n{}", self.layout, fixture.outline);
        let page = MemoryPage::from_outline(location, &self.language, &fixture.body_class, &outline)?;
        Ok(page.with_people(IssuePeople {
            author: fixture.author,
            last_updated_by: fixture.last_updated_by,
        }))
    }
}

/// Parse an outline into its top-level elements.
pub fn parse_outline(source: &str) -> Result<Vec<Element>> {
    let mut roots = Vec::new();
    let mut stack: Vec<(usize, Element)> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let content = line.trim();
        if content.is_empty() || content.starts_with("//") {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let element = parse_line(content)
            .map_err(|reason| BlitzError::Fixture(format!("line {}: {}", index + 1, reason)))?;

        while stack.last().is_some_and(|(top, _)| *top >= indent) {
            if let Some((_, done)) = stack.pop() {
                attach(&mut stack, &mut roots, done);
            }
        }
        stack.push((indent, element));
    }
    while let Some((_, done)) = stack.pop() {
        attach(&mut stack, &mut roots, done);
    }

    Ok(roots)
}

fn attach(stack: &mut [(usize, Element)], roots: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some((_, parent)) => parent.children.push(element),
        None => roots.push(element),
    }
}

fn parse_line(line: &str) -> std::result::Result<Element, String> {
    let (head, text) = split_text(line);
    let head = parse_head(head)?;

    let mut element = Element::new(head.tag.as_deref().unwrap_or("div"));
    if let Some(id) = head.id {
        element.attrs.insert("id".to_string(), id);
    }
    if !head.classes.is_empty() {
        element
            .attrs
            .insert("class".to_string(), head.classes.join(" "));
    }
    for (name, value) in head.attrs {
        match name.as_str() {
            "value" => element.value = value,
            "checked" => element.checked = true,
            "hidden" => element.hidden = true,
            "deferred" => element.deferred = true,
            _ => {
                element.attrs.insert(name, value);
            }
        }
    }
    element.text = text.to_string();
    Ok(element)
}

#[derive(Debug, Default)]
struct Head {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
}

fn parse_head(source: &str) -> std::result::Result<Head, String> {
    let mut chars = source.trim().chars().peekable();
    let tag = take_name(&mut chars);
    let mut head = Head {
        tag: (!tag.is_empty()).then(|| tag.to_ascii_lowercase()),
        ..Head::default()
    };

    while let Some(c) = chars.next() {
        match c {
            '#' => head.id = Some(name(&mut chars)?),
            '.' => head.classes.push(name(&mut chars)?),
            '[' => head.attrs.push(attribute(&mut chars)?),
            c => return Err(format!("unexpected `{c}`")),
        }
    }

    if head.tag.is_none() && head.id.is_none() && head.classes.is_empty() && head.attrs.is_empty() {
        return Err("expected an element".to_string());
    }
    Ok(head)
}

fn take_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !(c.is_alphanumeric() || c == '-' || c == '_') {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

fn name(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<String, String> {
    let name = take_name(chars);
    if name.is_empty() {
        return Err(match chars.peek() {
            Some(c) => format!("expected a name, found `{c}`"),
            None => "expected a name".to_string(),
        });
    }
    Ok(name)
}

/// `[name]` or `[name=value]`, the opening bracket already consumed.
fn attribute(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<(String, String), String> {
    let name = name(chars)?;
    match chars.next() {
        Some(']') => return Ok((name, String::new())),
        Some('=') => {}
        _ => return Err(format!("`{name}` must be a plain attribute")),
    }

    let value = match chars.peek().copied() {
        Some(quote @ ('"' | '\'')) => {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some(c) if c == quote => break,
                    Some(c) => value.push(c),
                    None => return Err("unterminated string".to_string()),
                }
            }
            value
        }
        _ => {
            let mut value = String::new();
            while let Some(&c) = chars.peek() {
                if c == ']' {
                    break;
                }
                value.push(c);
                chars.next();
            }
            value.trim().to_string()
        }
    };

    match chars.next() {
        Some(']') => Ok((name, value)),
        _ => Err("expected `]`".to_string()),
    }
}

/// Split `selector | text` at the first bar outside quotes.
fn split_text(line: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '|') => return (line[..i].trim_end(), line[i + 1..].trim()),
            _ => {}
        }
    }
    (line, "")
}
