use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{NodeId, Page, Selector};

use super::context::is_issue_list_page;
use super::style::SELECTED_CLASS;

fn selector(source: &str) -> Selector {
    Selector::parse(source).expect("built-in selector")
}

static ISSUE_ROWS: Lazy<Selector> = Lazy::new(|| selector("table.issues tbody tr"));
static ISSUE_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="/issues/"]"#));
static CHECKBOX: Lazy<Selector> = Lazy::new(|| selector(r#"input[type="checkbox"]"#));
static SEARCH_ENTRIES: Lazy<Selector> = Lazy::new(|| selector("dt"));
static ANY_LINK: Lazy<Selector> = Lazy::new(|| selector("a[href]"));
static PROJECT_LINK: Lazy<Selector> = Lazy::new(|| selector(r#"a[href^="/projects/"]"#));
static PROJECT_SCOPE: Lazy<Selector> = Lazy::new(|| selector(".project"));
/// Preferred link of a search entry, most specific result type first.
static SEARCH_LINKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        r#"a[href^="/attachments/"]"#,
        r#"a[href*="/wiki/"]"#,
        r#"a[href*="/repository/"]"#,
        r#"a.act-title[href^="/issues/"]"#,
        r#"a[href^="/issues/"]"#,
    ]
    .into_iter()
    .map(selector)
    .collect()
});
static ISSUE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/issues/(\d+)").expect("issue id regex"));

/// The two selectable collections the shortcut layer walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Issue,
    Search,
}

/// Rows of `kind` currently in the document that carry a usable link.
/// Recomputed on every call since the host may re-render the list.
pub fn rows(page: &dyn Page, kind: ListKind) -> Vec<NodeId> {
    match kind {
        ListKind::Issue => {
            if !is_issue_list_page(page) {
                return Vec::new();
            }
            page.select_all(None, &ISSUE_ROWS)
                .into_iter()
                .filter(|&row| page.select(Some(row), &ISSUE_LINK).is_some())
                .collect()
        }
        ListKind::Search => {
            let Some(results) = page.element_by_id("search-results") else {
                return Vec::new();
            };
            page.select_all(Some(results), &SEARCH_ENTRIES)
                .into_iter()
                .filter(|&entry| page.select(Some(entry), &ANY_LINK).is_some())
                .collect()
        }
    }
}

/// Mark the row at `index` as selected and clear every other row.
pub fn highlight(page: &mut dyn Page, kind: ListKind, index: Option<usize>) {
    for (i, row) in rows(page, kind).into_iter().enumerate() {
        page.set_class(row, SELECTED_CLASS, Some(i) == index);
    }
}

/// Index reached by moving `delta` rows from `current` in a list of `len`
/// rows. From no selection, forward lands on the first row and backward on
/// the last; otherwise the result is clamped to the list.
pub fn next_index(current: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return current;
    }
    let last = len - 1;
    Some(match current {
        None if delta > 0 => 0,
        None => last,
        Some(index) => index.saturating_add_signed(delta).min(last),
    })
}

/// Move the selection, highlight the new row and bring it into view.
/// Leaves `current` untouched when the list is empty.
pub fn step(page: &mut dyn Page, kind: ListKind, current: Option<usize>, delta: isize) -> Option<usize> {
    let list = rows(page, kind);
    let next = next_index(current, delta, list.len());
    if let Some(row) = next.and_then(|i| list.get(i).copied()) {
        highlight(page, kind, next);
        page.scroll_into_view(row);
    }
    next
}

pub fn issue_link(page: &dyn Page, row: NodeId) -> Option<NodeId> {
    page.select(Some(row), &ISSUE_LINK)
}

pub fn checkbox(page: &dyn Page, row: NodeId) -> Option<NodeId> {
    page.select(Some(row), &CHECKBOX)
}

pub fn issue_id(href: &str) -> Option<u64> {
    ISSUE_ID
        .captures(href)
        .and_then(|caps| caps[1].parse().ok())
}

/// The link a search entry leads to: its project link for project hits,
/// otherwise the most specific typed link, otherwise the last link that is
/// not part of a project label.
pub fn search_link(page: &dyn Page, entry: NodeId) -> Option<NodeId> {
    if page.has_class(entry, "project") {
        return page.select(Some(entry), &PROJECT_LINK);
    }
    SEARCH_LINKS
        .iter()
        .find_map(|sel| page.select(Some(entry), sel))
        .or_else(|| {
            page.select_all(Some(entry), &ANY_LINK)
                .into_iter()
                .filter(|&link| page.closest(link, &PROJECT_SCOPE).is_none())
                .last()
        })
}
