use tracing::trace;

use crate::dom::{NodeId, Page};

use super::rows::{self, ListKind};

/// Consecutive Escapes that clear the selection and every checkbox.
const FULL_CLEAR_ESCAPES: u8 = 2;

/// What an Escape press did to the issue selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleared {
    /// Keyboard selection dropped, checkboxes untouched.
    Selection,
    /// Selection dropped and every checked row unchecked.
    Everything,
}

/// Where Enter on an issue list leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenTarget {
    Bulk(Vec<u64>),
    Issue(String),
}

impl OpenTarget {
    pub fn url(&self) -> String {
        match self {
            OpenTarget::Bulk(ids) => {
                let query = ids
                    .iter()
                    .map(|id| format!("ids[]={id}"))
                    .collect::<Vec<_>>()
                    .join("&");
                format!("/issues/bulk_edit?{query}")
            }
            OpenTarget::Issue(href) => href.clone(),
        }
    }
}

/// Keyboard selection per list kind plus the double-Escape counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    issue: Option<usize>,
    search: Option<usize>,
    escapes: u8,
}

impl Selection {
    pub fn index(&self, kind: ListKind) -> Option<usize> {
        match kind {
            ListKind::Issue => self.issue,
            ListKind::Search => self.search,
        }
    }

    fn slot(&mut self, kind: ListKind) -> &mut Option<usize> {
        match kind {
            ListKind::Issue => &mut self.issue,
            ListKind::Search => &mut self.search,
        }
    }

    #[allow(dead_code)]
    pub fn escapes(&self) -> u8 {
        self.escapes
    }

    pub fn step(&mut self, page: &mut dyn Page, kind: ListKind, delta: isize) -> Option<usize> {
        let next = rows::step(page, kind, self.index(kind), delta);
        *self.slot(kind) = next;
        next
    }

    /// Toggle the checkbox of the selected issue row, selecting the first
    /// row when nothing is selected yet.
    pub fn toggle_checkbox(&mut self, page: &mut dyn Page) {
        let list = rows::rows(page, ListKind::Issue);
        if list.is_empty() {
            return;
        }

        let index = match self.issue {
            Some(index) if index < list.len() => index,
            // The host re-rendered a shorter list under us
            Some(_) => list.len() - 1,
            None => 0,
        };
        if self.issue != Some(index) {
            self.issue = Some(index);
            rows::highlight(page, ListKind::Issue, self.issue);
            page.scroll_into_view(list[index]);
        }

        if let Some(checkbox) = rows::checkbox(page, list[index]) {
            page.click(checkbox);
        }
    }

    /// Drop the issue selection; with `full`, also uncheck every checked row
    /// by clicking it so host change handlers run.
    pub fn clear(&mut self, page: &mut dyn Page, full: bool) {
        self.issue = None;
        rows::highlight(page, ListKind::Issue, None);

        if full {
            for row in rows::rows(page, ListKind::Issue) {
                if let Some(checkbox) = rows::checkbox(page, row) {
                    if page.is_checked(checkbox) {
                        page.click(checkbox);
                    }
                }
            }
        }
    }

    /// First Escape with a selected row clears only the selection; a second
    /// one in a row, or one with nothing selected, clears everything.
    pub fn escape(&mut self, page: &mut dyn Page) -> Cleared {
        self.escapes += 1;
        trace!(escapes = self.escapes, "escape pressed");
        if self.escapes < FULL_CLEAR_ESCAPES && self.issue.is_some() {
            self.clear(page, false);
            Cleared::Selection
        } else {
            self.clear(page, true);
            self.escapes = 0;
            Cleared::Everything
        }
    }

    pub fn reset_escapes(&mut self) {
        self.escapes = 0;
    }

    pub fn current_issue_link(&self, page: &dyn Page) -> Option<NodeId> {
        let row = *rows::rows(page, ListKind::Issue).get(self.issue?)?;
        rows::issue_link(page, row)
    }

    pub fn current_search_link(&self, page: &dyn Page) -> Option<NodeId> {
        let entry = *rows::rows(page, ListKind::Search).get(self.search?)?;
        rows::search_link(page, entry)
    }

    /// Checked rows win over the keyboard selection: two or more open the
    /// bulk editor, exactly one opens that issue.
    pub fn open_target(&self, page: &dyn Page) -> Option<OpenTarget> {
        let list = rows::rows(page, ListKind::Issue);
        let is_checked = |row: NodeId| {
            rows::checkbox(page, row).is_some_and(|checkbox| page.is_checked(checkbox))
        };

        let checked_ids: Vec<u64> = list
            .iter()
            .filter(|&&row| is_checked(row))
            .filter_map(|&row| rows::issue_link(page, row))
            .filter_map(|link| page.attr(link, "href").and_then(rows::issue_id))
            .collect();

        if checked_ids.len() >= 2 {
            return Some(OpenTarget::Bulk(checked_ids));
        }

        let target = if checked_ids.len() == 1 {
            list.iter().copied().find(|&row| is_checked(row))
        } else {
            self.issue.and_then(|index| list.get(index).copied())
        };

        let link = rows::issue_link(page, target?)?;
        page.attr(link, "href")
            .map(|href| OpenTarget::Issue(href.to_string()))
    }
}
