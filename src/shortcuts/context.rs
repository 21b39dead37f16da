use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{Page, Selector};

static ISSUE_TABLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("table.issues").expect("issue table selector"));
static PROJECT_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"project-([a-zA-Z0-9_-]+)").expect("project class regex"));

/// What kind of page the host is showing right now. Derived from the
/// document on every key press, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub issue_list: bool,
    pub search_results: bool,
    pub project: Option<String>,
}

impl PageContext {
    pub fn detect(page: &dyn Page) -> Self {
        Self {
            issue_list: is_issue_list_page(page),
            search_results: is_search_results_page(page),
            project: current_project_slug(page),
        }
    }

    /// Search shortcuts apply only when the page is not also an issue list.
    pub fn search_only(&self) -> bool {
        self.search_results && !self.issue_list
    }
}

pub fn is_issue_list_page(page: &dyn Page) -> bool {
    page.select(None, &ISSUE_TABLE).is_some()
}

pub fn is_search_results_page(page: &dyn Page) -> bool {
    page.element_by_id("search-results").is_some()
}

pub fn current_project_slug(page: &dyn Page) -> Option<String> {
    PROJECT_CLASS
        .captures(page.body_class())
        .map(|caps| caps[1].to_string())
}
