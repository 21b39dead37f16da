use once_cell::sync::Lazy;
use tracing::debug;

use crate::dom::{NodeId, Page, Selector};

fn selector(source: &str) -> Selector {
    Selector::parse(source).expect("built-in selector")
}

static ISSUE_FORMS: Lazy<Vec<Selector>> =
    Lazy::new(|| ["#issue-form", "form#issue-form", "form.edit_issue"].into_iter().map(selector).collect());
static JST_BLOCK: Lazy<Selector> = Lazy::new(|| selector(".jstBlock"));
static TAB_PREVIEW: Lazy<Selector> = Lazy::new(|| selector(".tab-preview"));
static TAB_EDIT: Lazy<Selector> = Lazy::new(|| selector(".tab-edit"));
static WIKI_PREVIEW: Lazy<Selector> = Lazy::new(|| selector(".wiki-preview"));
static SELECTED: Lazy<Selector> = Lazy::new(|| selector(".selected"));
static LINK: Lazy<Selector> = Lazy::new(|| selector("a"));

pub fn issue_form(page: &dyn Page) -> Option<NodeId> {
    ISSUE_FORMS.iter().find_map(|sel| page.select(None, sel))
}

/// Validating submission when the host supports it, plain submit otherwise.
fn submit(page: &mut dyn Page, form: NodeId) {
    if !page.request_submit(form) {
        debug!("falling back to unvalidated submit");
        page.submit(form);
    }
}

/// Submit the issue form found by the usual selector fallbacks.
pub fn submit_issue_form(page: &mut dyn Page) -> bool {
    let Some(form) = issue_form(page) else {
        return false;
    };
    submit(page, form);
    true
}

/// Submit `#issue-form` only.
pub fn submit_issue_form_by_id(page: &mut dyn Page) -> bool {
    let Some(form) = page.element_by_id("issue-form") else {
        return false;
    };
    submit(page, form);
    true
}

/// Switch the active text editor between its Edit and Preview tabs.
///
/// The description editor wins when the notes are empty and more than one
/// preview tab is on screen; otherwise the notes editor is used. Returns
/// whether a tab was clicked.
pub fn toggle_preview(page: &mut dyn Page) -> bool {
    let notes = page.element_by_id("issue_notes");
    let description = page.element_by_id("issue_description");

    let visible = |page: &dyn Page, sel: &Selector, scope: Option<NodeId>| -> Vec<NodeId> {
        page.select_all(scope, sel)
            .into_iter()
            .filter(|&node| page.is_visible(node))
            .collect()
    };

    let notes_empty = notes.is_some_and(|n| page.value(n).trim().is_empty());
    let prefer_description =
        notes_empty && description.is_some() && visible(&*page, &TAB_PREVIEW, None).len() > 1;
    let editor = if prefer_description { description } else { notes };
    let scope = editor.and_then(|e| page.closest(e, &JST_BLOCK));

    let preview_tab = visible(&*page, &TAB_PREVIEW, scope).last().copied();
    let edit_tab = visible(&*page, &TAB_EDIT, scope).last().copied();
    let panel = page.select_all(scope, &WIKI_PREVIEW).last().copied();

    let preview_mode = match panel {
        Some(panel) => page.is_visible(panel) || !page.has_class(panel, "hidden"),
        None => preview_tab.is_some_and(|tab| page.closest(tab, &SELECTED).is_some()),
    };
    let Some(tab) = (if preview_mode { edit_tab } else { preview_tab }) else {
        return false;
    };

    debug!(preview_mode, "toggling editor tab");
    let target = if page.tag(tab) == "a" {
        tab
    } else {
        page.select(Some(tab), &LINK).unwrap_or(tab)
    };
    page.click(target);
    true
}
