use tracing::debug;

use crate::dom::{Element, Page};

use super::editor::edit_affordance;
use super::locale::Locale;

pub const REPLY_BUTTON_ID: &str = "vc-reply-button";
const ASSIGNEE_FIELD: &str = "issue_assigned_to_id";

/// A reply action the page may register with the dispatcher for `r`.
pub trait ReplyHook {
    fn reply(&mut self, page: &mut dyn Page);

    /// Called after the shortcut layer clicked the issue's Edit link.
    fn edit_clicked(&mut self, _page: &mut dyn Page) {}
}

/// Reply by handing the issue back: assign it to whoever updated it last
/// (or its author), then open the notes editor.
#[derive(Debug, Clone, Default)]
pub struct AssignBackReply {
    assignee_before: Option<String>,
}

impl ReplyHook for AssignBackReply {
    fn reply(&mut self, page: &mut dyn Page) {
        let people = page.issue_people();
        if let Some(reply_to) = people.last_updated_by.or(people.author) {
            if let Some(field) = page.element_by_id(ASSIGNEE_FIELD) {
                debug!(reply_to, "assigning issue back");
                page.set_value(field, &reply_to.to_string());
            }
        }

        if let Some(update) = page.element_by_id("update") {
            page.set_visible(update, true);
            page.scroll_into_view(update);
        }
        if let Some(notes) = page.element_by_id("issue_notes") {
            page.focus(notes);
        }
    }

    fn edit_clicked(&mut self, page: &mut dyn Page) {
        let (Some(before), Some(field)) = (&self.assignee_before, page.element_by_id(ASSIGNEE_FIELD)) else {
            return;
        };
        page.set_value(field, before);
    }
}

/// Put a Reply button next to the issue's Edit link and return the hook
/// backing it. Pages without an Edit link get neither.
pub fn install(page: &mut dyn Page, locale: Locale) -> Option<AssignBackReply> {
    let edit = edit_affordance(page)?;
    let assignee_before = page
        .element_by_id(ASSIGNEE_FIELD)
        .map(|field| page.value(field).to_string());

    let mut button = Element::new("a")
        .id(REPLY_BUTTON_ID)
        .class("icon icon-issue-note btn btn-sm btn-outline-dark")
        .text(locale.labels().reply_button);
    if let Some(href) = page.attr(edit, "href") {
        button = button.attr("href", href);
    }
    page.insert_after(edit, button);

    Some(AssignBackReply { assignee_before })
}
