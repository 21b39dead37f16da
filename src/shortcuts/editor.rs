use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::dom::{NodeId, Page, Selector};

use super::watch::Watch;

pub const DEFAULT_EDITOR_DEADLINE: Duration = Duration::from_millis(1500);

/// The issue page's main "Edit" link.
pub static EDIT_AFFORDANCE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("#content > .contextual a.icon-edit").expect("built-in selector"));

/// Ways the host exposes the description editor toggle, most specific first.
static DESCRIPTION_TOGGLES: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "#fast-desc-link",
        r#"a.icon-edit[onclick*="issue_description_and_toolbar"]"#,
        ".issue .description .contextual a.icon-edit",
    ]
    .into_iter()
    .map(|source| Selector::parse(source).expect("built-in selector"))
    .collect()
});

pub fn edit_affordance(page: &dyn Page) -> Option<NodeId> {
    page.select(None, &EDIT_AFFORDANCE)
}

pub fn click_description_toggle(page: &mut dyn Page) -> bool {
    let Some(toggle) = DESCRIPTION_TOGGLES
        .iter()
        .find_map(|selector| page.select(None, selector))
    else {
        return false;
    };
    page.click(toggle);
    true
}

/// Waits for the description editor toggle to show up after the edit form
/// was opened, clicking it as soon as it does. Gives up silently at the
/// deadline.
#[derive(Debug, Clone)]
pub struct DescriptionToggle {
    watch: Watch,
}

impl DescriptionToggle {
    /// Click the toggle right away if it is already there; otherwise start
    /// watching the document for it.
    pub fn start(page: &mut dyn Page, now: Instant, deadline: Duration) -> Option<Self> {
        if click_description_toggle(page) {
            return None;
        }
        debug!(?deadline, "waiting for description toggle");
        Some(Self {
            watch: Watch::document(now + deadline),
        })
    }

    /// Retry after DOM mutations. Returns true once the sequence is over.
    /// Mutations landing after the deadline never click.
    pub fn on_mutations(&mut self, page: &mut dyn Page, targets: &[NodeId], now: Instant) -> bool {
        if self.on_tick(now) {
            return true;
        }
        if !self.watch.observes(page, targets) {
            return !self.watch.is_connected();
        }
        if click_description_toggle(page) {
            self.watch.disconnect();
        }
        !self.watch.is_connected()
    }

    /// Returns true once the deadline has passed.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.watch.expired(now) {
            debug!("description toggle did not appear in time");
            self.watch.disconnect();
        }
        !self.watch.is_connected()
    }
}
