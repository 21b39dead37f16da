use once_cell::sync::Lazy;
use tracing::debug;

use crate::dom::{NodeId, Page, Selector};

use super::watch::Watch;

const JUMP_ID: &str = "project-jump";
const EXPANDED: &str = "expanded";

fn selector(source: &str) -> Selector {
    Selector::parse(source).expect("built-in selector")
}

static QUICK_SEARCH: Lazy<Selector> = Lazy::new(|| selector("#projects-quick-search"));
static CONTENT: Lazy<Selector> = Lazy::new(|| selector(".drdn-content"));
static PROJECT_LINKS: Lazy<Selector> = Lazy::new(|| selector(".drdn-items.projects a"));

/// Flip the project-jump dropdown open or closed. `None` when the page has
/// no such dropdown, otherwise whether it is now open.
pub fn toggle(page: &mut dyn Page) -> Option<bool> {
    let jump = page.element_by_id(JUMP_ID)?;
    let open = page.toggle_class(jump, EXPANDED);
    debug!(open, "project jump toggled");
    Some(open)
}

/// Follows the single project left visible while the user filters the
/// dropdown's quick search.
#[derive(Debug, Clone)]
pub struct ProjectJump {
    input: NodeId,
    content: NodeId,
    watch: Watch,
}

impl ProjectJump {
    /// Focus the quick search of an open dropdown and start watching its
    /// content.
    pub fn arm(page: &mut dyn Page) -> Option<Self> {
        let jump = page.element_by_id(JUMP_ID)?;
        if !page.has_class(jump, EXPANDED) {
            return None;
        }
        let input = page.select(Some(jump), &QUICK_SEARCH)?;
        let content = page.select(Some(jump), &CONTENT)?;

        page.focus(input);
        page.select_text(input);
        Some(Self {
            input,
            content,
            watch: Watch::subtree(content),
        })
    }

    pub fn wants_input(&self, target: NodeId) -> bool {
        self.watch.is_connected() && target == self.input
    }

    pub fn observes(&self, page: &dyn Page, targets: &[NodeId]) -> bool {
        self.watch.observes(page, targets)
    }

    /// Click the only visible project link, if exactly one is left.
    /// Returns true once the watch is over.
    pub fn try_select(&mut self, page: &mut dyn Page) -> bool {
        if !self.watch.is_connected() {
            return true;
        }
        let links: Vec<NodeId> = page
            .select_all(Some(self.content), &PROJECT_LINKS)
            .into_iter()
            .filter(|&link| page.is_visible(link))
            .collect();
        if let [only] = links.as_slice() {
            self.watch.disconnect();
            debug!(href = ?page.attr(*only, "href"), "following only matching project");
            page.click(*only);
        }
        !self.watch.is_connected()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{HostEffect, MemoryPage};
    use crate::shortcuts::test_pages::ISSUE_DETAIL;

    fn page() -> MemoryPage {
        MemoryPage::from_outline("/issues/7", "en", "project-demo", ISSUE_DETAIL).unwrap()
    }

    #[test]
    fn arm_requires_open_dropdown() {
        let mut page = page();
        assert!(ProjectJump::arm(&mut page).is_none());
        assert_eq!(toggle(&mut page), Some(true));

        let jump = ProjectJump::arm(&mut page).unwrap();
        let input = page.element_by_id("projects-quick-search").unwrap();
        assert_eq!(page.active_element(), Some(input));
        assert!(jump.wants_input(input));

        assert_eq!(toggle(&mut page), Some(false));
        assert_eq!(toggle(&mut MemoryPage::new("/", "en", "")), None);
    }

    #[test]
    fn follows_single_remaining_project() {
        let mut page = page();
        toggle(&mut page);
        let mut jump = ProjectJump::arm(&mut page).unwrap();
        assert!(!jump.try_select(&mut page));

        page.type_char('g');
        let mutations = page.take_mutations();
        assert!(jump.observes(&page, &mutations));
        assert!(jump.try_select(&mut page));
        assert_eq!(
            page.take_effects(),
            vec![HostEffect::Navigate("/projects/gamma".to_string())]
        );

        // Disconnected watches stay quiet
        assert!(!jump.observes(&page, &mutations));
        assert!(jump.try_select(&mut page));
        assert!(page.take_effects().is_empty());
    }
}
