mod fixture;
mod memory;
mod selector;

use std::collections::BTreeMap;

pub use fixture::Site;
pub use memory::{HostEffect, MemoryPage};
pub use selector::Selector;

/// Handle to an element of a [`Page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    Top,
    Bottom,
}

/// Who the host page says is involved with the displayed issue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssuePeople {
    pub author: Option<u64>,
    pub last_updated_by: Option<u64>,
}

/// Description of an element to create in a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub value: String,
    pub checked: bool,
    pub hidden: bool,
    /// Not yet in the document; a host script inserts it later.
    pub deferred: bool,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }
}

/// The host page contract: the document the shortcut layer reads and the
/// few commands it issues against it.
///
/// Implementors provide structural primitives; queries such as
/// [`Page::select_all`] are built on top of them.
pub trait Page {
    fn root(&self) -> NodeId;
    fn body(&self) -> NodeId;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    /// Children currently attached to the document, in document order.
    fn children(&self, node: NodeId) -> &[NodeId];
    fn tag(&self, node: NodeId) -> &str;
    fn attr(&self, node: NodeId, name: &str) -> Option<&str>;
    fn text(&self, node: NodeId) -> &str;
    fn set_class(&mut self, node: NodeId, class: &str, on: bool);
    fn is_checked(&self, node: NodeId) -> bool;
    /// Rendered, i.e. neither the element nor an ancestor is hidden.
    fn is_visible(&self, node: NodeId) -> bool;
    fn set_visible(&mut self, node: NodeId, visible: bool);
    fn value(&self, node: NodeId) -> &str;
    fn set_value(&mut self, node: NodeId, value: &str);
    fn active_element(&self) -> Option<NodeId>;

    /// Navigator language tag reported by the host, e.g. `ja-JP`.
    fn language(&self) -> &str;
    fn issue_people(&self) -> IssuePeople;

    /// Dispatch a synthetic click, running whatever the host attached to it.
    fn click(&mut self, node: NodeId);
    fn focus(&mut self, node: NodeId);
    fn blur(&mut self, node: NodeId);
    fn select_text(&mut self, node: NodeId);
    fn scroll_into_view(&mut self, node: NodeId);
    fn scroll_to(&mut self, target: ScrollTarget);
    fn navigate(&mut self, url: &str);
    fn open_tab(&mut self, url: &str);
    /// Validating submission; false when the host has no such path.
    fn request_submit(&mut self, form: NodeId) -> bool;
    fn submit(&mut self, form: NodeId);
    fn insert_after(&mut self, anchor: NodeId, element: Element) -> NodeId;
    fn append_to_body(&mut self, element: Element) -> NodeId;
    fn inject_stylesheet(&mut self, css: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn toggle_class(&mut self, node: NodeId, class: &str) -> bool {
        let on = !self.has_class(node, class);
        self.set_class(node, class, on);
        on
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    /// Descendants of `scope` (the whole document when `None`) matching
    /// `selector`, in document order.
    fn select_all(&self, scope: Option<NodeId>, selector: &Selector) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = self
            .children(scope.unwrap_or_else(|| self.root()))
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(node) = stack.pop() {
            if selector.matches(self, node) {
                found.push(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        found
    }

    fn select(&self, scope: Option<NodeId>, selector: &Selector) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self
            .children(scope.unwrap_or_else(|| self.root()))
            .iter()
            .rev()
            .copied()
            .collect();
        while let Some(node) = stack.pop() {
            if selector.matches(self, node) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if selector.matches(self, candidate) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            if self.attr(node, "id") == Some(id) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    fn body_class(&self) -> &str {
        self.attr(self.body(), "class").unwrap_or_default()
    }

    /// Whether keystrokes aimed at `node` are text entry.
    fn is_text_entry(&self, node: NodeId) -> bool {
        matches!(self.tag(node), "input" | "textarea" | "select")
            || self.attr(node, "contenteditable") == Some("true")
    }
}
