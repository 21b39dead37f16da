use std::collections::BTreeMap;

use tracing::trace;

use crate::error::Result;

use super::fixture::parse_outline;
use super::{Element, IssuePeople, NodeId, Page, ScrollTarget};

/// Something the page asked its host to do that the terminal front end
/// carries out or reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEffect {
    Navigate(String),
    OpenTab(String),
    Submitted { form: String, validated: bool },
    Scrolled(ScrollTarget),
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    text: String,
    value: String,
    checked: bool,
    hidden: bool,
    attached: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
enum HostScript {
    Reveal(String),
}

/// An in-memory document standing in for a server-rendered page, with the
/// handful of host behaviors the shortcut layer relies on.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    location: String,
    language: String,
    people: IssuePeople,
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
    text_selected: Option<NodeId>,
    scroll_anchor: Option<NodeId>,
    stylesheets: Vec<String>,
    clicks: Vec<NodeId>,
    effects: Vec<HostEffect>,
    mutations: Vec<NodeId>,
    inputs: Vec<NodeId>,
    /// Detached nodes with the slot they will occupy in their parent.
    deferred: Vec<(NodeId, usize)>,
    scheduled: Vec<(u32, HostScript)>,
}

impl MemoryPage {
    pub fn new(location: &str, language: &str, body_class: &str) -> Self {
        let mut page = Self {
            location: location.to_string(),
            language: language.to_string(),
            people: IssuePeople::default(),
            nodes: Vec::new(),
            root: NodeId(0),
            body: NodeId(0),
            focused: None,
            text_selected: None,
            scroll_anchor: None,
            stylesheets: Vec::new(),
            clicks: Vec::new(),
            effects: Vec::new(),
            mutations: Vec::new(),
            inputs: Vec::new(),
            deferred: Vec::new(),
            scheduled: Vec::new(),
        };
        page.root = page.push_node(Element::new("html"), None, true);
        let body = Element::new("body").class(body_class);
        page.body = page.push_node(body, Some(page.root), true);
        page
    }

    /// Build a page whose body holds the elements described by `outline`.
    pub fn from_outline(
        location: &str,
        language: &str,
        body_class: &str,
        outline: &str,
    ) -> Result<Self> {
        let mut page = Self::new(location, language, body_class);
        for element in parse_outline(outline)? {
            page.build(element, page.body);
        }
        page.mutations.clear();
        Ok(page)
    }

    pub fn with_people(mut self, people: IssuePeople) -> Self {
        self.people = people;
        self
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    #[allow(dead_code)]
    pub fn stylesheets(&self) -> &[String] {
        &self.stylesheets
    }

    pub fn scroll_anchor(&self) -> Option<NodeId> {
        self.scroll_anchor
    }

    #[allow(dead_code)]
    pub fn clicks(&self) -> &[NodeId] {
        &self.clicks
    }

    pub fn take_effects(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Targets of DOM mutations since the last call.
    pub fn take_mutations(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.mutations)
    }

    /// Elements that fired `input` events since the last call.
    pub fn take_inputs(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.inputs)
    }

    /// Advance host scripts by one tick, running the ones that are due.
    pub fn tick(&mut self) {
        let mut due = Vec::new();
        self.scheduled.retain_mut(|(ticks, script)| {
            if *ticks <= 1 {
                due.push(script.clone());
                false
            } else {
                *ticks -= 1;
                true
            }
        });
        for script in due {
            self.run_script(script);
        }
    }

    /// Type a character into the focused text entry. Returns false when
    /// nothing editable has focus.
    pub fn type_char(&mut self, ch: char) -> bool {
        self.edit_focused(|value, replace| {
            if replace {
                value.clear();
            }
            value.push(ch);
        })
    }

    pub fn backspace(&mut self) -> bool {
        self.edit_focused(|value, replace| {
            if replace {
                value.clear();
            } else {
                value.pop();
            }
        })
    }

    /// Short `tag#id.class` label for an element.
    pub fn describe(&self, node: NodeId) -> String {
        let n = &self.nodes[node.0];
        let mut out = n.tag.clone();
        if let Some(id) = n.attrs.get("id") {
            out.push('#');
            out.push_str(id);
        }
        if let Some(class) = n.attrs.get("class") {
            for c in class.split_whitespace() {
                out.push('.');
                out.push_str(c);
            }
        }
        out
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String, bool)) -> bool {
        let Some(target) = self.focused else {
            return false;
        };
        if !self.is_text_entry(target) {
            return false;
        }
        let replace = self.text_selected.take() == Some(target);
        edit(&mut self.nodes[target.0].value, replace);
        self.inputs.push(target);
        if self.attr(target, "id") == Some("projects-quick-search") {
            self.filter_projects(target);
        }
        true
    }

    /// The project-jump quick search hides links that do not contain the
    /// typed text.
    fn filter_projects(&mut self, input: NodeId) {
        let query = self.nodes[input.0].value.to_lowercase();
        let Some(jump) = self.element_by_id("project-jump") else {
            return;
        };
        let links: Vec<NodeId> = self
            .descendants(jump)
            .into_iter()
            .filter(|&n| self.nodes[n.0].tag == "a")
            .filter(|&n| {
                self.parent(n).is_some_and(|p| {
                    self.closest_class(p, "projects")
                        .is_some_and(|items| self.has_class(items, "drdn-items"))
                })
            })
            .collect();
        for link in links {
            let show = self.nodes[link.0].text.to_lowercase().contains(&query);
            if self.nodes[link.0].hidden == show {
                self.nodes[link.0].hidden = !show;
                self.mutations.push(link);
            }
        }
    }

    fn closest_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.has_class(candidate, class) {
                return Some(candidate);
            }
            current = self.nodes[candidate.0].parent;
        }
        None
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    fn push_node(&mut self, element: Element, parent: Option<NodeId>, attached: bool) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            tag: element.tag.to_ascii_lowercase(),
            attrs: element.attrs,
            text: element.text,
            value: element.value,
            checked: element.checked,
            hidden: element.hidden,
            attached,
            parent,
            children: Vec::new(),
        });
        if let (Some(parent), true) = (parent, attached) {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    fn build(&mut self, mut element: Element, parent: NodeId) -> NodeId {
        let children = std::mem::take(&mut element.children);
        let deferred = element.deferred;
        let id = self.push_node(element, Some(parent), !deferred);
        if deferred {
            let slot = self.nodes[parent.0].children.len();
            self.deferred.push((id, slot));
        }
        for child in children {
            self.build(child, id);
        }
        if !deferred {
            self.mutations.push(parent);
        }
        id
    }

    fn run_script(&mut self, script: HostScript) {
        match script {
            HostScript::Reveal(id) => self.reveal(&id),
        }
    }

    fn reveal(&mut self, id: &str) {
        let pending = self
            .deferred
            .iter()
            .position(|&(node, _)| self.nodes[node.0].attrs.get("id").map(String::as_str) == Some(id));
        if let Some(index) = pending {
            let (node, slot) = self.deferred.remove(index);
            let Some(parent) = self.nodes[node.0].parent else {
                return;
            };
            let siblings = &mut self.nodes[parent.0].children;
            siblings.insert(slot.min(siblings.len()), node);
            self.nodes[node.0].attached = true;
            trace!(id, "host inserted element");
            self.mutations.push(parent);
        } else if let Some(node) = self.element_by_id(id) {
            self.set_visible(node, true);
        }
    }

    fn attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if !self.nodes[n.0].attached {
                return false;
            }
            current = self.nodes[n.0].parent;
        }
        true
    }
}

impl Page for MemoryPage {
    fn root(&self) -> NodeId {
        self.root
    }

    fn body(&self) -> NodeId {
        self.body
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attrs.get(name).map(String::as_str)
    }

    fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        let attrs = &mut self.nodes[node.0].attrs;
        let mut classes: Vec<String> = attrs
            .get("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);
        match (on, present) {
            (true, false) => classes.push(class.to_string()),
            (false, true) => classes.retain(|c| c != class),
            _ => return,
        }
        attrs.insert("class".to_string(), classes.join(" "));
    }

    fn is_checked(&self, node: NodeId) -> bool {
        self.nodes[node.0].checked
    }

    fn is_visible(&self, node: NodeId) -> bool {
        if !self.attached(node) {
            return false;
        }
        let mut current = Some(node);
        while let Some(n) = current {
            if self.nodes[n.0].hidden || self.has_class(n, "hidden") {
                return false;
            }
            // Dropdown content only renders while its menu is expanded
            if self.has_class(n, "drdn-content") {
                let expanded = self
                    .closest_class(n, "drdn")
                    .is_some_and(|menu| self.has_class(menu, "expanded"));
                if !expanded {
                    return false;
                }
            }
            current = self.nodes[n.0].parent;
        }
        true
    }

    /// Hiding also marks the element with the `hidden` class, which the
    /// host's own scripts test for.
    fn set_visible(&mut self, node: NodeId, visible: bool) {
        let changed = self.nodes[node.0].hidden == visible || self.has_class(node, "hidden") == visible;
        self.nodes[node.0].hidden = !visible;
        self.set_class(node, "hidden", !visible);
        if changed {
            self.mutations.push(node);
        }
    }

    fn value(&self, node: NodeId) -> &str {
        &self.nodes[node.0].value
    }

    fn set_value(&mut self, node: NodeId, value: &str) {
        self.nodes[node.0].value = value.to_string();
    }

    fn active_element(&self) -> Option<NodeId> {
        self.focused
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn issue_people(&self) -> IssuePeople {
        self.people
    }

    fn click(&mut self, node: NodeId) {
        self.clicks.push(node);

        if self.tag(node) == "input" && self.attr(node, "type") == Some("checkbox") {
            let checked = &mut self.nodes[node.0].checked;
            *checked = !*checked;
        }

        let mut scripted = self.attr(node, "onclick").is_some();
        if let Some(id) = self.attr(node, "data-reveal").map(str::to_string) {
            scripted = true;
            let delay = self
                .attr(node, "data-delay")
                .and_then(|d| d.parse::<u32>().ok())
                .unwrap_or(0);
            if delay == 0 {
                self.reveal(&id);
            } else {
                self.scheduled.push((delay, HostScript::Reveal(id)));
            }
        }
        if let Some(id) = self.attr(node, "data-conceal").map(str::to_string) {
            scripted = true;
            if let Some(target) = self.element_by_id(&id) {
                self.set_visible(target, false);
            }
        }

        if !scripted && self.tag(node) == "a" {
            if let Some(href) = self.attr(node, "href").map(str::to_string) {
                if !href.starts_with('#') {
                    self.navigate(&href);
                }
            }
        }
    }

    fn focus(&mut self, node: NodeId) {
        if self.focused != Some(node) {
            self.text_selected = None;
        }
        self.focused = Some(node);
    }

    fn blur(&mut self, node: NodeId) {
        if self.focused == Some(node) {
            self.focused = None;
            self.text_selected = None;
        }
    }

    fn select_text(&mut self, node: NodeId) {
        self.text_selected = Some(node);
    }

    fn scroll_into_view(&mut self, node: NodeId) {
        self.scroll_anchor = Some(node);
    }

    fn scroll_to(&mut self, target: ScrollTarget) {
        self.scroll_anchor = None;
        self.effects.push(HostEffect::Scrolled(target));
    }

    fn navigate(&mut self, url: &str) {
        self.effects.push(HostEffect::Navigate(url.to_string()));
    }

    fn open_tab(&mut self, url: &str) {
        self.effects.push(HostEffect::OpenTab(url.to_string()));
    }

    fn request_submit(&mut self, form: NodeId) -> bool {
        if self.attr(form, "data-legacy-submit").is_some() {
            return false;
        }
        self.effects.push(HostEffect::Submitted {
            form: self.describe(form),
            validated: true,
        });
        true
    }

    fn submit(&mut self, form: NodeId) {
        self.effects.push(HostEffect::Submitted {
            form: self.describe(form),
            validated: false,
        });
    }

    fn insert_after(&mut self, anchor: NodeId, element: Element) -> NodeId {
        let parent = self.parent(anchor).unwrap_or(self.body);
        let node = self.build(element, parent);
        let siblings = &mut self.nodes[parent.0].children;
        if let Some(pos) = siblings.iter().position(|&n| n == node) {
            siblings.remove(pos);
            let at = siblings
                .iter()
                .position(|&n| n == anchor)
                .map_or(siblings.len(), |i| i + 1);
            siblings.insert(at, node);
        }
        node
    }

    fn append_to_body(&mut self, element: Element) -> NodeId {
        self.build(element, self.body)
    }

    fn inject_stylesheet(&mut self, css: &str) {
        self.stylesheets.push(css.to_string());
    }
}
