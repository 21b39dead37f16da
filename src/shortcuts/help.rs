use crate::dom::{Element, NodeId, Page};

use super::locale::{Labels, Locale};

pub const OVERLAY_ID: &str = "shortcut-overlay";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Home,
    MyPage,
    NewIssue,
    Search,
    ProjectJump,
    IssueList,
    Activity,
    Wiki,
    ScrollTop,
    ScrollBottom,
    Reply,
    Edit,
    Copy,
    Preview,
    Submit,
    Navigation,
    Toggle,
    Open,
    NewTab,
    Escape,
    Help,
}

impl Label {
    fn text(self, labels: &Labels) -> &'static str {
        match self {
            Label::Home => labels.home,
            Label::MyPage => labels.my_page,
            Label::NewIssue => labels.new_issue,
            Label::Search => labels.search,
            Label::ProjectJump => labels.project_jump,
            Label::IssueList => labels.issue_list,
            Label::Activity => labels.activity,
            Label::Wiki => labels.wiki,
            Label::ScrollTop => labels.scroll_top,
            Label::ScrollBottom => labels.scroll_bottom,
            Label::Reply => labels.reply,
            Label::Edit => labels.edit,
            Label::Copy => labels.copy,
            Label::Preview => labels.preview,
            Label::Submit => labels.submit,
            Label::Navigation => labels.navigation,
            Label::Toggle => labels.toggle,
            Label::Open => labels.open,
            Label::NewTab => labels.new_tab,
            Label::Escape => labels.escape,
            Label::Help => labels.help,
        }
    }
}

enum Row {
    Entry(&'static str, Label),
    Separator,
}

const ROWS: &[Row] = &[
    Row::Entry("h", Label::Home),
    Row::Entry("m", Label::MyPage),
    Row::Entry("n", Label::NewIssue),
    Row::Entry("/", Label::Search),
    Row::Entry("p", Label::ProjectJump),
    Row::Entry("i", Label::IssueList),
    Row::Entry("a", Label::Activity),
    Row::Entry("w", Label::Wiki),
    Row::Entry("gg", Label::ScrollTop),
    Row::Entry("G", Label::ScrollBottom),
    Row::Separator,
    Row::Entry("r", Label::Reply),
    Row::Entry("e", Label::Edit),
    Row::Entry("c", Label::Copy),
    Row::Entry("Shift + Enter", Label::Preview),
    Row::Entry("⌘ / Option + Enter", Label::Submit),
    Row::Entry("ZZ", Label::Submit),
    Row::Separator,
    Row::Entry("j / k", Label::Navigation),
    Row::Entry("x / Space", Label::Toggle),
    Row::Entry("Enter", Label::Open),
    Row::Entry("t", Label::NewTab),
    Row::Entry("Esc", Label::Escape),
    Row::Separator,
    Row::Entry("?", Label::Help),
];

/// The shortcut list as an element tree, hidden until opened.
pub fn build(locale: Locale) -> Element {
    let labels = locale.labels();

    let header = Element::new("tr")
        .child(Element::new("th").text(labels.key))
        .child(Element::new("th").text(labels.action));

    let table = ROWS.iter().fold(Element::new("table").child(header), |table, row| {
        let tr = match row {
            Row::Entry(keys, label) => Element::new("tr")
                .child(Element::new("td").child(Element::new("b").text(keys)))
                .child(Element::new("td").text(label.text(labels))),
            Row::Separator => Element::new("tr")
                .class("separator")
                .child(Element::new("td").attr("colspan", "2").child(Element::new("hr"))),
        };
        table.child(tr)
    });

    Element::new("div")
        .id(OVERLAY_ID)
        .hidden()
        .child(
            Element::new("div")
                .class("modal")
                .child(Element::new("h2").text(labels.title))
                .child(table),
        )
}

/// Open/closed state of the help overlay. The overlay element is built on
/// first open and reused afterwards.
#[derive(Debug, Default)]
pub struct HelpOverlay {
    node: Option<NodeId>,
    open: bool,
}

impl HelpOverlay {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self, page: &mut dyn Page, locale: Locale) {
        let node = match self.node {
            Some(node) => node,
            None => {
                let node = page.append_to_body(build(locale));
                self.node = Some(node);
                node
            }
        };
        page.set_visible(node, true);
        self.open = true;
    }

    pub fn close(&mut self, page: &mut dyn Page) {
        let Some(node) = self.node else {
            return;
        };
        page.set_visible(node, false);
        self.open = false;
    }

    pub fn toggle(&mut self, page: &mut dyn Page, locale: Locale) {
        if self.open {
            self.close(page);
        } else {
            self.open(page, locale);
        }
    }
}
