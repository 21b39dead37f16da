use crate::dom::MemoryPage;

/// An issue list with `rows` linked issues, numbered from 1, and a trailing
/// group row without a link.
pub fn issue_list(rows: usize) -> MemoryPage {
    let mut outline = String::from(
        "div#content\n  table.list.issues\n    thead\n      tr\n        th | #\n    tbody\n",
    );
    for n in 1..=rows {
        outline.push_str(&format!(
            "      tr.issue\n        td.checkbox\n          input[type=\"checkbox\"]\n        td.subject\n          a[href=\"/issues/{n}\"] | Issue {n}\n"
        ));
    }
    outline.push_str("      tr.group\n        td | Group without link\n");
    MemoryPage::from_outline("/projects/demo/issues", "en", "project-demo", &outline)
        .expect("issue list outline")
}

pub const SEARCH_RESULTS: &str = r#"
dl#search-results
  dt.issue
    a[href="/issues/5"] | Bug #5
  dd | first
  dt.wiki-page
    a[href="/projects/demo/wiki/Start"] | Start
  dd | second
"#;

pub const ISSUE_DETAIL: &str = r##"
div#top-menu
  input#q[type="text"][accesskey="f"][value="previous search"]
  div#project-jump.drdn
    span.drdn-trigger | Jump to a project
    div.drdn-content
      div.quick-search
        input#projects-quick-search[type="text"]
      div.drdn-items.projects
        a[href="/projects/alpha"] | Alpha
        a[href="/projects/beta"] | Beta
        a[href="/projects/gamma"] | Gamma
div#content
  div.contextual
    a.icon.icon-edit[href="/issues/7/edit"][onclick="showAndScrollTo('update')"][data-reveal="update"] | Edit
    a.icon.icon-copy[href="/projects/demo/issues/7/copy"] | Copy
  div.issue
    div.description
      div.contextual
        a.icon-edit[href="#"][data-reveal="issue_description_and_toolbar"] | Edit description
  div#update[hidden]
    form#issue-form
      div#issue_description_and_toolbar[hidden]
        div.jstBlock
          textarea#issue_description[value="Steps to reproduce"]
          ul.tabs
            li.tab-edit.selected
              a[href="#"][data-conceal="description-preview"] | Edit
            li.tab-preview
              a[href="#"][data-reveal="description-preview"] | Preview
          div#description-preview.wiki-preview.hidden
      select#issue_assigned_to_id[value="4"]
      div.jstBlock
        textarea#issue_notes
        ul.tabs
          li.tab-edit.selected
            a[href="#"][data-conceal="notes-preview"] | Edit
          li.tab-preview
            a[href="#"][data-reveal="notes-preview"] | Preview
        div#notes-preview.wiki-preview.hidden
"##;

mod tests {
    use super::*;
    use crate::dom::{Page, Selector};

    #[test]
    fn issue_detail_keeps_hash_links_and_its_tail() {
        let page = MemoryPage::from_outline("/issues/7", "en", "", ISSUE_DETAIL).unwrap();
        for id in ["q", "issue_description", "issue_notes", "notes-preview"] {
            assert!(page.element_by_id(id).is_some(), "missing #{id}");
        }
        let toggle = Selector::parse(".description .contextual a.icon-edit").unwrap();
        let link = page.select(None, &toggle).unwrap();
        assert_eq!(page.attr(link, "href"), Some("#"));
    }
}
