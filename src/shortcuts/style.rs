/// Class marking the keyboard-selected issue row or search entry.
pub const SELECTED_CLASS: &str = "kbd-selected";

/// Injected once per page so selected rows are visible in the host theme.
pub const STYLESHEET: &str = r#"
tr.issue.kbd-selected {
  background: transparent;
}
tr.issue.kbd-selected > td:first-child {
  box-shadow: inset 4px 0 0 #1DC9A0;
}
#search-results dt.kbd-selected {
  border-radius: 6px;
  background-color: rgba(29, 201, 160, 0.69) !important;
}
#search-results dt.kbd-selected,
#search-results dt.kbd-selected * {
  color: #fff !important;
  vertical-align: middle;
}
#search-results dt { position: relative; }
"#;
