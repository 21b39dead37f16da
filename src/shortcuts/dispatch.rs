use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::dom::{NodeId, Page, ScrollTarget, Selector};

use super::chord::{Chord, ChordBuffer, DEFAULT_CHORD_TIMEOUT};
use super::context::PageContext;
use super::editor::{edit_affordance, DescriptionToggle, DEFAULT_EDITOR_DEADLINE};
use super::forms;
use super::help::HelpOverlay;
use super::keys::{Key, KeyInput};
use super::locale::Locale;
use super::project_jump::{self, ProjectJump};
use super::reply::{self, ReplyHook};
use super::rows::ListKind;
use super::selection::Selection;
use super::style::STYLESHEET;

static COPY_AFFORDANCE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a.icon.icon-copy, a.icon-copy, a[href$="/copy"]"#).expect("built-in selector")
});
static SEARCH_INPUT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[accesskey="f"]"#).expect("built-in selector"));

/// Tunables for one page session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Overrides the language the page reports.
    pub locale: Option<Locale>,
    pub chord_timeout: Duration,
    pub editor_deadline: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            locale: None,
            chord_timeout: DEFAULT_CHORD_TIMEOUT,
            editor_deadline: DEFAULT_EDITOR_DEADLINE,
        }
    }
}

/// What handling a key press asked of the host's own event processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
}

impl KeyOutcome {
    fn handled() -> Self {
        Self {
            default_prevented: true,
            propagation_stopped: false,
        }
    }

    fn stopped() -> Self {
        Self {
            default_prevented: true,
            propagation_stopped: true,
        }
    }

    /// The shortcut layer took the key; the host should not act on it.
    pub fn consumed(&self) -> bool {
        self.default_prevented || self.propagation_stopped
    }
}

/// Work scheduled for the next turn of the event loop, after the host's
/// own handlers for the current event have run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    ArmProjectJump,
    SelectProject,
}

/// The keyboard session of one page: selection, chord buffer, help overlay
/// and the pending asynchronous sequences. Dropped on navigation.
pub struct Dispatcher {
    locale: Locale,
    settings: Settings,
    selection: Selection,
    chords: ChordBuffer,
    help: HelpOverlay,
    reply: Option<Box<dyn ReplyHook>>,
    description: Option<DescriptionToggle>,
    project_jump: Option<ProjectJump>,
    deferred: Vec<Task>,
}

impl Dispatcher {
    /// Attach to a freshly loaded page: inject the selection stylesheet and
    /// set up the reply button where the page offers an Edit link.
    pub fn install(page: &mut dyn Page, settings: Settings) -> Self {
        let locale = settings
            .locale
            .unwrap_or_else(|| Locale::from_tag(page.language()));
        page.inject_stylesheet(STYLESHEET);

        let mut dispatcher = Self {
            locale,
            settings,
            selection: Selection::default(),
            chords: ChordBuffer::new(settings.chord_timeout),
            help: HelpOverlay::default(),
            reply: None,
            description: None,
            project_jump: None,
            deferred: Vec::new(),
        };
        if let Some(hook) = reply::install(page, locale) {
            dispatcher.register_reply(Box::new(hook));
        }
        debug!(?locale, reply = dispatcher.reply.is_some(), "shortcuts installed");
        dispatcher
    }

    pub fn register_reply(&mut self, hook: Box<dyn ReplyHook>) {
        self.reply = Some(hook);
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    #[allow(dead_code)]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn chord_keys(&self) -> &str {
        self.chords.keys()
    }

    pub fn help_open(&self) -> bool {
        self.help.is_open()
    }

    pub fn open_help(&mut self, page: &mut dyn Page) {
        self.help.open(page, self.locale);
    }

    #[allow(dead_code)]
    pub fn close_help(&mut self, page: &mut dyn Page) {
        self.help.close(page);
    }

    pub fn toggle_help(&mut self, page: &mut dyn Page) {
        self.help.toggle(page, self.locale);
    }

    /// Whether deferred work or a watcher is still outstanding.
    pub fn is_busy(&self) -> bool {
        !self.deferred.is_empty() || self.description.is_some()
    }

    /// Handle a key-down event. The editor bindings run after the main
    /// shortcuts unless the key only closed the help overlay or a shortcut
    /// stopped propagation.
    pub fn handle_key(&mut self, page: &mut dyn Page, key: &KeyInput, now: Instant) -> KeyOutcome {
        self.chords.expire(now);

        let help_was_open = self.help.is_open();
        let outcome = self.dispatch(page, key, now);
        if (help_was_open && !self.help.is_open()) || outcome.propagation_stopped {
            return outcome;
        }

        match self.editor_binding(page, key) {
            Some(editor) => editor,
            None => outcome,
        }
    }

    fn dispatch(&mut self, page: &mut dyn Page, key: &KeyInput, now: Instant) -> KeyOutcome {
        if key.has_command_modifier() {
            return KeyOutcome::default();
        }

        if self.help.is_open() {
            if matches!(key.key, Key::Modifier(_)) {
                return KeyOutcome::default();
            }
            self.chords.clear();
            self.help.close(page);
            return KeyOutcome::handled();
        }

        if let Some(active) = page.active_element().filter(|&n| page.is_text_entry(n)) {
            if key.key == Key::Escape {
                self.chords.clear();
                page.blur(active);
                return KeyOutcome::handled();
            }
            return KeyOutcome::default();
        }

        if key.key != Key::Escape {
            self.selection.reset_escapes();
        }

        if key.is_help() {
            self.help.open(page, self.locale);
            return KeyOutcome::handled();
        }

        if key.is_char('c') || key.is_char('C') {
            self.chords.clear();
            if let Some(copy) = page.select(None, &COPY_AFFORDANCE) {
                debug!("copy issue");
                page.click(copy);
            }
            return KeyOutcome::handled();
        }

        if let Some(ch) = key.printable() {
            self.chords.push(ch, now);
        }
        if self.chords.matched() == Some(Chord::ScrollTop) {
            self.chords.clear();
            page.scroll_to(ScrollTarget::Top);
            return KeyOutcome::handled();
        }
        if key.is_char('G') {
            self.chords.clear();
            page.scroll_to(ScrollTarget::Bottom);
            return KeyOutcome::handled();
        }
        if self.chords.matched() == Some(Chord::Submit) {
            self.chords.clear();
            debug!("submit via ZZ");
            forms::submit_issue_form(page);
            return KeyOutcome::handled();
        }

        // A chord only survives keys that resolve to nothing
        let outcome = self.command(page, key, now);
        if outcome.consumed() {
            self.chords.clear();
        }
        outcome
    }

    fn command(&mut self, page: &mut dyn Page, key: &KeyInput, now: Instant) -> KeyOutcome {
        if key.key == Key::Escape {
            let cleared = self.selection.escape(page);
            trace!(?cleared, "selection cleared");
            return KeyOutcome::handled();
        }

        let context = PageContext::detect(page);
        if context.search_only() {
            if let Some(outcome) = self.search_key(page, key) {
                return outcome;
            }
        }
        if context.issue_list {
            if let Some(outcome) = self.issue_key(page, key) {
                return outcome;
            }
        }

        let Some(ch) = key.printable() else {
            return KeyOutcome::default();
        };
        match ch {
            'r' | 'R' => match self.reply.as_mut() {
                Some(hook) => {
                    debug!("reply");
                    hook.reply(page);
                    KeyOutcome::handled()
                }
                None => KeyOutcome::default(),
            },
            'e' | 'E' => self.edit(page, now),
            '/' => {
                let Some(search) = page.select(None, &SEARCH_INPUT) else {
                    return KeyOutcome::default();
                };
                page.focus(search);
                page.select_text(search);
                KeyOutcome::handled()
            }
            'p' | 'P' => match project_jump::toggle(page) {
                None => KeyOutcome::default(),
                Some(true) => {
                    self.defer(Task::ArmProjectJump);
                    KeyOutcome::stopped()
                }
                Some(false) => {
                    self.project_jump = None;
                    KeyOutcome::stopped()
                }
            },
            _ => match navigation_target(ch, context.project.as_deref()) {
                Some(url) => {
                    debug!(%url, "navigate");
                    page.navigate(&url);
                    KeyOutcome::handled()
                }
                None => KeyOutcome::default(),
            },
        }
    }

    /// Keys of a search results page. `Enter` and `t` end resolution even
    /// without a selected result.
    fn search_key(&mut self, page: &mut dyn Page, key: &KeyInput) -> Option<KeyOutcome> {
        if let Some(delta) = row_step(key) {
            self.selection.step(page, ListKind::Search, delta);
            return Some(KeyOutcome::handled());
        }

        let new_tab = key.is_char('t');
        if key.key != Key::Enter && !new_tab {
            return None;
        }
        let Some(href) = self
            .selection
            .current_search_link(page)
            .and_then(|link| href(&*page, link))
        else {
            return Some(KeyOutcome::default());
        };
        if new_tab {
            page.open_tab(&href);
        } else {
            page.navigate(&href);
        }
        Some(KeyOutcome::handled())
    }

    fn issue_key(&mut self, page: &mut dyn Page, key: &KeyInput) -> Option<KeyOutcome> {
        if let Some(delta) = row_step(key) {
            self.selection.step(page, ListKind::Issue, delta);
            return Some(KeyOutcome::handled());
        }

        if key.key == Key::Enter {
            if let Some(target) = self.selection.open_target(page) {
                let url = target.url();
                debug!(%url, "open issue");
                page.navigate(&url);
            }
            return Some(KeyOutcome::handled());
        }

        if key.is_char('x') || key.is_char(' ') {
            self.selection.toggle_checkbox(page);
            return Some(KeyOutcome::handled());
        }

        if key.is_char('t') {
            let Some(href) = self
                .selection
                .current_issue_link(page)
                .and_then(|link| href(&*page, link))
            else {
                return Some(KeyOutcome::default());
            };
            page.open_tab(&href);
            return Some(KeyOutcome::handled());
        }

        None
    }

    fn edit(&mut self, page: &mut dyn Page, now: Instant) -> KeyOutcome {
        let Some(edit) = edit_affordance(page) else {
            return KeyOutcome::default();
        };
        page.click(edit);
        if let Some(hook) = self.reply.as_mut() {
            hook.edit_clicked(page);
        }
        self.description = DescriptionToggle::start(page, now, self.settings.editor_deadline);
        KeyOutcome::handled()
    }

    /// Command/Option+Enter submits the issue form and Shift+Enter flips
    /// the editor preview, both also while typing.
    fn editor_binding(&mut self, page: &mut dyn Page, key: &KeyInput) -> Option<KeyOutcome> {
        if key.key != Key::Enter {
            return None;
        }
        if key.meta || key.alt {
            debug!("submit via modifier+Enter");
            forms::submit_issue_form_by_id(page);
            return Some(KeyOutcome::stopped());
        }
        if key.shift {
            forms::toggle_preview(page);
            return Some(KeyOutcome::stopped());
        }
        None
    }

    /// Feed DOM mutation targets to the active watchers.
    pub fn on_mutations(&mut self, page: &mut dyn Page, targets: &[NodeId], now: Instant) {
        if let Some(pending) = self.description.as_mut() {
            if pending.on_mutations(page, targets, now) {
                self.description = None;
            }
        }
        if self
            .project_jump
            .as_ref()
            .is_some_and(|jump| jump.observes(page, targets))
        {
            self.defer(Task::SelectProject);
        }
    }

    /// An `input` event fired on `target`.
    pub fn on_input(&mut self, target: NodeId) {
        if self
            .project_jump
            .as_ref()
            .is_some_and(|jump| jump.wants_input(target))
        {
            self.defer(Task::SelectProject);
        }
    }

    /// Expire the chord buffer and watcher deadlines.
    pub fn on_tick(&mut self, now: Instant) {
        self.chords.expire(now);
        if let Some(pending) = self.description.as_mut() {
            if pending.on_tick(now) {
                self.description = None;
            }
        }
    }

    /// Run the work deferred to this turn. Returns whether anything ran.
    pub fn run_deferred(&mut self, page: &mut dyn Page) -> bool {
        let tasks = std::mem::take(&mut self.deferred);
        for task in &tasks {
            match task {
                Task::ArmProjectJump => {
                    self.project_jump = ProjectJump::arm(page);
                    if self.project_jump.is_some() {
                        self.defer(Task::SelectProject);
                    }
                }
                Task::SelectProject => {
                    if let Some(jump) = self.project_jump.as_mut() {
                        if jump.try_select(page) {
                            self.project_jump = None;
                        }
                    }
                }
            }
        }
        !tasks.is_empty()
    }

    fn defer(&mut self, task: Task) {
        if !self.deferred.contains(&task) {
            self.deferred.push(task);
        }
    }
}

fn row_step(key: &KeyInput) -> Option<isize> {
    match key.key {
        Key::Char('j') => Some(1),
        Key::Char('k') => Some(-1),
        _ => None,
    }
}

fn href(page: &dyn Page, link: NodeId) -> Option<String> {
    page.attr(link, "href").map(str::to_string)
}

/// Fixed destinations of the navigation keys. `n` and `w` only exist
/// inside a project; `i` and `a` fall back to their global pages.
fn navigation_target(key: char, project: Option<&str>) -> Option<String> {
    let url = match (key.to_ascii_lowercase(), project) {
        ('n', Some(p)) => format!("/projects/{p}/issues/new"),
        ('i', Some(p)) => format!("/projects/{p}/issues"),
        ('i', None) => "/issues".to_string(),
        ('w', Some(p)) => format!("/projects/{p}/wiki"),
        ('a', Some(p)) => format!("/projects/{p}/activity"),
        ('a', None) => "/activity".to_string(),
        ('h', _) => "/".to_string(),
        ('m', _) => "/my/page".to_string(),
        _ => return None,
    };
    Some(url)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::dom::{HostEffect, IssuePeople, MemoryPage};
    use crate::shortcuts::keys::ModifierKey;
    use crate::shortcuts::rows;
    use crate::shortcuts::style::SELECTED_CLASS;
    use crate::shortcuts::test_pages::{issue_list, ISSUE_DETAIL, SEARCH_RESULTS};

    struct Session {
        page: MemoryPage,
        dispatcher: Dispatcher,
        now: Instant,
    }

    impl Session {
        fn new(mut page: MemoryPage) -> Self {
            let dispatcher = Dispatcher::install(&mut page, Settings::default());
            Self {
                page,
                dispatcher,
                now: Instant::now(),
            }
        }

        fn detail() -> Self {
            let page = MemoryPage::from_outline("/issues/7", "en", "project-demo", ISSUE_DETAIL)
                .unwrap()
                .with_people(IssuePeople {
                    author: Some(3),
                    last_updated_by: Some(9),
                });
            Self::new(page)
        }

        fn search() -> Self {
            Self::new(MemoryPage::from_outline("/search", "en", "", SEARCH_RESULTS).unwrap())
        }

        fn wait(&mut self, ms: u64) {
            self.now += Duration::from_millis(ms);
            self.dispatcher.on_tick(self.now);
        }

        fn key(&mut self, input: KeyInput) -> KeyOutcome {
            let outcome = self.dispatcher.handle_key(&mut self.page, &input, self.now);
            self.settle();
            outcome
        }

        fn press(&mut self, ch: char) -> KeyOutcome {
            self.key(KeyInput::char(ch))
        }

        fn keys(&mut self, keys: &str) {
            for ch in keys.chars() {
                self.press(ch);
            }
        }

        fn type_text(&mut self, text: &str) {
            for ch in text.chars() {
                assert!(self.page.type_char(ch));
                self.settle();
            }
        }

        /// Deliver queued host events until the page is quiet.
        fn settle(&mut self) {
            for _ in 0..16 {
                let mutations = self.page.take_mutations();
                let inputs = self.page.take_inputs();
                if !mutations.is_empty() {
                    self.dispatcher.on_mutations(&mut self.page, &mutations, self.now);
                }
                for input in &inputs {
                    self.dispatcher.on_input(*input);
                }
                let ran = self.dispatcher.run_deferred(&mut self.page);
                if !ran && mutations.is_empty() && inputs.is_empty() {
                    break;
                }
            }
        }

        fn issue_index(&self) -> Option<usize> {
            self.dispatcher.selection().index(ListKind::Issue)
        }

        fn checked(&self) -> Vec<bool> {
            rows::rows(&self.page, ListKind::Issue)
                .into_iter()
                .map(|row| self.page.is_checked(rows::checkbox(&self.page, row).unwrap()))
                .collect()
        }
    }

    fn navigated(page: &mut MemoryPage) -> Vec<String> {
        page.take_effects()
            .into_iter()
            .filter_map(|effect| match effect {
                HostEffect::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn install_injects_stylesheet_and_picks_page_language() {
        let session = Session::new(MemoryPage::new("/", "ja-JP", ""));
        assert_eq!(session.page.stylesheets(), &[STYLESHEET.to_string()]);
        assert_eq!(session.dispatcher.locale(), Locale::Ja);

        let mut page = MemoryPage::new("/", "ja-JP", "");
        let settings = Settings {
            locale: Some(Locale::Fr),
            ..Settings::default()
        };
        assert_eq!(Dispatcher::install(&mut page, settings).locale(), Locale::Fr);
    }

    #[test]
    fn j_and_k_walk_the_issue_list() {
        let mut s = Session::new(issue_list(3));
        assert!(s.press('j').consumed());
        assert_eq!(s.issue_index(), Some(0));
        s.keys("jjj");
        assert_eq!(s.issue_index(), Some(2));
        s.press('k');
        assert_eq!(s.issue_index(), Some(1));

        let row = rows::rows(&s.page, ListKind::Issue)[1];
        assert!(s.page.has_class(row, SELECTED_CLASS));
        assert_eq!(s.page.scroll_anchor(), Some(row));
    }

    #[test]
    fn k_from_unselected_starts_at_last_row() {
        let mut s = Session::new(issue_list(4));
        s.press('k');
        assert_eq!(s.issue_index(), Some(3));
    }

    proptest! {
        #[test]
        fn row_index_stays_in_bounds(len in 0usize..6, presses in proptest::collection::vec(any::<bool>(), 0..24)) {
            let mut s = Session::new(issue_list(len));
            let mut expected: Option<usize> = None;
            for forward in presses {
                s.press(if forward { 'j' } else { 'k' });
                if len > 0 {
                    expected = Some(match (expected, forward) {
                        (None, true) => 0,
                        (None, false) => len - 1,
                        (Some(i), true) => (i + 1).min(len - 1),
                        (Some(i), false) => i.saturating_sub(1),
                    });
                }
                prop_assert_eq!(s.issue_index(), expected);
            }
        }
    }

    #[test]
    fn escape_once_keeps_checkboxes_twice_clears_them() {
        let mut s = Session::new(issue_list(3));
        s.keys("xjx");
        assert_eq!(s.checked(), vec![true, true, false]);

        assert!(s.key(KeyInput::new(Key::Escape)).consumed());
        assert_eq!(s.issue_index(), None);
        assert_eq!(s.checked(), vec![true, true, false]);

        s.key(KeyInput::new(Key::Escape));
        assert_eq!(s.checked(), vec![false, false, false]);
    }

    #[test]
    fn other_keys_reset_the_escape_counter() {
        let mut s = Session::new(issue_list(3));
        s.press('x');
        s.key(KeyInput::new(Key::Escape));
        s.press('j');
        s.key(KeyInput::new(Key::Escape));
        assert_eq!(s.checked(), vec![true, false, false]);
        assert_eq!(s.dispatcher.selection().escapes(), 1);
    }

    #[test]
    fn enter_with_two_checked_rows_opens_bulk_edit() {
        let mut s = Session::new(issue_list(4));
        s.keys("jxjjx");
        s.key(KeyInput::new(Key::Enter));
        assert_eq!(
            navigated(&mut s.page),
            vec!["/issues/bulk_edit?ids[]=1&ids[]=3".to_string()]
        );
    }

    #[test]
    fn enter_with_one_checked_row_ignores_keyboard_selection() {
        let mut s = Session::new(issue_list(4));
        s.keys("jjx");
        s.keys("jj");
        assert_eq!(s.issue_index(), Some(3));
        s.key(KeyInput::new(Key::Enter));
        assert_eq!(navigated(&mut s.page), vec!["/issues/2".to_string()]);
    }

    #[test]
    fn enter_without_selection_does_nothing() {
        let mut s = Session::new(issue_list(2));
        assert!(s.key(KeyInput::new(Key::Enter)).consumed());
        assert!(s.page.take_effects().is_empty());
    }

    #[test]
    fn t_opens_selected_issue_in_new_tab() {
        let mut s = Session::new(issue_list(2));
        assert!(!s.press('t').consumed());
        s.keys("kt");
        assert_eq!(
            s.page.take_effects(),
            vec![HostEffect::OpenTab("/issues/2".to_string())]
        );
    }

    #[test]
    fn chord_gg_scrolls_to_top_only_within_timeout() {
        let mut s = Session::new(issue_list(1));
        s.press('g');
        s.wait(500);
        s.press('g');
        assert!(s.page.take_effects().is_empty());

        s.wait(100);
        s.press('g');
        assert_eq!(
            s.page.take_effects(),
            vec![HostEffect::Scrolled(ScrollTarget::Top)]
        );
        assert_eq!(s.dispatcher.chord_keys(), "");
    }

    #[test]
    fn resolved_keys_break_a_pending_chord() {
        let mut s = Session::new(issue_list(2));
        s.press('g');
        s.wait(50);
        assert!(s.key(KeyInput::new(Key::Escape)).consumed());
        assert_eq!(s.dispatcher.chord_keys(), "");
        s.wait(50);
        s.press('g');
        assert!(!s
            .page
            .take_effects()
            .contains(&HostEffect::Scrolled(ScrollTarget::Top)));

        s.wait(500);
        s.keys("gjg");
        assert_eq!(s.issue_index(), Some(0));
        assert!(!s
            .page
            .take_effects()
            .contains(&HostEffect::Scrolled(ScrollTarget::Top)));
        assert_eq!(s.dispatcher.chord_keys(), "g");
    }

    #[test]
    fn buffer_expires_on_tick() {
        let mut s = Session::new(issue_list(1));
        s.press('g');
        assert_eq!(s.dispatcher.chord_keys(), "g");
        s.wait(400);
        assert_eq!(s.dispatcher.chord_keys(), "");
    }

    #[test]
    fn capital_g_scrolls_to_bottom() {
        let mut s = Session::new(issue_list(1));
        s.press('G');
        assert_eq!(
            s.page.take_effects(),
            vec![HostEffect::Scrolled(ScrollTarget::Bottom)]
        );
    }

    #[test]
    fn zz_submits_issue_form() {
        let mut s = Session::detail();
        s.keys("ZZ");
        assert_eq!(
            s.page.take_effects(),
            vec![HostEffect::Submitted {
                form: "form#issue-form".to_string(),
                validated: true,
            }]
        );
    }

    #[test]
    fn typing_passes_keys_through_and_escape_blurs() {
        let mut s = Session::new(
            MemoryPage::from_outline("/projects/demo/issues", "en", "project-demo", "input#q[accesskey=\"f\"]\ntable.issues\n  tbody\n    tr\n      td\n        input[type=\"checkbox\"][checked]\n      td\n        a[href=\"/issues/1\"] | One")
                .unwrap(),
        );
        let input = s.page.element_by_id("q").unwrap();
        s.page.focus(input);

        for ch in ['j', 'x', 'h', '?'] {
            assert!(!s.press(ch).consumed());
        }
        assert_eq!(s.issue_index(), None);
        assert!(s.page.take_effects().is_empty());
        assert!(!s.dispatcher.help_open());

        assert!(s.key(KeyInput::new(Key::Escape)).consumed());
        assert_eq!(s.page.active_element(), None);
        assert_eq!(s.checked(), vec![true]);
    }

    #[test]
    fn help_closes_on_any_key_without_running_it() {
        let mut s = Session::new(issue_list(2));
        assert!(s.press('?').consumed());
        assert!(s.dispatcher.help_open());

        assert!(!s.key(KeyInput::new(Key::Modifier(ModifierKey::Shift))).consumed());
        assert!(s.dispatcher.help_open());

        assert!(s.press('j').consumed());
        assert!(!s.dispatcher.help_open());
        assert_eq!(s.issue_index(), None);

        let overlay = s.page.element_by_id("shortcut-overlay").unwrap();
        assert!(!s.page.is_visible(overlay));
    }

    #[test]
    fn shift_slash_opens_help() {
        let mut s = Session::new(issue_list(1));
        s.key(KeyInput::new(Key::Char('/')).with_code("Slash").with_shift());
        assert!(s.dispatcher.help_open());
        s.dispatcher.toggle_help(&mut s.page);
        assert!(!s.dispatcher.help_open());
        s.dispatcher.open_help(&mut s.page);
        s.dispatcher.close_help(&mut s.page);
        assert!(!s.dispatcher.help_open());
    }

    #[test]
    fn command_modifiers_bypass_shortcuts() {
        let mut s = Session::new(issue_list(2));
        assert!(!s.key(KeyInput::char('j').with_ctrl()).consumed());
        assert!(!s.key(KeyInput::char('h').with_alt()).consumed());
        assert_eq!(s.issue_index(), None);
        assert!(s.page.take_effects().is_empty());
    }

    #[test]
    fn search_results_navigation() {
        let mut s = Session::search();
        assert!(!s.key(KeyInput::new(Key::Enter)).consumed());
        s.keys("jj");
        assert_eq!(s.dispatcher.selection().index(ListKind::Search), Some(1));
        s.key(KeyInput::new(Key::Enter));
        s.press('t');
        assert_eq!(
            s.page.take_effects(),
            vec![
                HostEffect::Navigate("/projects/demo/wiki/Start".to_string()),
                HostEffect::OpenTab("/projects/demo/wiki/Start".to_string()),
            ]
        );
    }

    #[test]
    fn search_page_ignores_issue_keys() {
        let mut s = Session::search();
        assert!(!s.press('x').consumed());
        assert!(s.press('h').consumed());
        assert_eq!(navigated(&mut s.page), vec!["/".to_string()]);
    }

    #[test]
    fn navigation_keys_use_project_when_present() {
        let mut s = Session::new(issue_list(1));
        s.keys("niwamh");
        assert_eq!(
            navigated(&mut s.page),
            vec![
                "/projects/demo/issues/new",
                "/projects/demo/issues",
                "/projects/demo/wiki",
                "/projects/demo/activity",
                "/my/page",
                "/",
            ]
        );
    }

    #[test]
    fn navigation_keys_without_project() {
        let mut s = Session::new(MemoryPage::new("/my/page", "en", "controller-my"));
        assert!(!s.press('n').consumed());
        assert!(!s.press('W').consumed());
        s.keys("IA");
        assert_eq!(navigated(&mut s.page), vec!["/issues", "/activity"]);
    }

    #[test]
    fn c_clicks_copy_link() {
        let mut s = Session::detail();
        assert!(s.press('c').consumed());
        assert_eq!(
            navigated(&mut s.page),
            vec!["/projects/demo/issues/7/copy".to_string()]
        );

        let mut blank = Session::new(MemoryPage::new("/", "en", ""));
        assert!(blank.press('C').consumed());
        assert!(blank.page.take_effects().is_empty());
    }

    #[test]
    fn slash_focuses_and_selects_search() {
        let mut s = Session::detail();
        assert!(s.press('/').consumed());
        let search = s.page.element_by_id("q").unwrap();
        assert_eq!(s.page.active_element(), Some(search));
        assert!(s.page.type_char('x'));
        assert_eq!(s.page.value(search), "x");
    }

    #[test]
    fn r_runs_registered_reply() {
        let mut s = Session::detail();
        assert!(s.press('r').consumed());
        let field = s.page.element_by_id("issue_assigned_to_id").unwrap();
        assert_eq!(s.page.value(field), "9");
        assert_eq!(s.page.active_element(), s.page.element_by_id("issue_notes"));

        let mut list = Session::new(issue_list(1));
        assert!(!list.press('r').consumed());
    }

    #[test]
    fn e_opens_editor_and_description_toggle() {
        let mut s = Session::detail();
        s.press('r');
        s.key(KeyInput::new(Key::Escape));
        assert!(s.press('e').consumed());

        let update = s.page.element_by_id("update").unwrap();
        let toolbar = s.page.element_by_id("issue_description_and_toolbar").unwrap();
        assert!(s.page.is_visible(update));
        assert!(s.page.is_visible(toolbar));
        // Edit restores the assignee the reply changed
        let field = s.page.element_by_id("issue_assigned_to_id").unwrap();
        assert_eq!(s.page.value(field), "4");
        assert!(!s.dispatcher.is_busy());
    }

    #[test]
    fn e_waits_for_late_description_toggle() {
        let page = MemoryPage::from_outline(
            "/issues/7",
            "en",
            "",
            r##"
div#content
  div.contextual
    a.icon-edit[href="/issues/7/edit"][data-reveal="fast-desc-link"][data-delay="3"] | Edit
  div.description
    a#fast-desc-link[href="#"][data-reveal="desc"][deferred] | Edit description
  div#desc[hidden]
"##,
        )
        .unwrap();
        let mut s = Session::new(page);
        s.press('e');
        assert!(s.dispatcher.is_busy());

        for _ in 0..3 {
            s.page.tick();
            s.wait(50);
            s.settle();
        }
        let desc = s.page.element_by_id("desc").unwrap();
        assert!(s.page.is_visible(desc));
        assert!(!s.dispatcher.is_busy());
    }

    #[test]
    fn late_toggle_after_missed_tick_stays_closed() {
        let page = MemoryPage::from_outline(
            "/issues/7",
            "en",
            "",
            r##"
div#content
  div.contextual
    a.icon-edit[href="/issues/7/edit"][data-reveal="fast-desc-link"][data-delay="1"] | Edit
  div.description
    a#fast-desc-link[href="#"][data-reveal="desc"][deferred] | Edit description
  div#desc[hidden]
"##,
        )
        .unwrap();
        let mut s = Session::new(page);
        s.press('e');

        // The host stalls past the deadline, so its mutation arrives first
        s.now += Duration::from_millis(1600);
        s.page.tick();
        s.settle();
        assert!(!s.dispatcher.is_busy());
        let desc = s.page.element_by_id("desc").unwrap();
        assert!(!s.page.is_visible(desc));
    }

    #[test]
    fn e_gives_up_after_deadline() {
        let page = MemoryPage::from_outline(
            "/issues/7",
            "en",
            "",
            "div#content\n  div.contextual\n    a.icon-edit[href=\"#\"] | Edit",
        )
        .unwrap();
        let mut s = Session::new(page);
        s.press('e');
        assert!(s.dispatcher.is_busy());
        s.wait(1499);
        assert!(s.dispatcher.is_busy());
        s.wait(1);
        assert!(!s.dispatcher.is_busy());
    }

    #[test]
    fn p_opens_project_jump_and_follows_single_match() {
        let mut s = Session::detail();
        let outcome = s.press('p');
        assert!(outcome.propagation_stopped);

        let input = s.page.element_by_id("projects-quick-search").unwrap();
        assert_eq!(s.page.active_element(), Some(input));

        // Typing goes to the quick search, not to the shortcuts
        assert!(!s.press('b').consumed());
        s.type_text("b");
        assert_eq!(navigated(&mut s.page), vec!["/projects/beta".to_string()]);
    }

    #[test]
    fn p_twice_closes_project_jump() {
        let mut s = Session::detail();
        s.press('p');
        let input = s.page.element_by_id("projects-quick-search").unwrap();
        s.page.blur(input);
        s.press('P');

        let jump = s.page.element_by_id("project-jump").unwrap();
        assert!(!s.page.has_class(jump, "expanded"));
        assert!(!s.page.is_visible(input));

        let mut list = Session::new(issue_list(1));
        assert!(!list.press('p').consumed());
    }

    #[test]
    fn modifier_enter_submits_even_while_typing() {
        let mut s = Session::detail();
        let notes = s.page.element_by_id("issue_notes").unwrap();
        s.page.focus(notes);

        let outcome = s.key(KeyInput::new(Key::Enter).with_meta());
        assert!(outcome.propagation_stopped);
        assert_eq!(
            s.page.take_effects(),
            vec![HostEffect::Submitted {
                form: "form#issue-form".to_string(),
                validated: true,
            }]
        );

        s.key(KeyInput::new(Key::Enter).with_alt());
        assert_eq!(s.page.take_effects().len(), 1);
    }

    #[test]
    fn shift_enter_toggles_preview_while_typing() {
        let mut s = Session::detail();
        s.press('r');
        let panel = s.page.element_by_id("notes-preview").unwrap();

        assert!(s.key(KeyInput::new(Key::Enter).with_shift()).consumed());
        assert!(s.page.is_visible(panel));
        s.key(KeyInput::new(Key::Enter).with_shift());
        assert!(!s.page.is_visible(panel));
    }

    #[test]
    fn help_swallows_shift_enter() {
        let mut s = Session::detail();
        s.press('r');
        s.dispatcher.open_help(&mut s.page);
        s.key(KeyInput::new(Key::Enter).with_shift());

        assert!(!s.dispatcher.help_open());
        let panel = s.page.element_by_id("notes-preview").unwrap();
        assert!(!s.page.is_visible(panel));
    }
}
