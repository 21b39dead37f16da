use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, warn};

use crate::action::Action;
use crate::config::Config;
use crate::dom::{HostEffect, MemoryPage, ScrollTarget, Site};
use crate::error::Result;
use crate::event::{key_input, Event};
use crate::shortcuts::{Dispatcher, Key, KeyInput, Settings};

/// Rounds of host events delivered after one input before giving up on the
/// page settling.
const MAX_SETTLE_ROUNDS: usize = 32;

pub struct App {
    pub page: MemoryPage,
    pub dispatcher: Dispatcher,
    /// Where the viewport was last scrolled to without a row anchor.
    pub scroll: ScrollTarget,
    /// What the page last asked of its host.
    pub last_effect: Option<String>,
    pub error: Option<String>,
    pub should_quit: bool,
    site: Site,
    config: Config,
    settings: Settings,
}

impl App {
    pub fn new(site: Site, config: Config, language: Option<&str>) -> Result<Self> {
        let settings = config.settings(language);
        let mut page = site.open(site.start())?;
        let dispatcher = Dispatcher::install(&mut page, settings);
        Ok(Self {
            page,
            dispatcher,
            scroll: ScrollTarget::Top,
            last_effect: None,
            error: None,
            should_quit: false,
            site,
            config,
            settings,
        })
    }

    pub fn handle_event(&self, event: Event) -> Action {
        if event.is_quit() {
            return Action::Quit;
        }
        match event {
            Event::Tick => Action::Tick,
            Event::Key(key) => self.handle_key(key),
            Event::Paste(text) => Action::Paste(text),
            Event::Init | Event::Render => Action::None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Action {
        if key.code == KeyCode::F(1) {
            return Action::ToggleHelp;
        }
        key_input(&key).map_or(Action::None, Action::Key)
    }

    pub fn update(&mut self, action: Action) {
        if self.error.is_some() && !matches!(action, Action::Tick | Action::None) {
            self.error = None;
        }

        let now = Instant::now();
        match action {
            Action::Quit => {
                self.should_quit = true;
                return;
            }
            Action::Key(input) => {
                let outcome = self.dispatcher.handle_key(&mut self.page, &input, now);
                if !outcome.consumed() {
                    self.type_into_page(&input);
                }
            }
            Action::Paste(text) => {
                let typed = text
                    .chars()
                    .filter(|ch| !ch.is_control())
                    .all(|ch| self.page.type_char(ch));
                if !typed {
                    debug!("paste ignored, no text entry focused");
                }
            }
            Action::ToggleHelp => self.dispatcher.toggle_help(&mut self.page),
            Action::Tick => {
                self.page.tick();
                self.dispatcher.on_tick(now);
            }
            Action::Error(message) => self.error = Some(message),
            Action::None => return,
        }

        self.settle(now);
    }

    /// Keys the shortcut layer left alone reach the focused text entry.
    fn type_into_page(&mut self, input: &KeyInput) {
        if input.ctrl || input.meta {
            return;
        }
        match input.key {
            Key::Char(ch) => {
                self.page.type_char(ch);
            }
            Key::Backspace => {
                self.page.backspace();
            }
            _ => {}
        }
    }

    /// Deliver mutations, input events and deferred work until the page is
    /// quiet, then carry out what it asked of the host.
    fn settle(&mut self, now: Instant) {
        for _ in 0..MAX_SETTLE_ROUNDS {
            let mutations = self.page.take_mutations();
            let inputs = self.page.take_inputs();
            if !mutations.is_empty() {
                self.dispatcher.on_mutations(&mut self.page, &mutations, now);
            }
            for input in &inputs {
                self.dispatcher.on_input(*input);
            }
            let ran = self.dispatcher.run_deferred(&mut self.page);
            if !ran && mutations.is_empty() && inputs.is_empty() {
                break;
            }
        }

        for effect in self.page.take_effects() {
            if self.apply(effect) {
                break;
            }
        }
    }

    /// Returns true when the effect replaced the page.
    fn apply(&mut self, effect: HostEffect) -> bool {
        match effect {
            HostEffect::Navigate(url) => {
                self.navigate(&url);
                true
            }
            HostEffect::OpenTab(url) => {
                match self.config.browser_url(&url) {
                    Some(absolute) => match open::that(&absolute) {
                        Ok(()) => self.last_effect = Some(format!("Opened {absolute} in browser")),
                        Err(err) => {
                            warn!(%absolute, %err, "could not open browser");
                            self.error = Some(format!("Could not open {absolute}: {err}"));
                        }
                    },
                    None => self.last_effect = Some(format!("New tab: {url}")),
                }
                false
            }
            HostEffect::Submitted { form, validated } => {
                let how = if validated { "validated" } else { "unvalidated" };
                self.last_effect = Some(format!("Submitted {form} ({how})"));
                false
            }
            HostEffect::Scrolled(target) => {
                self.scroll = target;
                false
            }
        }
    }

    fn navigate(&mut self, location: &str) {
        debug!(location, "loading page");
        match self.site.open(location) {
            Ok(mut page) => {
                self.dispatcher = Dispatcher::install(&mut page, self.settings);
                self.page = page;
                self.scroll = ScrollTarget::Top;
                self.last_effect = Some(format!("Navigated to {location}"));
            }
            Err(err) => self.update(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Page;

    const SITE: &str = r#"
language = "en"
start = "/projects/demo/issues"
layout = """
div#top-menu
  input#q[accesskey="f"]
"""

[[pages]]
path = "/projects/demo/issues"
body_class = "project-demo controller-issues"
outline = """
div#content
  table.list.issues
    tbody
      tr.issue
        td.checkbox
          input[type="checkbox"]
        td.subject
          a[href="/issues/1"] | First
"""

[[pages]]
path = "/issues/1"
body_class = "project-demo"
outline = """
div#content
  div.contextual
    a.icon-edit[href="/issues/1/edit"] | Edit
"""
"#;

    fn app() -> App {
        App::new(Site::from_toml(SITE).unwrap(), Config::default(), None).unwrap()
    }

    fn press(app: &mut App, ch: char) {
        app.update(Action::Key(KeyInput::char(ch)));
    }

    #[test]
    fn enter_follows_selected_issue_to_next_page() {
        let mut app = app();
        press(&mut app, 'j');
        app.update(Action::Key(KeyInput::new(Key::Enter)));
        assert_eq!(app.page.location(), "/issues/1");
        assert_eq!(app.last_effect.as_deref(), Some("Navigated to /issues/1"));
        // A fresh session installed the reply button
        assert!(app.page.element_by_id("vc-reply-button").is_some());
    }

    #[test]
    fn unconsumed_keys_are_typed_into_focused_input() {
        let mut app = app();
        press(&mut app, '/');
        for ch in "bug".chars() {
            press(&mut app, ch);
        }
        app.update(Action::Key(KeyInput::new(Key::Backspace)));
        let search = app.page.element_by_id("q").unwrap();
        assert_eq!(app.page.value(search), "bu");
    }

    #[test]
    fn new_tab_without_base_url_is_reported() {
        let mut app = app();
        press(&mut app, 'j');
        press(&mut app, 't');
        assert_eq!(app.last_effect.as_deref(), Some("New tab: /issues/1"));
    }

    #[test]
    fn scroll_effects_move_viewport() {
        let mut app = app();
        press(&mut app, 'G');
        assert_eq!(app.scroll, ScrollTarget::Bottom);
    }

    #[test]
    fn paste_types_into_focused_input_without_shortcuts() {
        let mut app = app();
        app.update(Action::Paste("jjG".to_string()));
        assert_eq!(app.scroll, ScrollTarget::Top);

        press(&mut app, '/');
        app.update(Action::Paste("crash\n".to_string()));
        let search = app.page.element_by_id("q").unwrap();
        assert_eq!(app.page.value(search), "crash");
    }

    #[test]
    fn f1_toggles_help_and_ctrl_c_quits() {
        let mut app = app();
        let action = app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::F(1),
            crossterm::event::KeyModifiers::NONE,
        )));
        app.update(action);
        assert!(app.dispatcher.help_open());

        let quit = app.handle_event(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            crossterm::event::KeyModifiers::CONTROL,
        )));
        app.update(quit);
        assert!(app.should_quit);
    }
}
