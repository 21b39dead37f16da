//! The keyboard shortcut layer, independent of any concrete host page.

mod chord;
mod context;
mod dispatch;
mod editor;
mod forms;
mod help;
mod keys;
mod locale;
mod project_jump;
mod reply;
mod rows;
mod selection;
mod style;
mod watch;

#[cfg(test)]
pub(crate) mod test_pages;

pub use context::PageContext;
pub use dispatch::{Dispatcher, Settings};
pub use help::OVERLAY_ID;
pub use keys::{Key, KeyInput, ModifierKey};
pub use locale::Locale;
pub use style::SELECTED_CLASS;
