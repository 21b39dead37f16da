use crate::error::BlitzError;
use crate::shortcuts::KeyInput;

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    /// A key press delivered to the page.
    Key(KeyInput),
    /// Text pasted into the focused input.
    Paste(String),
    ToggleHelp,
    Tick,
    Error(String),
    None,
}

impl From<BlitzError> for Action {
    fn from(err: BlitzError) -> Self {
        Action::Error(err.to_string())
    }
}
