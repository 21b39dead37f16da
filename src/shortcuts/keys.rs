/// Modifier and lock keys that arrive as key presses of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierKey {
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
    NumLock,
    ScrollLock,
}

/// The logical key of a key press. Space is `Char(' ')`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Modifier(ModifierKey),
    Other(String),
}

/// A key-down event as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    /// Physical key code, e.g. `Slash`, when the host knows it.
    pub code: Option<String>,
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyInput {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            code: None,
            shift: false,
            alt: false,
            ctrl: false,
            meta: false,
        }
    }

    /// A printable key; upper-case letters and `?` carry Shift.
    pub fn char(ch: char) -> Self {
        let mut input = Self::new(Key::Char(ch));
        input.shift = ch.is_uppercase() || ch == '?';
        if ch == '/' || ch == '?' {
            input.code = Some("Slash".to_string());
        }
        input
    }

    #[allow(dead_code)]
    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    #[allow(dead_code)]
    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    #[allow(dead_code)]
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    #[allow(dead_code)]
    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    #[allow(dead_code)]
    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn printable(&self) -> Option<char> {
        match self.key {
            Key::Char(ch) => Some(ch),
            _ => None,
        }
    }

    pub fn is_char(&self, ch: char) -> bool {
        self.key == Key::Char(ch)
    }

    /// `?`, or Shift on the slash key for layouts that report it that way.
    pub fn is_help(&self) -> bool {
        self.is_char('?') || (self.shift && self.code.as_deref() == Some("Slash"))
    }

    /// Held with a modifier that belongs to the browser or the OS.
    pub fn has_command_modifier(&self) -> bool {
        self.alt || self.ctrl || self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_key_variants() {
        assert!(KeyInput::char('?').is_help());
        assert!(KeyInput::new(Key::Char('/')).with_code("Slash").with_shift().is_help());
        assert!(!KeyInput::char('/').is_help());
    }

    #[test]
    fn char_sets_shift_for_upper_case() {
        assert!(KeyInput::char('G').shift);
        assert!(!KeyInput::char('g').shift);
        assert_eq!(KeyInput::char(' ').printable(), Some(' '));
        assert!(KeyInput::char('e').with_meta().has_command_modifier());
    }
}
