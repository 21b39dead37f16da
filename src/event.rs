use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, ModifierKeyCode};

use crate::shortcuts::{Key, KeyInput, ModifierKey};

#[derive(Debug, Clone)]
pub enum Event {
    Init,
    Tick,
    Render,
    Key(KeyEvent),
    /// Bracketed paste, delivered as text rather than key presses.
    Paste(String),
}

impl Event {
    pub fn is_quit(&self) -> bool {
        matches!(
            self,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            })
        )
    }
}

/// Translate a terminal key press into the key-down event a page would see.
/// Keys a browser page never receives map to `None`.
pub fn key_input(event: &KeyEvent) -> Option<KeyInput> {
    let modifiers = event.modifiers;
    let mut shift = modifiers.contains(KeyModifiers::SHIFT);

    let key = match event.code {
        KeyCode::Char(ch) => {
            shift |= ch.is_uppercase() || ch == '?';
            Key::Char(ch)
        }
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => {
            shift = true;
            Key::Tab
        }
        KeyCode::CapsLock => Key::Modifier(ModifierKey::CapsLock),
        KeyCode::NumLock => Key::Modifier(ModifierKey::NumLock),
        KeyCode::ScrollLock => Key::Modifier(ModifierKey::ScrollLock),
        KeyCode::Modifier(code) => Key::Modifier(modifier_key(code)),
        KeyCode::Null => return None,
        other => Key::Other(format!("{other:?}")),
    };

    let code = match key {
        Key::Char('/' | '?') => Some("Slash".to_string()),
        _ => None,
    };

    Some(KeyInput {
        key,
        code,
        shift,
        alt: modifiers.contains(KeyModifiers::ALT),
        ctrl: modifiers.contains(KeyModifiers::CONTROL),
        meta: modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
    })
}

fn modifier_key(code: ModifierKeyCode) -> ModifierKey {
    match code {
        ModifierKeyCode::LeftShift
        | ModifierKeyCode::RightShift
        | ModifierKeyCode::IsoLevel3Shift
        | ModifierKeyCode::IsoLevel5Shift => ModifierKey::Shift,
        ModifierKeyCode::LeftControl | ModifierKeyCode::RightControl => ModifierKey::Control,
        ModifierKeyCode::LeftAlt | ModifierKeyCode::RightAlt => ModifierKey::Alt,
        ModifierKeyCode::LeftSuper
        | ModifierKeyCode::RightSuper
        | ModifierKeyCode::LeftHyper
        | ModifierKeyCode::RightHyper
        | ModifierKeyCode::LeftMeta
        | ModifierKeyCode::RightMeta => ModifierKey::Meta,
    }
}
