//! Global hotkey parsing and registration.
//!
//! A shortcut is written as tokens joined by `+` or `-`, case-insensitive,
//! e.g. `Ctrl+Alt+F1` or `ctrl-shift-space`. Exactly one token must be a
//! non-modifier key; parsing never silently drops anything, and every
//! malformed input maps to a distinct [`ParseError`] carrying the offending
//! text.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

/// Modifier bits as accepted by `RegisterHotKey`.
pub mod mods {
    pub const ALT: u32 = 0x0001;
    pub const CONTROL: u32 = 0x0002;
    pub const SHIFT: u32 = 0x0004;
    pub const WIN: u32 = 0x0008;
}

/// A parsed, registrable shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub modifiers: u32,
    /// Virtual-key code of the single non-modifier key.
    pub key: u16,
    /// The text the binding was parsed from, kept for display.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("hotkey text is empty")]
    Empty,
    #[error("hotkey `{0}` has no main key")]
    MissingKey(String),
    #[error("hotkey `{0}` has more than one main key")]
    ExtraKey(String),
    #[error("unknown key `{0}`")]
    UnknownKey(String),
}

static KEY_CODES: Lazy<HashMap<String, u16>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (i, c) in ('A'..='Z').enumerate() {
        map.insert(c.to_string(), 0x41 + i as u16);
    }
    for d in 0..=9u16 {
        map.insert(d.to_string(), 0x30 + d);
    }
    for f in 1..=24u16 {
        map.insert(format!("F{f}"), 0x6F + f);
    }
    let named: [(&str, u16); 12] = [
        ("SPACE", 0x20),
        ("TAB", 0x09),
        ("ESCAPE", 0x1B),
        ("ENTER", 0x0D),
        ("HOME", 0x24),
        ("END", 0x23),
        ("INSERT", 0x2D),
        ("DELETE", 0x2E),
        ("UP", 0x26),
        ("DOWN", 0x28),
        ("LEFT", 0x25),
        ("RIGHT", 0x27),
    ];
    for (name, vk) in named {
        map.insert(name.to_string(), vk);
    }
    map
});

fn modifier_bit(token: &str) -> Option<u32> {
    match token {
        "CTRL" => Some(mods::CONTROL),
        "ALT" => Some(mods::ALT),
        "SHIFT" => Some(mods::SHIFT),
        "WIN" => Some(mods::WIN),
        _ => None,
    }
}

/// Parse a shortcut description into a [`HotkeyBinding`].
pub fn parse(text: &str) -> Result<HotkeyBinding, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let tokens: Vec<&str> = text
        .split(['+', '-'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(ParseError::MissingKey(text.to_string()));
    }

    let mut modifiers = 0u32;
    let mut key: Option<u16> = None;
    for token in tokens {
        let upper = token.to_uppercase();
        if let Some(bit) = modifier_bit(&upper) {
            modifiers |= bit;
        } else {
            if key.is_some() {
                return Err(ParseError::ExtraKey(text.to_string()));
            }
            let vk = *KEY_CODES
                .get(&upper)
                .ok_or_else(|| ParseError::UnknownKey(token.to_string()))?;
            key = Some(vk);
        }
    }

    match key {
        Some(key) => Ok(HotkeyBinding {
            modifiers,
            key,
            raw: text.to_string(),
        }),
        None => Err(ParseError::MissingKey(text.to_string())),
    }
}

#[cfg(windows)]
mod registration {
    use super::HotkeyBinding;
    use crate::error::OsError;
    use tracing::debug;
    use windows::Win32::Foundation::HWND;
    use windows::Win32::UI::Input::KeyboardAndMouse::{
        RegisterHotKey, UnregisterHotKey, HOT_KEY_MODIFIERS,
    };

    /// Register `binding` system-wide under `id`, bound to `hwnd`.
    ///
    /// Idempotent: any registration already held under `id` is dropped first,
    /// so a changed shortcut string never leaves two live registrations.
    pub fn register(hwnd: HWND, id: i32, binding: &HotkeyBinding) -> Result<(), OsError> {
        unregister(hwnd, id);
        unsafe {
            RegisterHotKey(
                hwnd,
                id,
                HOT_KEY_MODIFIERS(binding.modifiers),
                binding.key as u32,
            )
            .map_err(|e| OsError::from_win32("RegisterHotKey", e))?;
        }
        debug!(hotkey = %binding.raw, id, "hotkey registered");
        Ok(())
    }

    /// Drop the registration under `id` if one exists.
    pub fn unregister(hwnd: HWND, id: i32) {
        unsafe {
            if let Err(e) = UnregisterHotKey(hwnd, id) {
                // Expected when nothing was registered under the id yet.
                debug!(id, error = %e, "UnregisterHotKey reported failure");
            }
        }
    }
}

#[cfg(windows)]
pub use registration::{register, unregister};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modifiers_and_function_key() {
        let binding = parse("Ctrl+Alt+F1").unwrap();
        assert_eq!(binding.modifiers, mods::CONTROL | mods::ALT);
        assert_eq!(binding.key, 0x70);
        assert_eq!(binding.raw, "Ctrl+Alt+F1");
    }

    #[test]
    fn case_and_delimiter_insensitive() {
        let lower = parse("ctrl-alt-f1").unwrap();
        let upper = parse("Ctrl+Alt+F1").unwrap();
        assert_eq!(lower.modifiers, upper.modifiers);
        assert_eq!(lower.key, upper.key);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(parse(""), Err(ParseError::Empty));
        assert_eq!(parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn modifiers_without_main_key_are_rejected() {
        assert_eq!(
            parse("Ctrl+Alt"),
            Err(ParseError::MissingKey("Ctrl+Alt".into()))
        );
    }

    #[test]
    fn two_main_keys_are_rejected() {
        assert_eq!(parse("A+B"), Err(ParseError::ExtraKey("A+B".into())));
    }

    #[test]
    fn unknown_key_names_the_token() {
        assert_eq!(parse("Ctrl+Xyz"), Err(ParseError::UnknownKey("Xyz".into())));
    }

    #[test]
    fn letters_digits_and_named_keys() {
        assert_eq!(parse("Win+Z").unwrap().key, 0x5A);
        assert_eq!(parse("Shift+7").unwrap().key, 0x37);
        assert_eq!(parse("Ctrl+Space").unwrap().key, 0x20);
        assert_eq!(parse("Ctrl+Delete").unwrap().key, 0x2E);
        assert_eq!(parse("Alt+Up").unwrap().key, 0x26);
        assert_eq!(parse("F24").unwrap().key, 0x87);
    }

    #[test]
    fn bare_key_has_no_modifiers() {
        let binding = parse("F5").unwrap();
        assert_eq!(binding.modifiers, 0);
        assert_eq!(binding.key, 0x74);
    }
}
