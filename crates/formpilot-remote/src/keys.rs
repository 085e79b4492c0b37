//! Keyboard event synthesis for `Input.dispatchKeyEvent`.
//!
//! Key names follow the DOM `KeyboardEvent.key` convention: named keys
//! like `Enter` or `ArrowDown`, modifier names like `Control`, and
//! single printable characters. The [`Keyboard`] tracks which modifiers
//! are held so chords produce the modifier mask Chromium expects.

use serde::Serialize;
use serde_json::{Value, json};

use crate::error::ControlError;

const MODIFIER_ALT: u32 = 1;
const MODIFIER_CONTROL: u32 = 2;
const MODIFIER_META: u32 = 4;
const MODIFIER_SHIFT: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum KeyEventType {
    KeyDown,
    KeyUp,
    RawKeyDown,
}

#[derive(Debug, Clone)]
pub(crate) struct KeyDefinition {
    pub(crate) key: String,
    pub(crate) code: String,
    pub(crate) text: Option<String>,
    pub(crate) virtual_key_code: i64,
}

pub(crate) fn modifier_bit(key: &str) -> u32 {
    match key {
        "Alt" => MODIFIER_ALT,
        "Control" => MODIFIER_CONTROL,
        "Meta" => MODIFIER_META,
        "Shift" => MODIFIER_SHIFT,
        _ => 0,
    }
}

/// Resolve a key name to its event fields, or `None` for names Chromium
/// would not recognize.
pub(crate) fn definition(key: &str) -> Option<KeyDefinition> {
    if let Some(definition) = named_definition(key) {
        return Some(definition);
    }
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => char_definition(ch),
        _ => None,
    }
}

fn named_definition(key: &str) -> Option<KeyDefinition> {
    let (code, virtual_key_code, text): (&str, i64, Option<&str>) = match key {
        "Enter" => ("Enter", 13, Some("\r")),
        "Tab" => ("Tab", 9, None),
        "Escape" => ("Escape", 27, None),
        "Backspace" => ("Backspace", 8, None),
        "Delete" => ("Delete", 46, None),
        "Insert" => ("Insert", 45, None),
        "ArrowUp" => ("ArrowUp", 38, None),
        "ArrowDown" => ("ArrowDown", 40, None),
        "ArrowLeft" => ("ArrowLeft", 37, None),
        "ArrowRight" => ("ArrowRight", 39, None),
        "Home" => ("Home", 36, None),
        "End" => ("End", 35, None),
        "PageUp" => ("PageUp", 33, None),
        "PageDown" => ("PageDown", 34, None),
        "Space" => ("Space", 32, Some(" ")),
        "Shift" => ("ShiftLeft", 16, None),
        "Control" => ("ControlLeft", 17, None),
        "Alt" => ("AltLeft", 18, None),
        "Meta" => ("MetaLeft", 91, None),
        _ => {
            let n: i64 = key.strip_prefix('F')?.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            return Some(KeyDefinition {
                key: key.to_string(),
                code: key.to_string(),
                text: None,
                virtual_key_code: 111 + n,
            });
        }
    };
    Some(KeyDefinition {
        key: key.to_string(),
        code: code.to_string(),
        text: text.map(str::to_string),
        virtual_key_code,
    })
}

// Shifted characters keep the virtual key code of their physical key.
const PUNCTUATION: &[(char, &str, i64)] = &[
    (';', "Semicolon", 186),
    (':', "Semicolon", 186),
    ('=', "Equal", 187),
    ('+', "Equal", 187),
    (',', "Comma", 188),
    ('<', "Comma", 188),
    ('-', "Minus", 189),
    ('_', "Minus", 189),
    ('.', "Period", 190),
    ('>', "Period", 190),
    ('/', "Slash", 191),
    ('?', "Slash", 191),
    ('`', "Backquote", 192),
    ('~', "Backquote", 192),
    ('[', "BracketLeft", 219),
    ('{', "BracketLeft", 219),
    ('\\', "Backslash", 220),
    ('|', "Backslash", 220),
    (']', "BracketRight", 221),
    ('}', "BracketRight", 221),
    ('\'', "Quote", 222),
    ('"', "Quote", 222),
    ('!', "Digit1", 49),
    ('@', "Digit2", 50),
    ('#', "Digit3", 51),
    ('$', "Digit4", 52),
    ('%', "Digit5", 53),
    ('^', "Digit6", 54),
    ('&', "Digit7", 55),
    ('*', "Digit8", 56),
    ('(', "Digit9", 57),
    (')', "Digit0", 48),
];

fn char_definition(ch: char) -> Option<KeyDefinition> {
    let (code, virtual_key_code) = match ch {
        'a'..='z' => (
            format!("Key{}", ch.to_ascii_uppercase()),
            ch.to_ascii_uppercase() as i64,
        ),
        'A'..='Z' => (format!("Key{ch}"), ch as i64),
        '0'..='9' => (format!("Digit{ch}"), ch as i64),
        ' ' => ("Space".to_string(), 32),
        _ => {
            let (_, code, virtual_key_code) =
                PUNCTUATION.iter().find(|(candidate, _, _)| *candidate == ch)?;
            ((*code).to_string(), *virtual_key_code)
        }
    };
    Some(KeyDefinition {
        key: ch.to_string(),
        code,
        text: Some(ch.to_string()),
        virtual_key_code,
    })
}

/// Stateful builder for key event parameters.
///
/// One instance lives per controller; pressing a modifier changes the
/// mask carried by every event until the matching release.
#[derive(Debug, Default)]
pub(crate) struct Keyboard {
    modifiers: u32,
}

impl Keyboard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn modifiers(&self) -> u32 {
        self.modifiers
    }

    /// Parameters for a key press. Keys that produce text get a
    /// `keyDown`, everything else a `rawKeyDown`. `command` names an
    /// editing command for Chromium to run on the event, like
    /// `selectAll`.
    pub(crate) fn down(&mut self, key: &str, command: Option<&str>) -> Result<Value, ControlError> {
        let definition =
            definition(key).ok_or_else(|| ControlError::UnknownKey(key.to_string()))?;
        self.modifiers |= modifier_bit(key);

        // Held modifiers other than shift suppress text insertion.
        let text = if self.modifiers & !MODIFIER_SHIFT != 0 {
            None
        } else {
            definition.text
        };
        let event = if text.is_some() {
            KeyEventType::KeyDown
        } else {
            KeyEventType::RawKeyDown
        };
        let commands: Vec<String> = command.map(|c| vec![c.to_string()]).unwrap_or_default();
        let text = text.unwrap_or_default();

        Ok(json!({
            "type": event,
            "modifiers": self.modifiers,
            "windowsVirtualKeyCode": definition.virtual_key_code,
            "code": definition.code,
            "key": definition.key,
            "text": text,
            "unmodifiedText": text,
            "autoRepeat": false,
            "isKeypad": false,
            "location": 0,
            "commands": commands,
        }))
    }

    /// Parameters for a key release. Releasing a modifier drops its bit
    /// before the mask is read.
    pub(crate) fn up(&mut self, key: &str) -> Result<Value, ControlError> {
        let definition =
            definition(key).ok_or_else(|| ControlError::UnknownKey(key.to_string()))?;
        self.modifiers &= !modifier_bit(key);

        Ok(json!({
            "type": KeyEventType::KeyUp,
            "modifiers": self.modifiers,
            "windowsVirtualKeyCode": definition.virtual_key_code,
            "code": definition.code,
            "key": definition.key,
            "location": 0,
        }))
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
