//! Key codes, labels and shortcut strings.
//!
//! Key codes are macOS virtual key codes. Shortcut format:
//! `[Cmd+][Opt+][Shift+][Ctrl+]<Key>`, e.g. `Cmd+Shift+Space`.

use super::{HotKey, Modifiers};
use std::fmt;

pub const P: u32 = 0x23;
pub const SPACE: u32 = 0x31;

/// (key code, label) for every key the app can bind
const KEY_TABLE: &[(u32, &str)] = &[
    (0x00, "A"),
    (0x0B, "B"),
    (0x08, "C"),
    (0x02, "D"),
    (0x0E, "E"),
    (0x03, "F"),
    (0x05, "G"),
    (0x04, "H"),
    (0x22, "I"),
    (0x26, "J"),
    (0x28, "K"),
    (0x25, "L"),
    (0x2E, "M"),
    (0x2D, "N"),
    (0x1F, "O"),
    (P, "P"),
    (0x0C, "Q"),
    (0x0F, "R"),
    (0x01, "S"),
    (0x11, "T"),
    (0x20, "U"),
    (0x09, "V"),
    (0x0D, "W"),
    (0x07, "X"),
    (0x10, "Y"),
    (0x06, "Z"),
    (0x1D, "0"),
    (0x12, "1"),
    (0x13, "2"),
    (0x14, "3"),
    (0x15, "4"),
    (0x17, "5"),
    (0x16, "6"),
    (0x1A, "7"),
    (0x1C, "8"),
    (0x19, "9"),
    (SPACE, "Space"),
    (0x24, "Return"),
    (0x35, "Escape"),
    (0x33, "Delete"),
    (0x30, "Tab"),
    (0x7B, "Left"),
    (0x7C, "Right"),
    (0x7D, "Down"),
    (0x7E, "Up"),
];

pub fn label_for(key_code: u32) -> Option<&'static str> {
    KEY_TABLE
        .iter()
        .find(|(code, _)| *code == key_code)
        .map(|(_, label)| *label)
}

/// Looks up a key by label, case-insensitive. Accepts a few common aliases
/// ("Enter", "Esc", "Backspace", "ArrowUp", "KeyA", "Digit1").
pub fn code_for_label(label: &str) -> Option<u32> {
    let label = label.trim();
    let canonical = match label.to_lowercase().as_str() {
        "enter" => "Return",
        "esc" => "Escape",
        "backspace" => "Delete",
        "arrowleft" => "Left",
        "arrowright" => "Right",
        "arrowup" => "Up",
        "arrowdown" => "Down",
        _ => label
            .strip_prefix("Key")
            .or_else(|| label.strip_prefix("Digit"))
            .filter(|rest| rest.chars().count() == 1)
            .unwrap_or(label),
    };

    KEY_TABLE
        .iter()
        .find(|(_, l)| l.eq_ignore_ascii_case(canonical))
        .map(|(code, _)| *code)
}

impl HotKey {
    /// Parses a shortcut string like "Cmd+Opt+K".
    ///
    /// Returns `None` if the string is empty, names an unknown key, or names
    /// more than one key. Modifiers are optional here; callers that need one
    /// check [`Modifiers::is_empty`].
    pub fn parse(shortcut: &str) -> Option<Self> {
        let shortcut = shortcut.trim();
        if shortcut.is_empty() {
            return None;
        }

        let mut modifiers = Modifiers::NONE;
        let mut key_part: Option<&str> = None;

        for part in shortcut.split('+') {
            let part = part.trim();
            match part.to_lowercase().as_str() {
                "cmd" | "command" | "super" | "meta" | "win" => modifiers |= Modifiers::COMMAND,
                "opt" | "option" | "alt" => modifiers |= Modifiers::OPTION,
                "shift" => modifiers |= Modifiers::SHIFT,
                "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
                _ => {
                    if key_part.is_some() {
                        return None;
                    }
                    key_part = Some(part);
                }
            }
        }

        let key_code = code_for_label(key_part?)?;
        Some(Self::new(key_code, modifiers))
    }
}

impl fmt::Display for HotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if self.modifiers.contains(Modifiers::COMMAND) {
            parts.push("Cmd".into());
        }
        if self.modifiers.contains(Modifiers::OPTION) {
            parts.push("Opt".into());
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("Shift".into());
        }
        if self.modifiers.contains(Modifiers::CONTROL) {
            parts.push("Ctrl".into());
        }

        match label_for(self.key_code) {
            Some(label) => parts.push(label.into()),
            None => parts.push(format!("Key {}", self.key_code)),
        }

        f.write_str(&parts.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_code(shortcut: &str) -> Option<u32> {
        HotKey::parse(shortcut).map(|hk| hk.key_code)
    }

    #[test]
    fn parse_letters_and_digits() {
        assert_eq!(parse_code("Cmd+A"), Some(0x00));
        assert_eq!(parse_code("Cmd+p"), Some(0x23));
        assert_eq!(parse_code("Cmd+KeyZ"), Some(0x06));
        assert_eq!(parse_code("Cmd+Digit5"), Some(0x17));
        assert_eq!(parse_code("Cmd+0"), Some(0x1D));
    }

    #[test]
    fn parse_special_keys() {
        assert_eq!(parse_code("Cmd+Space"), Some(49));
        assert_eq!(parse_code("Ctrl+Enter"), Some(0x24));
        assert_eq!(parse_code("Ctrl+Esc"), Some(0x35));
        assert_eq!(parse_code("Ctrl+ArrowUp"), Some(0x7E));
        assert_eq!(parse_code("Ctrl+Backspace"), Some(0x33));
    }

    #[test]
    fn parse_modifiers() {
        let hk = HotKey::parse("Ctrl+Alt+K").unwrap();
        assert_eq!(hk.modifiers, Modifiers::CONTROL | Modifiers::OPTION);

        let hk = HotKey::parse("command + shift + space").unwrap();
        assert_eq!(hk.modifiers, Modifiers::COMMAND | Modifiers::SHIFT);

        let hk = HotKey::parse("P").unwrap();
        assert!(hk.modifiers.is_empty());
    }

    #[test]
    fn parse_rejects_invalid() {
        assert!(HotKey::parse("").is_none());
        assert!(HotKey::parse("   ").is_none());
        assert!(HotKey::parse("Cmd+").is_none());
        assert!(HotKey::parse("Cmd+Shift").is_none());
        assert!(HotKey::parse("Cmd+A+B").is_none());
        assert!(HotKey::parse("Cmd+F13").is_none());
    }

    #[test]
    fn display_orders_modifiers() {
        let hk = HotKey::new(SPACE, Modifiers::SHIFT | Modifiers::COMMAND);
        assert_eq!(hk.to_string(), "Cmd+Shift+Space");

        let hk = HotKey::new(P, Modifiers::CONTROL | Modifiers::OPTION | Modifiers::COMMAND);
        assert_eq!(hk.to_string(), "Cmd+Opt+Ctrl+P");
    }

    #[test]
    fn display_unknown_key() {
        let hk = HotKey::new(0x60, Modifiers::COMMAND);
        assert_eq!(hk.to_string(), "Cmd+Key 96");
    }

    #[test]
    fn display_then_parse_is_stable() {
        for (code, _) in KEY_TABLE {
            let hk = HotKey::new(*code, Modifiers::COMMAND | Modifiers::OPTION);
            assert_eq!(HotKey::parse(&hk.to_string()), Some(hk));
        }
    }
}
