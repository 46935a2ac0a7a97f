use crate::error::{MacroError, Result};
use crate::macro_error;
use crate::mappings::KeyNames;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Состояние клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyState {
    Pressed,
    Released,
    Repeat,
}

impl KeyState {
    /// Разбор поля `value` события EV_KEY
    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            0 => Some(KeyState::Released),
            1 => Some(KeyState::Pressed),
            2 => Some(KeyState::Repeat),
            _ => None,
        }
    }
}

/// Код клавиши (evdev коды)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub fn new(code: u16) -> Self {
        Self(code)
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match KeyNames::name_of(self.0) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "KEY_{}", self.0),
        }
    }
}

/// Модификаторы клавиш
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub super_key: bool,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ctrl(mut self, ctrl: bool) -> Self {
        self.ctrl = ctrl;
        self
    }

    pub fn with_shift(mut self, shift: bool) -> Self {
        self.shift = shift;
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.ctrl && !self.alt && !self.shift && !self.super_key
    }

    pub fn to_vec(&self) -> Vec<&'static str> {
        let mut result = Vec::new();
        if self.ctrl { result.push("ctrl"); }
        if self.alt { result.push("alt"); }
        if self.shift { result.push("shift"); }
        if self.super_key { result.push("super"); }
        result
    }

    /// Включить модификатор по имени; false если имя не является модификатором
    fn set_by_name(&mut self, name: &str) -> bool {
        match name {
            "ctrl" | "control" => self.ctrl = true,
            "alt" => self.alt = true,
            "shift" => self.shift = true,
            "super" | "meta" | "win" => self.super_key = true,
            _ => return false,
        }
        true
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = self.to_vec();
        if modifiers.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", modifiers.join("+"))
        }
    }
}

/// Комбинация для глобальной горячей клавиши, например `ctrl+q`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key_code: KeyCode,
}

impl Hotkey {
    pub fn new(key_code: KeyCode, modifiers: Modifiers) -> Self {
        Self { modifiers, key_code }
    }
}

impl FromStr for Hotkey {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        let mut modifiers = Modifiers::new();
        let mut key = None;

        for part in s.split('+').map(str::trim) {
            if part.is_empty() {
                return Err(macro_error!(invalid_key, "пустая часть в '{}'", s));
            }
            let lower = part.to_lowercase();
            if modifiers.set_by_name(&lower) {
                continue;
            }
            if key.is_some() {
                return Err(macro_error!(
                    invalid_key,
                    "в '{}' больше одной основной клавиши",
                    s
                ));
            }
            key = Some(KeyNames::code_of(&lower)?);
        }

        let key_code = key.ok_or_else(|| {
            macro_error!(invalid_key, "в '{}' нет основной клавиши", s)
        })?;

        Ok(Self::new(key_code, modifiers))
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.is_empty() {
            write!(f, "{}", self.key_code)
        } else {
            write!(f, "{}+{}", self.modifiers, self.key_code)
        }
    }
}

/// Событие клавиатуры
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
    pub modifiers: Modifiers,
    pub timestamp: std::time::Instant,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState, modifiers: Modifiers) -> Self {
        Self {
            key_code,
            state,
            modifiers,
            timestamp: std::time::Instant::now(),
        }
    }

    /// Комбинация, которую образует это событие
    pub fn hotkey(&self) -> Hotkey {
        Hotkey::new(self.key_code, self.modifiers)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:?} ({}ms ago)",
            self.hotkey(),
            self.state,
            self.timestamp.elapsed().as_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_creation() {
        let modifiers = Modifiers::new().with_ctrl(true).with_shift(true);

        assert!(modifiers.ctrl);
        assert!(modifiers.shift);
        assert!(!modifiers.alt);
        assert!(!modifiers.super_key);
        assert!(!modifiers.is_empty());
        assert_eq!(modifiers.to_string(), "ctrl+shift");
    }

    #[test]
    fn test_hotkey_parsing() {
        let quit: Hotkey = "ctrl+q".parse().unwrap();
        assert!(quit.modifiers.ctrl);
        assert_eq!(quit.key_code, KeyCode::new(16));

        let page_up: Hotkey = "PageUp".parse().unwrap();
        assert!(page_up.modifiers.is_empty());
        assert_eq!(page_up.key_code, KeyCode::new(104));

        let alias: Hotkey = " Ctrl + Esc ".parse().unwrap();
        assert_eq!(alias.key_code, KeyCode::new(1));
        assert_eq!(alias.to_string(), "ctrl+escape");
    }

    #[test]
    fn test_hotkey_parsing_errors() {
        for combo in ["ctrl", "ctrl++q", "q+w", "hyper+q"] {
            assert!(
                matches!(combo.parse::<Hotkey>(), Err(MacroError::InvalidKey(_))),
                "{} должна быть отвергнута",
                combo
            );
        }
    }

    #[test]
    fn test_key_event_hotkey() {
        let event = KeyEvent::new(
            KeyCode::new(16),
            KeyState::Pressed,
            Modifiers::new().with_ctrl(true),
        );
        assert_eq!(event.hotkey(), "ctrl+q".parse().unwrap());
        assert_eq!(KeyState::from_value(1), Some(KeyState::Pressed));
        assert_eq!(KeyState::from_value(7), None);
    }
}
