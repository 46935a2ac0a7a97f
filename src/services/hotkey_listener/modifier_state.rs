use crate::events::Modifiers;
use evdev::KeyCode;

/// Текущее состояние модификаторов физической клавиатуры
#[derive(Debug, Default)]
pub struct ModifierState {
    ctrl: bool,
    alt: bool,
    shift: bool,
    super_key: bool,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl,
            alt: self.alt,
            shift: self.shift,
            super_key: self.super_key,
        }
    }

    /// Обновить состояние; возвращает true, если клавиша была модификатором
    pub fn update_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        match key {
            KeyCode::KEY_LEFTCTRL | KeyCode::KEY_RIGHTCTRL => self.ctrl = pressed,
            KeyCode::KEY_LEFTALT | KeyCode::KEY_RIGHTALT => self.alt = pressed,
            KeyCode::KEY_LEFTSHIFT | KeyCode::KEY_RIGHTSHIFT => self.shift = pressed,
            KeyCode::KEY_LEFTMETA | KeyCode::KEY_RIGHTMETA => self.super_key = pressed,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_tracking() {
        let mut state = ModifierState::new();

        assert!(state.update_key(KeyCode::KEY_RIGHTCTRL, true));
        assert!(!state.update_key(KeyCode::KEY_Q, true));
        assert!(state.to_modifiers().ctrl);

        state.update_key(KeyCode::KEY_RIGHTCTRL, false);
        assert!(state.to_modifiers().is_empty());
    }
}
