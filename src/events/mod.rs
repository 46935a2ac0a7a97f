pub mod action;
pub mod dispatch;
pub mod keyboard;
pub mod window;

pub use action::ControlAction;
pub use dispatch::{DispatchEvent, Mode};
pub use keyboard::{Hotkey, KeyCode, KeyEvent, KeyState, Modifiers};
pub use window::{WindowId, WindowInfo};

/// События для виртуальной клавиатуры
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualKeyEvent {
    pub key_code: KeyCode,
    pub state: KeyState,
}

impl VirtualKeyEvent {
    pub fn new(key_code: KeyCode, state: KeyState) -> Self {
        Self { key_code, state }
    }

    pub fn press(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Pressed)
    }

    pub fn release(key_code: KeyCode) -> Self {
        Self::new(key_code, KeyState::Released)
    }

    /// Значение поля `value` для события EV_KEY
    pub fn value(&self) -> i32 {
        match self.state {
            KeyState::Pressed => 1,
            KeyState::Released => 0,
            KeyState::Repeat => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_event_values() {
        let code = KeyCode::new(18);
        assert_eq!(VirtualKeyEvent::press(code).value(), 1);
        assert_eq!(VirtualKeyEvent::release(code).value(), 0);
        assert_eq!(VirtualKeyEvent::new(code, KeyState::Repeat).value(), 2);
    }
}
