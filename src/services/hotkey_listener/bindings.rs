use crate::config::Config;
use crate::error::Result;
use crate::events::{ControlAction, Hotkey, KeyEvent, KeyState};
use std::collections::HashMap;

/// Таблица «комбинация → действие»
#[derive(Debug, Clone, Default)]
pub struct HotkeyBindings {
    bindings: HashMap<Hotkey, ControlAction>,
}

impl HotkeyBindings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            bindings: config.hotkey_bindings()?.into_iter().collect(),
        })
    }

    /// Действие для события; срабатывает только на нажатие, без повторов.
    /// Модификаторы должны совпадать точно: `q` не вызывает `ctrl+q`.
    pub fn action_for(&self, event: &KeyEvent) -> Option<ControlAction> {
        if event.state != KeyState::Pressed {
            return None;
        }
        self.bindings.get(&event.hotkey()).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Hotkey, &ControlAction)> {
        self.bindings.iter()
    }
}
