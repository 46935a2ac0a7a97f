use crate::events::Mode;
use std::fmt;

/// Действие пользователя над состоянием макроса.
///
/// Приходит от глобальных горячих клавиш; вся логика исполнения живёт в `Controller`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    SetTarget,
    Start,
    Pause,
    SetMode(Mode),
    ResetCounters,
    CadenceUp,
    CadenceDown,
    SavePreferences,
    LoadPreferences,
    ResetPreferences,
    Quit,
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAction::SetTarget => write!(f, "set-target"),
            ControlAction::Start => write!(f, "start"),
            ControlAction::Pause => write!(f, "pause"),
            ControlAction::SetMode(mode) => write!(f, "mode-{}", mode),
            ControlAction::ResetCounters => write!(f, "reset-counters"),
            ControlAction::CadenceUp => write!(f, "cadence-up"),
            ControlAction::CadenceDown => write!(f, "cadence-down"),
            ControlAction::SavePreferences => write!(f, "save-preferences"),
            ControlAction::LoadPreferences => write!(f, "load-preferences"),
            ControlAction::ResetPreferences => write!(f, "reset-preferences"),
            ControlAction::Quit => write!(f, "quit"),
        }
    }
}
