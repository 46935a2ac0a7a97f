use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::time::Instant;

/// Режим макроса: какая пара клавиш отправляется
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// E → C
    Coffee,
    /// E → Z
    Pizza,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Coffee => "COFFEE (E → C)",
            Mode::Pizza => "PIZZA (E → Z)",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Coffee => write!(f, "coffee"),
            Mode::Pizza => write!(f, "pizza"),
        }
    }
}

/// Одно срабатывание макроса; не сохраняется, нужно только для счётчиков
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchEvent {
    pub mode: Mode,
    pub timestamp: Instant,
}

impl DispatchEvent {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            timestamp: Instant::now(),
        }
    }
}
