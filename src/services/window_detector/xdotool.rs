use super::command::run_tool;
use crate::error::{MacroError, Result};
use crate::events::{WindowId, WindowInfo};
use std::process::Command;
use tracing::debug;

pub struct XdotoolDetector;

impl XdotoolDetector {
    fn xdotool(args: &[&str]) -> Result<String> {
        run_tool("xdotool", Command::new("xdotool").args(args))
    }

    pub fn test(&self) -> Result<()> {
        self.active_window_id().map(|_| ())
    }

    pub fn active_window_id(&self) -> Result<WindowId> {
        let raw = Self::xdotool(&["getactivewindow"])?;
        if raw.is_empty() {
            return Err(MacroError::Internal("xdotool вернул пустой id окна".to_string()));
        }
        Ok(WindowId::new(raw))
    }

    pub fn active_window(&self) -> Result<WindowInfo> {
        let id = self.active_window_id()?;

        let title = Self::xdotool(&["getwindowname", id.as_str()])?;
        debug!("xdotool получил заголовок окна: '{}'", title);

        let class = match Self::xdotool(&["getwindowclassname", id.as_str()]) {
            Ok(class_name) => class_name,
            Err(_) => {
                debug!("Не удалось получить класс окна");
                "Unknown".to_string()
            }
        };

        Ok(WindowInfo::new(id, title).with_class(class))
    }
}
