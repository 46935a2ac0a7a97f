use super::command::run_tool;
use crate::error::{MacroError, Result};
use crate::events::{WindowId, WindowInfo};
use std::collections::HashMap;
use std::process::Command;
use tracing::debug;

/// Детектор для KWin (Wayland) через kdotool.
///
/// При запуске через sudo kdotool выполняется от имени исходного пользователя,
/// иначе он не видит его сессионную шину.
pub struct KdotoolDetector;

fn build_env_overrides() -> HashMap<String, String> {
    let mut env_vars = HashMap::new();

    if std::env::var("USER").unwrap_or_default() == "root" {
        if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            if let Ok(output) = Command::new("id").args(["-u", &sudo_user]).output() {
                if let Ok(uid_str) = String::from_utf8(output.stdout) {
                    let uid = uid_str.trim();
                    let user_runtime_dir = format!("/run/user/{}", uid);
                    let dbus_address = format!("unix:path={}/bus", user_runtime_dir);

                    debug!("Подставляем переменные окружения для пользователя {}: uid={}", sudo_user, uid);
                    env_vars.insert("DBUS_SESSION_BUS_ADDRESS".to_string(), dbus_address);
                    env_vars.insert("XDG_RUNTIME_DIR".to_string(), user_runtime_dir);
                    env_vars.insert("USER".to_string(), sudo_user);
                }
            }
        }
    }

    if let Ok(display_var) = std::env::var("DISPLAY") {
        env_vars.insert("DISPLAY".to_string(), display_var);
    }

    env_vars
}

impl KdotoolDetector {
    fn create_command(args: &[&str]) -> Command {
        let mut cmd = if let Ok(sudo_user) = std::env::var("SUDO_USER") {
            let mut cmd = Command::new("sudo");
            cmd.args(["-E", "-u", &sudo_user, "kdotool"]);
            cmd.args(args);
            cmd
        } else {
            let mut cmd = Command::new("kdotool");
            cmd.args(args);
            cmd
        };

        for (key, value) in build_env_overrides() {
            cmd.env(key, value);
        }

        cmd
    }

    fn kdotool(args: &[&str]) -> Result<String> {
        run_tool("kdotool", &mut Self::create_command(args))
    }

    pub fn test(&self) -> Result<()> {
        debug!("=== Тестируем kdotool ===");
        let id = self.active_window_id()?;
        Self::kdotool(&["getwindowname", id.as_str()])?;
        debug!("=== kdotool работает ===");
        Ok(())
    }

    pub fn active_window_id(&self) -> Result<WindowId> {
        let raw = Self::kdotool(&["getactivewindow"])?;
        if raw.is_empty() {
            return Err(MacroError::Internal("kdotool вернул пустой id окна".to_string()));
        }
        Ok(WindowId::new(raw))
    }

    pub fn active_window(&self) -> Result<WindowInfo> {
        let id = self.active_window_id()?;
        let title = Self::kdotool(&["getwindowname", id.as_str()])?;
        let class = Self::kdotool(&["getwindowclassname", id.as_str()])
            .unwrap_or_else(|_| "KDE".to_string());

        Ok(WindowInfo::new(id, title).with_class(class))
    }
}
