use super::command::{normalize_x11_id, run_tool};
use crate::error::Result;
use crate::macro_error;
use crate::events::{WindowId, WindowInfo};
use std::process::Command;

/// Активное окно через `_NET_ACTIVE_WINDOW` корневого окна, заголовок через `wmctrl -l`
pub struct WmctrlDetector;

impl WmctrlDetector {
    pub fn test(&self) -> Result<()> {
        run_tool("wmctrl", Command::new("wmctrl").arg("-l"))?;
        self.active_window_id().map(|_| ())
    }

    pub fn active_window_id(&self) -> Result<WindowId> {
        let output = run_tool(
            "xprop",
            Command::new("xprop").args(["-root", "_NET_ACTIVE_WINDOW"]),
        )?;

        parse_active_window(&output)
            .ok_or_else(|| macro_error!(internal, "Активное окно не найдено"))
    }

    pub fn active_window(&self) -> Result<WindowInfo> {
        let id = self.active_window_id()?;
        let listing = run_tool("wmctrl", Command::new("wmctrl").arg("-l"))?;
        let title = find_title(&listing, &id).unwrap_or_default();
        Ok(WindowInfo::new(id, title))
    }
}

/// `_NET_ACTIVE_WINDOW(WINDOW): window id # 0x3a00007`
fn parse_active_window(output: &str) -> Option<WindowId> {
    let raw = output.rsplit('#').next()?.split(',').next()?;
    let id = normalize_x11_id(raw)?;
    // 0x0 означает, что активного окна нет
    (id != "0").then(|| WindowId::new(id))
}

/// Строка `wmctrl -l`: `0x03a00007  0 host Заголовок окна`
fn find_title(listing: &str, id: &WindowId) -> Option<String> {
    listing.lines().find_map(|line| {
        // id, рабочий стол, хост и хотя бы одно слово заголовка
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return None;
        }
        if normalize_x11_id(parts[0]).as_deref() != Some(id.as_str()) {
            return None;
        }
        Some(parts[3..].join(" "))
    })
}
