use super::command::run_tool;
use crate::error::{MacroError, Result};
use crate::events::{WindowId, WindowInfo};
use serde_json::Value;
use std::process::Command;

pub struct SwayDetector;

impl SwayDetector {
    pub fn test(&self) -> Result<()> {
        self.active_window().map(|_| ())
    }

    pub fn active_window_id(&self) -> Result<WindowId> {
        self.active_window().map(|window| window.id)
    }

    pub fn active_window(&self) -> Result<WindowInfo> {
        let stdout = run_tool("swaymsg", Command::new("swaymsg").args(["-t", "get_tree"]))?;

        let tree: Value = serde_json::from_str(&stdout)
            .map_err(|e| MacroError::Internal(format!("swaymsg вернул некорректный JSON: {}", e)))?;

        find_focused(&tree)
            .ok_or_else(|| MacroError::Internal("Активное окно в Sway не найдено".to_string()))
    }
}

/// Найти сфокусированный узел дерева sway (обход в глубину)
fn find_focused(node: &Value) -> Option<WindowInfo> {
    if node.get("focused").and_then(Value::as_bool) == Some(true) {
        let id = node.get("id").and_then(Value::as_i64)?;
        let title = node
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let class = node
            .get("app_id")
            .and_then(Value::as_str)
            .or_else(|| {
                node.pointer("/window_properties/class")
                    .and_then(Value::as_str)
            })
            .unwrap_or_default()
            .to_string();

        return Some(WindowInfo::new(WindowId::new(id.to_string()), title).with_class(class));
    }

    ["nodes", "floating_nodes"]
        .iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_array))
        .flatten()
        .find_map(find_focused)
}
