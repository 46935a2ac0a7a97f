use crate::error::{MacroError, Result};
use std::process::Command;
use tracing::debug;

/// Выполнить внешнюю утилиту и вернуть её stdout без пробелов по краям
pub(super) fn run_tool(tool: &str, command: &mut Command) -> Result<String> {
    let output = command.output().map_err(|e| {
        debug!("{} не найден или не работает: {}", tool, e);
        MacroError::ServiceUnavailable(format!("{} не найден: {}", tool, e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("{} вернул ошибку: {}", tool, stderr.trim());
        return Err(MacroError::Internal(format!(
            "{} вернул ошибку: {}",
            tool,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Привести идентификатор окна X11 к десятичному виду.
///
/// xdotool печатает десятичный id, xprop/wmctrl шестнадцатеричный; после
/// нормализации цель, выбранная одним методом, совпадает с окном из другого.
pub(super) fn normalize_x11_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let value = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => raw.parse::<u64>().ok()?,
    };
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_x11_id() {
        assert_eq!(normalize_x11_id("0x03a00007").as_deref(), Some("60817415"));
        assert_eq!(normalize_x11_id("60817415\n").as_deref(), Some("60817415"));
        assert_eq!(normalize_x11_id("window"), None);
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let result = run_tool(
            "no-such-tool",
            &mut Command::new("/nonexistent/auto-order-no-such-tool"),
        );
        assert!(matches!(result, Err(MacroError::ServiceUnavailable(_))));
    }
}
