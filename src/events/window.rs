use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный идентификатор окна, выданный детектором
///
/// Формат зависит от инструмента (десятичный id X11, uuid KWin, id узла sway),
/// поэтому сравнивается только на равенство.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(String);

impl WindowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Информация об окне
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub class: String,
}

impl WindowInfo {
    pub fn new(id: WindowId, title: String) -> Self {
        Self {
            id,
            title,
            class: String::new(),
        }
    }

    pub fn with_class(mut self, class: String) -> Self {
        self.class = class;
        self
    }

    /// Это то же самое окно (сравнение только по идентификатору)
    pub fn same_window(&self, other: &WindowInfo) -> bool {
        self.id == other.id
    }

    /// Заголовок для отображения в панели состояния
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(untitled)"
        } else {
            &self.title
        }
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.class.is_empty() {
            write!(f, "\"{}\" [{}]", self.display_title(), self.id)
        } else {
            write!(f, "\"{}\" ({}) [{}]", self.display_title(), self.class, self.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_info_creation() {
        let window = WindowInfo::new(WindowId::new("0x3a00007"), "Test Window".to_string())
            .with_class("TestApp".to_string());

        assert_eq!(window.title, "Test Window");
        assert_eq!(window.class, "TestApp");
        assert_eq!(window.id.as_str(), "0x3a00007");
        assert_eq!(window.to_string(), "\"Test Window\" (TestApp) [0x3a00007]");
    }

    #[test]
    fn test_same_window_ignores_title() {
        let before = WindowInfo::new(WindowId::new("42"), "Game - menu".to_string());
        let after = WindowInfo::new(WindowId::new("42"), "Game - level 2".to_string());
        let other = WindowInfo::new(WindowId::new("43"), "Game - menu".to_string());

        assert!(before.same_window(&after));
        assert!(!before.same_window(&other));
    }

    #[test]
    fn test_untitled_window() {
        let window = WindowInfo::new(WindowId::new("7"), String::new());
        assert_eq!(window.display_title(), "(untitled)");
    }
}
