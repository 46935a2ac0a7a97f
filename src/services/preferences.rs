use crate::config::CadenceBounds;
use crate::error::{MacroError, Result};
use crate::macro_error;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use toml::{Table, Value};
use tracing::{debug, info, warn};

/// Цвета панели состояния
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub window_bg: String,
    pub text: String,
    pub button_active_bg: String,
    pub button_inactive_bg: String,
    pub counter_bg: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            window_bg: "#0f172a".to_string(),
            text: "#e2e8f0".to_string(),
            button_active_bg: "#16a34a".to_string(),
            button_inactive_bg: "#334155".to_string(),
            counter_bg: "#1f2937".to_string(),
        }
    }
}

impl Theme {
    /// `#rgb` или `#rrggbb`
    pub fn is_valid_color(value: &str) -> bool {
        match value.strip_prefix('#') {
            Some(hex) => {
                matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        }
    }

    /// Заменить один цвет по имени поля
    pub fn set_color(&mut self, name: &str, value: &str) -> Result<()> {
        if !Self::is_valid_color(value) {
            return Err(macro_error!(preferences, "Некорректный цвет '{}' для {}", value, name));
        }
        let field = self.field_mut(name).ok_or_else(|| {
            macro_error!(
                preferences,
                "Неизвестный цвет '{}', допустимы: {}",
                name,
                Self::FIELDS.join(", ")
            )
        })?;
        *field = value.to_string();
        Ok(())
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "window_bg" => Some(&mut self.window_bg),
            "text" => Some(&mut self.text),
            "button_active_bg" => Some(&mut self.button_active_bg),
            "button_inactive_bg" => Some(&mut self.button_inactive_bg),
            "counter_bg" => Some(&mut self.counter_bg),
            _ => None,
        }
    }

    const FIELDS: [&'static str; 5] = [
        "window_bg",
        "text",
        "button_active_bg",
        "button_inactive_bg",
        "counter_bg",
    ];
}

/// Цвет из командной строки: `window_bg=#123456`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorOverride {
    pub name: String,
    pub value: String,
}

impl FromStr for ColorOverride {
    type Err = MacroError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| macro_error!(preferences, "ожидается ИМЯ=#RRGGBB, получено '{}'", s))?;
        let (name, value) = (name.trim(), value.trim());

        Theme::default().set_color(name, value)?;
        Ok(Self {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

/// Содержимое файла настроек
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preferences {
    // Простые значения до таблиц: иначе TOML не сериализуется
    pub cadence_seconds: f64,
    pub colors: Theme,
}

/// Чем закончилась загрузка файла настроек
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Файл прочитан; перечислены поля, заменённые значениями по умолчанию
    Loaded { defaulted: Vec<String> },
    NotFound,
    /// Файл не читается или не является TOML; применены значения по умолчанию
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub preferences: Preferences,
    pub status: LoadStatus,
}

/// Файл настроек пользователя: тема панели и каденс
pub struct PreferenceStore {
    path: PathBuf,
    bounds: CadenceBounds,
}

impl PreferenceStore {
    pub fn new(path: PathBuf, bounds: CadenceBounds) -> Self {
        Self { path, bounds }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn defaults(&self) -> Preferences {
        Preferences {
            cadence_seconds: self.bounds.clamp(self.bounds.default_secs),
            colors: Theme::default(),
        }
    }

    /// Загрузка никогда не падает: всё, что не удалось прочитать, берётся по умолчанию
    pub fn load(&self) -> LoadOutcome {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Файл настроек {:?} не найден", self.path);
                return LoadOutcome {
                    preferences: self.defaults(),
                    status: LoadStatus::NotFound,
                };
            }
            Err(e) => {
                warn!("Не удалось прочитать {:?}: {}", self.path, e);
                return LoadOutcome {
                    preferences: self.defaults(),
                    status: LoadStatus::Invalid(e.to_string()),
                };
            }
        };

        let outcome = self.parse(&text);
        match &outcome.status {
            LoadStatus::Loaded { defaulted } if !defaulted.is_empty() => {
                warn!(
                    "Настройки загружены из {:?}, по умолчанию: {}",
                    self.path,
                    defaulted.join(", ")
                );
            }
            LoadStatus::Loaded { .. } => info!("Настройки загружены из {:?}", self.path),
            LoadStatus::Invalid(reason) => {
                warn!("Файл настроек {:?} повреждён: {}", self.path, reason)
            }
            LoadStatus::NotFound => {}
        }
        outcome
    }

    /// Разбор по полям: неверное поле не отменяет остальные
    pub fn parse(&self, text: &str) -> LoadOutcome {
        let table: Table = match text.parse() {
            Ok(table) => table,
            Err(e) => {
                return LoadOutcome {
                    preferences: self.defaults(),
                    status: LoadStatus::Invalid(e.to_string()),
                };
            }
        };

        let mut preferences = self.defaults();
        let mut defaulted = Vec::new();

        match table.get("cadence_seconds") {
            Some(Value::Float(secs)) => preferences.cadence_seconds = self.bounds.clamp(*secs),
            Some(Value::Integer(secs)) => {
                preferences.cadence_seconds = self.bounds.clamp(*secs as f64)
            }
            _ => defaulted.push("cadence_seconds".to_string()),
        }

        let colors = table.get("colors").and_then(Value::as_table);
        for name in Theme::FIELDS {
            let value = colors
                .and_then(|colors| colors.get(name))
                .and_then(Value::as_str)
                .filter(|value| Theme::is_valid_color(value));

            match (value, preferences.colors.field_mut(name)) {
                (Some(value), Some(field)) => *field = value.to_string(),
                _ => defaulted.push(format!("colors.{}", name)),
            }
        }

        LoadOutcome {
            preferences,
            status: LoadStatus::Loaded { defaulted },
        }
    }

    /// Атомарная запись: временный файл рядом и rename
    pub fn save(&self, preferences: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let text = toml::to_string_pretty(preferences)
            .map_err(|e| macro_error!(preferences, "Ошибка сериализации: {}", e))?;

        let tmp_path = self.path.with_extension("toml.tmp");
        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;

        info!("Настройки сохранены в {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> PreferenceStore {
        PreferenceStore::new(dir.path().join("prefs.toml"), CadenceBounds::default())
    }

    #[test]
    fn test_color_validation() {
        assert!(Theme::is_valid_color("#fff"));
        assert!(Theme::is_valid_color("#16A34a"));
        assert!(!Theme::is_valid_color("16a34a"));
        assert!(!Theme::is_valid_color("#16a34"));
        assert!(!Theme::is_valid_color("#ggg"));
        assert!(!Theme::is_valid_color(""));
    }

    #[test]
    fn test_set_color_checks_name_and_value() {
        let mut theme = Theme::default();

        theme.set_color("counter_bg", "#123456").unwrap();
        assert_eq!(theme.counter_bg, "#123456");

        assert!(matches!(theme.set_color("border", "#123456"), Err(MacroError::Preferences(_))));
        assert!(matches!(theme.set_color("text", "blue"), Err(MacroError::Preferences(_))));
        assert_eq!(theme.text, Theme::default().text);
    }

    #[test]
    fn test_color_override_parsing() {
        let color: ColorOverride = "window_bg=#123456".parse().unwrap();
        assert_eq!(color.name, "window_bg");
        assert_eq!(color.value, "#123456");

        let spaced: ColorOverride = " text = #fff ".parse().unwrap();
        assert_eq!(spaced.name, "text");
        assert_eq!(spaced.value, "#fff");

        assert!("window_bg".parse::<ColorOverride>().is_err());
        assert!("window_bg=123456".parse::<ColorOverride>().is_err());
        assert!("title_bg=#123456".parse::<ColorOverride>().is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let outcome = store.load();
        assert_eq!(outcome.status, LoadStatus::NotFound);
        assert_eq!(outcome.preferences, store.defaults());
        assert_eq!(outcome.preferences.cadence_seconds, 5.0);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "cadence_seconds = [1, \n").unwrap();

        let outcome = store.load();
        assert!(matches!(outcome.status, LoadStatus::Invalid(_)));
        assert_eq!(outcome.preferences, store.defaults());
    }

    #[test]
    fn test_missing_cadence_keeps_colors() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            "[colors]\nwindow_bg = \"#000000\"\ntext = \"#fff\"\n",
        )
        .unwrap();

        let outcome = store.load();
        let prefs = outcome.preferences;
        assert_eq!(prefs.cadence_seconds, 5.0);
        assert_eq!(prefs.colors.window_bg, "#000000");
        assert_eq!(prefs.colors.text, "#fff");
        assert_eq!(prefs.colors.counter_bg, Theme::default().counter_bg);

        match outcome.status {
            LoadStatus::Loaded { defaulted } => {
                assert!(defaulted.contains(&"cadence_seconds".to_string()));
                assert!(defaulted.contains(&"colors.counter_bg".to_string()));
                assert!(!defaulted.contains(&"colors.text".to_string()));
            }
            other => panic!("unexpected status {:?}", other),
        }
    }

    #[test]
    fn test_invalid_fields_fall_back_individually() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let outcome = store.parse(
            "cadence_seconds = \"fast\"\n[colors]\nwindow_bg = \"red\"\ncounter_bg = \"#123456\"\ntext = 12\n",
        );
        let prefs = outcome.preferences;
        assert_eq!(prefs.cadence_seconds, 5.0);
        assert_eq!(prefs.colors.window_bg, Theme::default().window_bg);
        assert_eq!(prefs.colors.text, Theme::default().text);
        assert_eq!(prefs.colors.counter_bg, "#123456");
    }

    #[test]
    fn test_cadence_is_clamped_and_integer_accepted() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.parse("cadence_seconds = 0.01").preferences.cadence_seconds, 0.1);
        assert_eq!(store.parse("cadence_seconds = 500").preferences.cadence_seconds, 60.0);
        assert_eq!(store.parse("cadence_seconds = 3").preferences.cadence_seconds, 3.0);
    }

    #[test]
    fn test_save_then_load_restores_preferences() {
        let dir = TempDir::new().unwrap();
        let store = PreferenceStore::new(
            dir.path().join("nested").join("prefs.toml"),
            CadenceBounds::default(),
        );
        let prefs = Preferences {
            cadence_seconds: 2.5,
            colors: Theme {
                button_active_bg: "#abc".to_string(),
                ..Theme::default()
            },
        };

        store.save(&prefs).unwrap();
        assert!(!store.path().with_extension("toml.tmp").exists());

        let outcome = store.load();
        assert_eq!(outcome.status, LoadStatus::Loaded { defaulted: vec![] });
        assert_eq!(outcome.preferences, prefs);
    }
}
