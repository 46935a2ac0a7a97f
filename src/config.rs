use crate::events::{ControlAction, Hotkey, KeyCode, Mode};
use crate::mappings::KeyNames;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Имя файла пользовательских настроек рядом с исполняемым файлом
pub const DEFAULT_PREFERENCES_FILE: &str = "auto_order_theme.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub dispatch: DispatchConfig,
    pub keys: KeysConfig,
    pub window: WindowConfig,
    pub hotkeys: HotkeysConfig,
    pub panel: PanelConfig,
    pub preferences: PreferencesConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub device_path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    pub tick_ms: u64,
    pub idle_ms: u64,
    pub min_cadence_secs: f64,
    pub max_cadence_secs: f64,
    pub default_cadence_secs: f64,
    pub cadence_step_secs: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeysConfig {
    /// Первая клавиша последовательности, общая для обоих режимов
    pub lead: String,
    pub coffee: String,
    pub pizza: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub detection_method: String,
    pub redetect_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeysConfig {
    pub set_target: String,
    pub start: String,
    pub pause: String,
    pub mode_coffee: String,
    pub mode_pizza: String,
    pub reset_counters: String,
    pub cadence_up: String,
    pub cadence_down: String,
    pub save_preferences: String,
    pub load_preferences: String,
    pub reset_preferences: String,
    pub quit: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PanelConfig {
    pub refresh_ms: u64,
    pub colored: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PreferencesConfig {
    /// Явный путь; по умолчанию файл лежит рядом с исполняемым файлом
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub autoload: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    pub enabled: bool,
    pub timeout_ms: i32,
}

/// Допустимый диапазон каденса и значение по умолчанию
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CadenceBounds {
    pub min_secs: f64,
    pub max_secs: f64,
    pub default_secs: f64,
}

impl CadenceBounds {
    /// Привести значение к [min, max]; NaN считается минимумом
    pub fn clamp(&self, secs: f64) -> f64 {
        if secs.is_nan() {
            return self.min_secs;
        }
        secs.clamp(self.min_secs, self.max_secs)
    }

    pub fn clamp_duration(&self, secs: f64) -> Duration {
        Duration::from_secs_f64(self.clamp(secs))
    }

    pub fn default_duration(&self) -> Duration {
        self.clamp_duration(self.default_secs)
    }
}

impl Default for CadenceBounds {
    fn default() -> Self {
        Self {
            min_secs: 0.1,
            max_secs: 60.0,
            default_secs: 5.0,
        }
    }
}

/// Коды клавиш, которые отправляет макрос
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroKeys {
    pub lead: KeyCode,
    pub coffee: KeyCode,
    pub pizza: KeyCode,
}

impl MacroKeys {
    /// Последовательность из двух нажатий для режима
    pub fn sequence(&self, mode: Mode) -> [KeyCode; 2] {
        match mode {
            Mode::Coffee => [self.lead, self.coffee],
            Mode::Pizza => [self.lead, self.pizza],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let cadence = CadenceBounds::default();
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            input: InputConfig {
                device_path: "auto".to_string(),
            },
            dispatch: DispatchConfig {
                tick_ms: 50,
                idle_ms: 100,
                min_cadence_secs: cadence.min_secs,
                max_cadence_secs: cadence.max_secs,
                default_cadence_secs: cadence.default_secs,
                cadence_step_secs: 0.5,
            },
            keys: KeysConfig {
                lead: "e".to_string(),
                coffee: "c".to_string(),
                pizza: "z".to_string(),
            },
            window: WindowConfig {
                detection_method: "auto".to_string(),
                redetect_interval_ms: 10_000,
            },
            hotkeys: HotkeysConfig {
                set_target: "f9".to_string(),
                start: "delete".to_string(),
                pause: "escape".to_string(),
                mode_coffee: "pageup".to_string(),
                mode_pizza: "pagedown".to_string(),
                reset_counters: "home".to_string(),
                cadence_up: "kpadd".to_string(),
                cadence_down: "kpsubtract".to_string(),
                save_preferences: "f10".to_string(),
                load_preferences: "f11".to_string(),
                reset_preferences: "f12".to_string(),
                quit: "ctrl+q".to_string(),
            },
            panel: PanelConfig {
                refresh_ms: 150,
                colored: false,
            },
            preferences: PreferencesConfig {
                path: None,
                autoload: true,
            },
            notifications: NotificationsConfig {
                enabled: false,
                timeout_ms: 3000,
            },
        }
    }
}

impl Config {
    /// Значения по умолчанию, затем TOML файл (если есть), затем переменные `AUTO_ORDER_*`
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("AUTO_ORDER_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация цикла отправки
        if self.dispatch.tick_ms == 0 {
            anyhow::bail!("tick_ms должно быть больше 0");
        }
        if self.dispatch.idle_ms == 0 {
            anyhow::bail!("idle_ms должно быть больше 0");
        }

        let cadence = &self.dispatch;
        if !(cadence.min_cadence_secs.is_finite() && cadence.min_cadence_secs > 0.0) {
            anyhow::bail!("min_cadence_secs должно быть положительным числом");
        }
        if !(cadence.max_cadence_secs.is_finite() && cadence.max_cadence_secs >= cadence.min_cadence_secs) {
            anyhow::bail!(
                "max_cadence_secs ({}) должно быть не меньше min_cadence_secs ({})",
                cadence.max_cadence_secs,
                cadence.min_cadence_secs
            );
        }
        if !(cadence.min_cadence_secs..=cadence.max_cadence_secs).contains(&cadence.default_cadence_secs) {
            anyhow::bail!(
                "default_cadence_secs ({}) вне диапазона [{}, {}]",
                cadence.default_cadence_secs,
                cadence.min_cadence_secs,
                cadence.max_cadence_secs
            );
        }
        if !(cadence.cadence_step_secs.is_finite() && cadence.cadence_step_secs > 0.0) {
            anyhow::bail!("cadence_step_secs должно быть положительным числом");
        }

        // Валидация клавиш макроса
        self.macro_keys()?;

        // Валидация настроек окон
        match self.window.detection_method.as_str() {
            "auto" | "kdotool" | "xdotool" | "wmctrl" | "sway" => {}
            _ => anyhow::bail!(
                "Неверный метод детекции окон: {}",
                self.window.detection_method
            ),
        }

        if self.panel.refresh_ms < 50 {
            anyhow::bail!("panel.refresh_ms должно быть минимум 50");
        }

        // Валидация горячих клавиш: каждая должна разбираться и быть уникальной
        self.hotkey_bindings()?;

        Ok(())
    }

    pub fn cadence_bounds(&self) -> CadenceBounds {
        CadenceBounds {
            min_secs: self.dispatch.min_cadence_secs,
            max_secs: self.dispatch.max_cadence_secs,
            default_secs: self.dispatch.default_cadence_secs,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.dispatch.tick_ms)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.dispatch.idle_ms)
    }

    pub fn macro_keys(&self) -> Result<MacroKeys> {
        let resolve = |field: &str, name: &str| {
            KeyNames::code_of(name)
                .map_err(|e| anyhow::anyhow!("Неверная клавиша keys.{}: {}", field, e))
        };

        Ok(MacroKeys {
            lead: resolve("lead", &self.keys.lead)?,
            coffee: resolve("coffee", &self.keys.coffee)?,
            pizza: resolve("pizza", &self.keys.pizza)?,
        })
    }

    /// Путь к файлу настроек: из конфигурации или рядом с исполняемым файлом
    pub fn preferences_path(&self) -> PathBuf {
        if let Some(path) = &self.preferences.path {
            return path.clone();
        }

        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_PREFERENCES_FILE)))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFERENCES_FILE))
    }

    /// Разобранные привязки горячих клавиш
    pub fn hotkey_bindings(&self) -> Result<Vec<(Hotkey, ControlAction)>> {
        let hotkeys = &self.hotkeys;
        let entries = [
            ("set_target", &hotkeys.set_target, ControlAction::SetTarget),
            ("start", &hotkeys.start, ControlAction::Start),
            ("pause", &hotkeys.pause, ControlAction::Pause),
            ("mode_coffee", &hotkeys.mode_coffee, ControlAction::SetMode(Mode::Coffee)),
            ("mode_pizza", &hotkeys.mode_pizza, ControlAction::SetMode(Mode::Pizza)),
            ("reset_counters", &hotkeys.reset_counters, ControlAction::ResetCounters),
            ("cadence_up", &hotkeys.cadence_up, ControlAction::CadenceUp),
            ("cadence_down", &hotkeys.cadence_down, ControlAction::CadenceDown),
            ("save_preferences", &hotkeys.save_preferences, ControlAction::SavePreferences),
            ("load_preferences", &hotkeys.load_preferences, ControlAction::LoadPreferences),
            ("reset_preferences", &hotkeys.reset_preferences, ControlAction::ResetPreferences),
            ("quit", &hotkeys.quit, ControlAction::Quit),
        ];

        let mut seen: HashMap<Hotkey, &str> = HashMap::new();
        let mut bindings = Vec::with_capacity(entries.len());

        for (field, combo, action) in entries {
            let hotkey: Hotkey = combo.parse().map_err(|e| {
                anyhow::anyhow!("Неверная горячая клавиша hotkeys.{} ('{}'): {}", field, combo, e)
            })?;

            if let Some(previous) = seen.insert(hotkey, field) {
                anyhow::bail!(
                    "Горячая клавиша '{}' назначена дважды: hotkeys.{} и hotkeys.{}",
                    hotkey,
                    previous,
                    field
                );
            }

            bindings.push((hotkey, action));
        }

        Ok(bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hotkey_bindings().unwrap().len(), 12);
    }

    #[test]
    fn test_cadence_bounds_clamp() {
        let bounds = CadenceBounds::default();

        assert_eq!(bounds.clamp(0.0), 0.1);
        assert_eq!(bounds.clamp(-3.0), 0.1);
        assert_eq!(bounds.clamp(f64::NAN), 0.1);
        assert_eq!(bounds.clamp(2.5), 2.5);
        assert_eq!(bounds.clamp(600.0), 60.0);
        assert_eq!(bounds.default_duration(), Duration::from_secs(5));
    }

    #[test]
    fn test_macro_key_sequences() {
        let keys = Config::default().macro_keys().unwrap();

        assert_eq!(keys.sequence(Mode::Coffee), [KeyCode::new(18), KeyCode::new(46)]);
        assert_eq!(keys.sequence(Mode::Pizza), [KeyCode::new(18), KeyCode::new(44)]);
    }

    #[test]
    fn test_duplicate_hotkeys_rejected() {
        let mut config = Config::default();
        config.hotkeys.pause = "Delete".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("hotkeys.start"), "{}", err);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.hotkeys.quit = "ctrl+nosuchkey".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dispatch.min_cadence_secs = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dispatch.default_cadence_secs = 120.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.detection_method = "dbus".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.keys.pizza = "pizza".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("auto-order.toml");
        fs::write(
            &path,
            "[dispatch]\ntick_ms = 25\n\n[hotkeys]\nquit = \"ctrl+shift+q\"\n",
        )
        .expect("Failed to write config");

        let config = Config::load(&path).unwrap();

        assert_eq!(config.dispatch.tick_ms, 25);
        assert_eq!(config.dispatch.idle_ms, 100);
        assert_eq!(config.hotkeys.quit, "ctrl+shift+q");
        assert_eq!(config.hotkeys.start, "delete");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.keys.lead, "e");
    }

    #[test]
    fn test_explicit_preferences_path() {
        let mut config = Config::default();
        config.preferences.path = Some(PathBuf::from("/tmp/prefs.toml"));
        assert_eq!(config.preferences_path(), PathBuf::from("/tmp/prefs.toml"));

        config.preferences.path = None;
        assert!(config.preferences_path().ends_with(DEFAULT_PREFERENCES_FILE));
    }
}
