use crate::config::Config;
use crate::error::{MacroError, Result};
use crate::events::{WindowId, WindowInfo};
use parking_lot::Mutex;
use std::process::Command;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::kdotool::KdotoolDetector;
use super::r#trait::ForegroundWindow;
use super::sway::SwayDetector;
use super::wmctrl::WmctrlDetector;
use super::xdotool::XdotoolDetector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DesktopEnvironment {
    KDE,
    GNOME,
    X11Generic,
    WaylandGeneric,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkingMethod {
    Kdotool,
    Xdotool,
    Wmctrl,
    Sway,
}

impl WorkingMethod {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "kdotool" => Some(WorkingMethod::Kdotool),
            "xdotool" => Some(WorkingMethod::Xdotool),
            "wmctrl" => Some(WorkingMethod::Wmctrl),
            "sway" => Some(WorkingMethod::Sway),
            _ => None,
        }
    }

    fn test(self) -> Result<()> {
        match self {
            WorkingMethod::Kdotool => KdotoolDetector.test(),
            WorkingMethod::Xdotool => XdotoolDetector.test(),
            WorkingMethod::Wmctrl => WmctrlDetector.test(),
            WorkingMethod::Sway => SwayDetector.test(),
        }
    }

    fn active_window_id(self) -> Result<WindowId> {
        match self {
            WorkingMethod::Kdotool => KdotoolDetector.active_window_id(),
            WorkingMethod::Xdotool => XdotoolDetector.active_window_id(),
            WorkingMethod::Wmctrl => WmctrlDetector.active_window_id(),
            WorkingMethod::Sway => SwayDetector.active_window_id(),
        }
    }

    fn active_window(self) -> Result<WindowInfo> {
        match self {
            WorkingMethod::Kdotool => KdotoolDetector.active_window(),
            WorkingMethod::Xdotool => XdotoolDetector.active_window(),
            WorkingMethod::Wmctrl => WmctrlDetector.active_window(),
            WorkingMethod::Sway => SwayDetector.active_window(),
        }
    }
}

impl DesktopEnvironment {
    /// Порядок проверки утилит для данной среды
    fn probe_order(self) -> [WorkingMethod; 4] {
        use WorkingMethod::*;
        match self {
            DesktopEnvironment::KDE => [Kdotool, Xdotool, Wmctrl, Sway],
            DesktopEnvironment::WaylandGeneric => [Sway, Kdotool, Xdotool, Wmctrl],
            DesktopEnvironment::GNOME
            | DesktopEnvironment::X11Generic
            | DesktopEnvironment::Unknown => [Xdotool, Wmctrl, Kdotool, Sway],
        }
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    method: Option<WorkingMethod>,
    last_probe: Option<Instant>,
}

pub struct RealWindowDetector {
    desktop_env: DesktopEnvironment,
    // Метод из конфигурации; None означает автоопределение
    fixed_method: Option<WorkingMethod>,
    redetect_interval: Duration,
    probe: Mutex<ProbeState>,
}

impl RealWindowDetector {
    pub fn new(config: &Config) -> Result<Self> {
        info!("Инициализация RealWindowDetector");

        let desktop_env = Self::detect_desktop_environment();
        info!("Обнаружена среда рабочего стола: {:?}", desktop_env);

        let fixed_method = match config.window.detection_method.as_str() {
            "auto" => None,
            name => Some(WorkingMethod::from_name(name).ok_or_else(|| {
                crate::macro_error!(service_unavailable, "Неизвестный метод детекции: {}", name)
            })?),
        };

        Ok(Self {
            desktop_env,
            fixed_method,
            redetect_interval: Duration::from_millis(config.window.redetect_interval_ms),
            probe: Mutex::new(ProbeState {
                method: fixed_method,
                last_probe: None,
            }),
        })
    }

    fn detect_desktop_environment() -> DesktopEnvironment {
        if let Ok(desktop) = std::env::var("XDG_CURRENT_DESKTOP") {
            match desktop.to_lowercase().as_str() {
                d if d.contains("kde") => return DesktopEnvironment::KDE,
                d if d.contains("gnome") => return DesktopEnvironment::GNOME,
                _ => {}
            }
        }

        if let Ok(session) = std::env::var("XDG_SESSION_TYPE") {
            match session.as_str() {
                "wayland" => return DesktopEnvironment::WaylandGeneric,
                "x11" => return DesktopEnvironment::X11Generic,
                _ => {}
            }
        }

        if let Ok(output) = Command::new("pgrep").arg("-f").arg("kwin").output() {
            if !output.stdout.is_empty() {
                return DesktopEnvironment::KDE;
            }
        }

        DesktopEnvironment::Unknown
    }

    /// Перебрать утилиты и запомнить первую работающую.
    ///
    /// Проверка запускает внешние процессы, поэтому повторяется не чаще
    /// одного раза в `redetect_interval`.
    async fn detect_working_method(&self) -> Result<WorkingMethod> {
        {
            let mut probe = self.probe.lock();
            if let Some(method) = probe.method {
                return Ok(method);
            }
            if let Some(last) = probe.last_probe {
                if last.elapsed() < self.redetect_interval {
                    return Err(MacroError::ServiceUnavailable(
                        "Ни один метод детекции окон не работает".to_string(),
                    ));
                }
            }
            probe.last_probe = Some(Instant::now());
        }

        info!("Определяем рабочий метод детекции окон...");
        let order = self.desktop_env.probe_order();
        let found = tokio::task::spawn_blocking(move || {
            order.into_iter().find(|method| match method.test() {
                Ok(()) => true,
                Err(e) => {
                    debug!("Метод {:?} не работает: {}", method, e);
                    false
                }
            })
        })
        .await
        .map_err(|e| MacroError::Internal(format!("Проверка методов прервана: {}", e)))?;

        match found {
            Some(method) => {
                info!("Используем {:?}", method);
                self.probe.lock().method = Some(method);
                Ok(method)
            }
            None => {
                warn!(
                    "Ни один метод детекции окон не работает, повтор через {:?}",
                    self.redetect_interval
                );
                Err(MacroError::ServiceUnavailable(
                    "Ни один метод детекции окон не работает".to_string(),
                ))
            }
        }
    }

    /// Выполнить запрос выбранным методом; при ошибке автоопределённый метод сбрасывается
    async fn query<T, F>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(WorkingMethod) -> Result<T> + Send + 'static,
    {
        let method = self.detect_working_method().await?;

        let result = tokio::task::spawn_blocking(move || call(method))
            .await
            .map_err(|e| MacroError::Internal(format!("Запрос окна прерван: {}", e)))?;

        if let Err(e) = &result {
            if self.fixed_method.is_none() {
                warn!("Рабочий метод {:?} перестал работать: {}. Переопределяем...", method, e);
                self.probe.lock().method = None;
            }
        }

        result
    }
}

#[async_trait::async_trait]
impl ForegroundWindow for RealWindowDetector {
    async fn foreground_window_id(&self) -> Result<WindowId> {
        self.query(WorkingMethod::active_window_id).await
    }

    async fn foreground_window(&self) -> Result<WindowInfo> {
        self.query(WorkingMethod::active_window).await
    }
}

impl Drop for RealWindowDetector {
    fn drop(&mut self) {
        info!("RealWindowDetector завершает работу");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(WorkingMethod::from_name("kdotool"), Some(WorkingMethod::Kdotool));
        assert_eq!(WorkingMethod::from_name("sway"), Some(WorkingMethod::Sway));
        assert_eq!(WorkingMethod::from_name("auto"), None);
    }

    #[test]
    fn test_probe_order_prefers_native_tool() {
        assert_eq!(DesktopEnvironment::KDE.probe_order()[0], WorkingMethod::Kdotool);
        assert_eq!(DesktopEnvironment::WaylandGeneric.probe_order()[0], WorkingMethod::Sway);
        assert_eq!(DesktopEnvironment::X11Generic.probe_order()[0], WorkingMethod::Xdotool);
    }

    #[test]
    fn test_fixed_method_from_config() {
        let mut config = Config::default();
        config.window.detection_method = "wmctrl".to_string();

        let detector = RealWindowDetector::new(&config).unwrap();
        assert_eq!(detector.fixed_method, Some(WorkingMethod::Wmctrl));
        assert_eq!(detector.probe.lock().method, Some(WorkingMethod::Wmctrl));
    }
}
