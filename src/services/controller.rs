use crate::config::{Config, MacroKeys};
use crate::error::Result;
use crate::events::ControlAction;
use crate::services::control_state::{SharedControl, StartOutcome};
use crate::services::dispatcher::Dispatcher;
use crate::services::notifier::Notifier;
use crate::services::preferences::{LoadStatus, PreferenceStore, Preferences, Theme};
use crate::services::virtual_device::KeyEmitter;
use crate::services::window_detector::ForegroundWindow;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Управляющий поток: единственный исполнитель команд горячих клавиш.
///
/// Владеет запуском цикла отправки (не более одного на процесс), файлом
/// настроек и темой панели.
pub struct Controller {
    control: SharedControl,
    foreground: Arc<dyn ForegroundWindow>,
    emitter: Arc<dyn KeyEmitter>,
    keys: MacroKeys,
    tick: Duration,
    idle: Duration,
    cadence_step: f64,
    store: PreferenceStore,
    theme: Arc<RwLock<Theme>>,
    notifier: Notifier,
    dispatch_handle: Mutex<Option<JoinHandle<()>>>,
    launches: AtomicUsize,
}

impl Controller {
    pub fn new(
        config: &Config,
        control: SharedControl,
        foreground: Arc<dyn ForegroundWindow>,
        emitter: Arc<dyn KeyEmitter>,
        store: PreferenceStore,
        notifier: Notifier,
    ) -> Result<Self> {
        Ok(Self {
            control,
            foreground,
            emitter,
            keys: config.macro_keys()?,
            tick: config.tick(),
            idle: config.idle(),
            cadence_step: config.dispatch.cadence_step_secs,
            store,
            theme: Arc::new(RwLock::new(Theme::default())),
            notifier,
            dispatch_handle: Mutex::new(None),
            launches: AtomicUsize::new(0),
        })
    }

    pub fn control(&self) -> &SharedControl {
        &self.control
    }

    /// Тема, общая с панелью состояния
    pub fn theme(&self) -> Arc<RwLock<Theme>> {
        self.theme.clone()
    }

    pub fn keys(&self) -> MacroKeys {
        self.keys
    }

    /// Сколько раз запускался цикл отправки (0 или 1)
    pub fn dispatch_launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Обрабатывает команды до Quit или закрытия канала
    pub async fn run(self: Arc<Self>, mut actions: UnboundedReceiver<ControlAction>, quit: Arc<Notify>) {
        info!("Управляющий поток запущен");

        while let Some(action) = actions.recv().await {
            if !self.apply(action).await {
                break;
            }
        }

        info!("Управляющий поток завершён");
        quit.notify_one();
    }

    /// Выполнить команду; false означает выход из приложения
    pub async fn apply(&self, action: ControlAction) -> bool {
        debug!("Команда: {}", action);

        match action {
            ControlAction::SetTarget => self.capture_target().await,
            ControlAction::Start => self.start(),
            ControlAction::Pause => self.control.pause(),
            ControlAction::SetMode(mode) => self.control.set_mode(mode),
            ControlAction::ResetCounters => self.control.reset_counters(),
            ControlAction::CadenceUp => {
                self.control.adjust_cadence(self.cadence_step);
            }
            ControlAction::CadenceDown => {
                self.control.adjust_cadence(-self.cadence_step);
            }
            ControlAction::SavePreferences => self.save_preferences().await,
            ControlAction::LoadPreferences => self.load_preferences(true).await,
            ControlAction::ResetPreferences => self.reset_preferences().await,
            ControlAction::Quit => {
                info!("Получена команда выхода");
                return false;
            }
        }
        true
    }

    async fn capture_target(&self) {
        match self.foreground.foreground_window().await {
            Ok(window) => self.control.set_target(window),
            Err(e) => warn!("Не удалось определить активное окно, цель не изменена: {}", e),
        }
    }

    fn start(&self) {
        if self.control.start() != StartOutcome::LaunchLoop {
            return;
        }

        let dispatcher = Dispatcher::new(
            self.control.clone(),
            self.foreground.clone(),
            self.emitter.clone(),
            self.keys,
            self.tick,
            self.idle,
        );
        *self.dispatch_handle.lock() = Some(dispatcher.spawn());
        self.launches.fetch_add(1, Ordering::SeqCst);
    }

    /// Загрузить настройки; при автозагрузке отсутствие файла не сообщается
    pub async fn load_preferences(&self, explicit: bool) {
        let outcome = self.store.load();
        self.apply_preferences(&outcome.preferences);

        let path = self.store.path().display().to_string();
        match outcome.status {
            LoadStatus::Loaded { defaulted } if defaulted.is_empty() => {
                self.notifier.notify("Preferences loaded", &path).await;
            }
            LoadStatus::Loaded { defaulted } => {
                let body = format!("{} (defaults: {})", path, defaulted.join(", "));
                self.notifier.notify("Preferences loaded", &body).await;
            }
            LoadStatus::NotFound if explicit => {
                info!("Файл настроек {} не найден, используются значения по умолчанию", path);
                self.notifier.notify("No saved preferences", &path).await;
            }
            LoadStatus::NotFound => {}
            LoadStatus::Invalid(reason) => {
                let body = format!("{}: {}", path, reason);
                self.notifier.notify("Preferences invalid, defaults applied", &body).await;
            }
        }
    }

    async fn save_preferences(&self) {
        let preferences = Preferences {
            cadence_seconds: self.control.cadence().as_secs_f64(),
            colors: self.theme.read().clone(),
        };

        let path = self.store.path().display().to_string();
        match self.store.save(&preferences) {
            Ok(()) => self.notifier.notify("Preferences saved", &path).await,
            Err(e) => {
                warn!("Не удалось сохранить настройки в {}: {}", path, e);
                self.notifier
                    .notify("Failed to save preferences", &e.to_string())
                    .await;
            }
        }
    }

    async fn reset_preferences(&self) {
        self.apply_preferences(&self.store.defaults());
        info!("Настройки сброшены к значениям по умолчанию");
        self.notifier.notify("Defaults restored", "").await;
    }

    /// Задать один цвет панели; сохраняется вместе с остальными настройками
    pub fn set_color(&self, name: &str, value: &str) -> Result<()> {
        self.theme.write().set_color(name, value)?;
        info!("Цвет {} изменён на {}", name, value);
        Ok(())
    }

    fn apply_preferences(&self, preferences: &Preferences) {
        *self.theme.write() = preferences.colors.clone();
        self.control.set_cadence(preferences.cadence_seconds);
    }

    /// Остановить цикл отправки при завершении процесса
    pub fn shutdown(&self) {
        if let Some(handle) = self.dispatch_handle.lock().take() {
            handle.abort();
        }
    }
}
