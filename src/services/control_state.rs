use crate::config::CadenceBounds;
use crate::events::{DispatchEvent, Mode, WindowInfo};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Счётчики срабатываний по режимам
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub coffee: u64,
    pub pizza: u64,
}

impl Counters {
    fn increment(&mut self, mode: Mode) -> u64 {
        let counter = match mode {
            Mode::Coffee => &mut self.coffee,
            Mode::Pizza => &mut self.pizza,
        };
        *counter += 1;
        *counter
    }
}

/// Производное состояние armed/paused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Paused,
}

impl RunState {
    fn from_flags(armed: bool, paused: bool) -> Self {
        match (armed, paused) {
            (false, _) => RunState::Stopped,
            (true, false) => RunState::Running,
            (true, true) => RunState::Paused,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => write!(f, "Stopped"),
            RunState::Running => write!(f, "Running"),
            RunState::Paused => write!(f, "Paused"),
        }
    }
}

/// Результат `start()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Первый запуск: вызывающий обязан запустить цикл отправки
    LaunchLoop,
    /// Цикл уже работает, сняли паузу
    Resumed,
}

/// Состояние макроса. Доступно только через `SharedControl`.
#[derive(Debug)]
struct ControlState {
    armed: bool,
    paused: bool,
    mode: Option<Mode>,
    target: Option<WindowInfo>,
    cadence: Duration,
    counters: Counters,
    // Отдельно от armed/paused: цикл запускается ровно один раз за процесс
    loop_started: bool,
    last_fired: Option<Instant>,
}

impl ControlState {
    fn new(cadence: Duration) -> Self {
        Self {
            armed: false,
            paused: false,
            mode: None,
            target: None,
            cadence,
            counters: Counters::default(),
            loop_started: false,
            last_fired: None,
        }
    }

    fn run_state(&self) -> RunState {
        RunState::from_flags(self.armed, self.paused)
    }
}

/// Согласованная копия всех полей, снятая под одной блокировкой
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSnapshot {
    pub armed: bool,
    pub paused: bool,
    pub mode: Option<Mode>,
    pub target: Option<WindowInfo>,
    pub cadence: Duration,
    pub counters: Counters,
    pub loop_started: bool,
    pub last_fired: Option<Instant>,
}

impl ControlSnapshot {
    pub fn run_state(&self) -> RunState {
        RunState::from_flags(self.armed, self.paused)
    }
}

/// Разделяемое состояние макроса.
///
/// Все поля читаются и пишутся только внутри одной блокировки, поэтому цикл
/// отправки всегда видит согласованный набор mode + cadence + target.
#[derive(Clone)]
pub struct SharedControl {
    inner: Arc<Mutex<ControlState>>,
    bounds: CadenceBounds,
}

impl SharedControl {
    pub fn new(bounds: CadenceBounds) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ControlState::new(bounds.default_duration()))),
            bounds,
        }
    }

    pub fn set_target(&self, window: WindowInfo) {
        let mut state = self.inner.lock();
        match &state.target {
            Some(previous) if previous.same_window(&window) => {
                info!("Целевое окно обновлено: {}", window)
            }
            _ => info!("Целевое окно: {}", window),
        }
        state.target = Some(window);
    }

    pub fn set_mode(&self, mode: Mode) {
        self.inner.lock().mode = Some(mode);
        info!("Режим: {}", mode.label());
    }

    pub fn start(&self) -> StartOutcome {
        let outcome = {
            let mut state = self.inner.lock();
            state.armed = true;
            state.paused = false;
            if state.loop_started {
                StartOutcome::Resumed
            } else {
                state.loop_started = true;
                StartOutcome::LaunchLoop
            }
        };

        match outcome {
            StartOutcome::LaunchLoop => info!("▶️ Макрос запущен"),
            StartOutcome::Resumed => info!("▶️ Макрос продолжен"),
        }
        outcome
    }

    /// Пауза; armed не меняется, цикл остаётся жив
    pub fn pause(&self) {
        self.inner.lock().paused = true;
        info!("⏸️ Макрос на паузе");
    }

    pub fn reset_counters(&self) {
        self.inner.lock().counters = Counters::default();
        info!("Счётчики сброшены");
    }

    /// Сохранить каденс, приведённый к допустимому диапазону
    pub fn set_cadence(&self, secs: f64) -> Duration {
        let cadence = self.bounds.clamp_duration(secs);
        self.inner.lock().cadence = cadence;
        info!("Каденс: {:.1} с", cadence.as_secs_f64());
        cadence
    }

    /// Изменить каденс на `delta_secs` (чтение и запись под одной блокировкой)
    pub fn adjust_cadence(&self, delta_secs: f64) -> Duration {
        let cadence = {
            let mut state = self.inner.lock();
            state.cadence = self
                .bounds
                .clamp_duration(state.cadence.as_secs_f64() + delta_secs);
            state.cadence
        };
        info!("Каденс: {:.1} с", cadence.as_secs_f64());
        cadence
    }

    pub fn cadence(&self) -> Duration {
        self.inner.lock().cadence
    }

    pub fn run_state(&self) -> RunState {
        self.inner.lock().run_state()
    }

    pub fn snapshot(&self) -> ControlSnapshot {
        let state = self.inner.lock();
        ControlSnapshot {
            armed: state.armed,
            paused: state.paused,
            mode: state.mode,
            target: state.target.clone(),
            cadence: state.cadence,
            counters: state.counters,
            loop_started: state.loop_started,
            last_fired: state.last_fired,
        }
    }

    /// Учесть срабатывание; возвращает новое значение счётчика режима
    pub fn record_firing(&self, event: &DispatchEvent) -> u64 {
        let mut state = self.inner.lock();
        state.last_fired = Some(event.timestamp);
        state.counters.increment(event.mode)
    }
}
