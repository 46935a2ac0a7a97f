use crate::config::MacroKeys;
use crate::debug_if_enabled;
use crate::events::{DispatchEvent, Mode};
use crate::services::control_state::{ControlSnapshot, SharedControl};
use crate::services::virtual_device::KeyEmitter;
use crate::services::window_detector::ForegroundWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

/// Цикл отправки: единственное место, где принимается решение о срабатывании.
///
/// На каждом тике снимает согласованный снимок состояния и отправляет
/// последовательность из двух клавиш, если макрос запущен, не на паузе,
/// выбран режим, целевое окно активно прямо сейчас и каденс истёк.
pub struct Dispatcher {
    control: SharedControl,
    foreground: Arc<dyn ForegroundWindow>,
    emitter: Arc<dyn KeyEmitter>,
    keys: MacroKeys,
    tick: Duration,
    idle: Duration,
}

impl Dispatcher {
    pub fn new(
        control: SharedControl,
        foreground: Arc<dyn ForegroundWindow>,
        emitter: Arc<dyn KeyEmitter>,
        keys: MacroKeys,
        tick: Duration,
        idle: Duration,
    ) -> Self {
        Self {
            control,
            foreground,
            emitter,
            keys,
            tick,
            idle,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Работает до завершения процесса
    pub async fn run(self) {
        // До первого срабатывания каденс отсчитывается от запуска цикла
        let started = Instant::now();
        info!(
            "Цикл отправки запущен (тик: {:?}, ожидание: {:?})",
            self.tick, self.idle
        );

        loop {
            let snapshot = self.control.snapshot();

            if !snapshot.armed {
                sleep(self.idle).await;
                continue;
            }

            if let Some(mode) = self.ready_mode(&snapshot, started).await {
                self.fire(mode);
            }

            sleep(self.tick).await;
        }
    }

    /// Режим для срабатывания, если все условия выполнены на этом тике
    async fn ready_mode(&self, snapshot: &ControlSnapshot, started: Instant) -> Option<Mode> {
        if snapshot.paused {
            return None;
        }
        let mode = snapshot.mode?;
        let target = snapshot.target.as_ref()?;

        let reference = snapshot.last_fired.unwrap_or(started);
        if reference.elapsed() < snapshot.cadence {
            return None;
        }

        // Активное окно запрашивается заново на каждом тике, без кэша
        match self.foreground.foreground_window_id().await {
            Ok(id) if id == target.id => Some(mode),
            Ok(id) => {
                debug_if_enabled!("Активно другое окно ({}), пропускаем тик", id);
                None
            }
            Err(e) => {
                debug_if_enabled!("Не удалось определить активное окно: {}", e);
                None
            }
        }
    }

    fn fire(&self, mode: Mode) {
        for key in self.keys.sequence(mode) {
            if let Err(e) = self.emitter.press_key(key) {
                warn!("Не удалось отправить {}: {}", key, e);
            }
        }

        let event = DispatchEvent::new(mode);
        let count = self.control.record_firing(&event);
        let [first, second] = self.keys.sequence(mode);
        info!("Нажато {} затем {} - [ {} ]", first, second, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CadenceBounds, Config};
    use crate::error::{MacroError, Result};
    use crate::events::{KeyCode, WindowId, WindowInfo};
    use parking_lot::Mutex;

    /// Активное окно, которым управляет тест
    struct FakeForeground {
        current: Mutex<Option<WindowId>>,
    }

    impl FakeForeground {
        fn focused_on(id: &str) -> Arc<Self> {
            Arc::new(Self {
                current: Mutex::new(Some(WindowId::new(id))),
            })
        }

        fn focus(&self, id: &str) {
            *self.current.lock() = Some(WindowId::new(id));
        }

        fn fail(&self) {
            *self.current.lock() = None;
        }
    }

    #[async_trait::async_trait]
    impl ForegroundWindow for FakeForeground {
        async fn foreground_window_id(&self) -> Result<WindowId> {
            self.current
                .lock()
                .clone()
                .ok_or_else(|| MacroError::ServiceUnavailable("no window".to_string()))
        }

        async fn foreground_window(&self) -> Result<WindowInfo> {
            let id = self.foreground_window_id().await?;
            Ok(WindowInfo::new(id, "fake".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingEmitter {
        pressed: Mutex<Vec<KeyCode>>,
        broken: bool,
    }

    impl KeyEmitter for RecordingEmitter {
        fn press_key(&self, key: KeyCode) -> Result<()> {
            if self.broken {
                return Err(MacroError::Internal("device gone".to_string()));
            }
            self.pressed.lock().push(key);
            Ok(())
        }
    }

    struct Harness {
        control: SharedControl,
        foreground: Arc<FakeForeground>,
        emitter: Arc<RecordingEmitter>,
    }

    impl Harness {
        fn new(mode: Mode, cadence_secs: f64, emitter: RecordingEmitter) -> Self {
            let control = SharedControl::new(CadenceBounds::default());
            control.set_mode(mode);
            control.set_cadence(cadence_secs);
            control.set_target(WindowInfo::new(WindowId::new("target"), "Game".to_string()));

            Self {
                control,
                foreground: FakeForeground::focused_on("target"),
                emitter: Arc::new(emitter),
            }
        }

        fn spawn(&self) -> JoinHandle<()> {
            let config = Config::default();
            Dispatcher::new(
                self.control.clone(),
                self.foreground.clone(),
                self.emitter.clone(),
                config.macro_keys().unwrap(),
                config.tick(),
                config.idle(),
            )
            .spawn()
        }

        fn pressed(&self) -> Vec<KeyCode> {
            self.emitter.pressed.lock().clone()
        }
    }

    const E: KeyCode = KeyCode(18);
    const C: KeyCode = KeyCode(46);
    const Z: KeyCode = KeyCode(44);

    #[tokio::test(start_paused = true)]
    async fn test_coffee_fires_three_times_in_three_and_a_half_seconds() {
        let harness = Harness::new(Mode::Coffee, 1.0, RecordingEmitter::default());
        harness.control.start();
        let handle = harness.spawn();

        sleep(Duration::from_millis(3500)).await;

        assert_eq!(harness.pressed(), vec![E, C, E, C, E, C]);
        assert_eq!(harness.control.snapshot().counters.coffee, 3);
        assert_eq!(harness.control.snapshot().counters.pizza, 0);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_firings_follow_cadence_within_one_tick() {
        let harness = Harness::new(Mode::Pizza, 0.7, RecordingEmitter::default());
        harness.control.start();
        let started = Instant::now();
        let handle = harness.spawn();

        let mut fired_at = Vec::new();
        let mut seen = 0;
        while fired_at.len() < 4 {
            sleep(Duration::from_millis(10)).await;
            let snapshot = harness.control.snapshot();
            if snapshot.counters.pizza != seen {
                seen = snapshot.counters.pizza;
                fired_at.push(snapshot.last_fired.unwrap() - started);
            }
        }

        for (i, at) in fired_at.iter().enumerate() {
            let expected = Duration::from_millis(700 * (i as u64 + 1));
            assert!(*at >= expected, "firing {} at {:?}", i, at);
            assert!(*at <= expected + Duration::from_millis(50), "firing {} at {:?}", i, at);
        }
        assert_eq!(&harness.pressed()[..2], &[E, Z]);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unfocused_target_never_fires() {
        let harness = Harness::new(Mode::Pizza, 0.1, RecordingEmitter::default());
        harness.foreground.focus("someone-else");
        harness.control.start();
        let handle = harness.spawn();

        sleep(Duration::from_secs(30)).await;

        assert!(harness.pressed().is_empty());
        assert_eq!(harness.control.snapshot().counters.pizza, 0);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_loss_gates_without_resetting_cadence() {
        let harness = Harness::new(Mode::Coffee, 1.0, RecordingEmitter::default());
        harness.control.start();
        let handle = harness.spawn();

        // t = 1.2s: одно срабатывание в 1.0s, затем пользователь уходит в другое окно
        sleep(Duration::from_millis(1200)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 1);
        harness.foreground.focus("browser");

        // t = 2.6s: каденс давно истёк, но окно не активно
        sleep(Duration::from_millis(1400)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 1);

        // Возврат фокуса: срабатывание на ближайшем тике, без нового ожидания каденса
        harness.foreground.focus("target");
        sleep(Duration::from_millis(100)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 2);

        // Следующее срабатывание отсчитывается от последнего
        sleep(Duration::from_millis(800)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 2);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 3);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_errors_do_not_stop_loop() {
        let harness = Harness::new(Mode::Coffee, 0.5, RecordingEmitter::default());
        harness.foreground.fail();
        harness.control.start();
        let handle = harness.spawn();

        sleep(Duration::from_secs(3)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 0);

        harness.foreground.focus("target");
        sleep(Duration::from_millis(100)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 1);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_emission_failures_are_fire_and_forget() {
        let broken = RecordingEmitter {
            broken: true,
            ..Default::default()
        };
        let harness = Harness::new(Mode::Pizza, 1.0, broken);
        harness.control.start();
        let handle = harness.spawn();

        sleep(Duration::from_millis(2500)).await;

        assert_eq!(harness.control.snapshot().counters.pizza, 2);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_and_disarm_are_inert() {
        let harness = Harness::new(Mode::Coffee, 0.5, RecordingEmitter::default());
        let handle = harness.spawn();

        // Не запущен: цикл жив, но ничего не отправляет
        sleep(Duration::from_secs(2)).await;
        assert!(harness.pressed().is_empty());

        harness.control.start();
        harness.control.pause();
        sleep(Duration::from_secs(2)).await;
        assert!(harness.pressed().is_empty());

        harness.control.start();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(harness.control.snapshot().counters.coffee, 1);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_mode_or_target_never_fires() {
        let harness = Harness {
            control: SharedControl::new(CadenceBounds::default()),
            foreground: FakeForeground::focused_on("target"),
            emitter: Arc::new(RecordingEmitter::default()),
        };
        harness.control.set_cadence(0.1);
        harness.control.start();
        let handle = harness.spawn();

        sleep(Duration::from_secs(1)).await;
        harness.control.set_mode(Mode::Coffee);
        sleep(Duration::from_secs(1)).await;
        assert!(harness.pressed().is_empty());

        harness
            .control
            .set_target(WindowInfo::new(WindowId::new("target"), "Game".to_string()));
        sleep(Duration::from_millis(100)).await;
        assert_eq!(harness.pressed(), vec![E, C]);
        handle.abort();
    }
}
