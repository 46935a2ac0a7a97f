use crate::error::Result;
use crate::events::{ControlAction, KeyCode, KeyEvent, KeyState};
use crate::macro_error;
use crate::utils::DeviceFinder;
use evdev::{Device, EventStream, EventType, InputEvent};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use super::bindings::HotkeyBindings;
use super::modifier_state::ModifierState;
use super::r#trait::HotkeyListenerTrait;

/// Источник сырых событий клавиатуры
#[async_trait::async_trait]
pub(super) trait KeyEventSource: Send {
    async fn next_event(&mut self) -> io::Result<InputEvent>;
}

#[async_trait::async_trait]
impl KeyEventSource for EventStream {
    async fn next_event(&mut self) -> io::Result<InputEvent> {
        EventStream::next_event(self).await
    }
}

/// Превращает сырые события EV_KEY в команды с учётом модификаторов
pub(super) struct HotkeyTranslator {
    bindings: HotkeyBindings,
    modifier_state: ModifierState,
}

impl HotkeyTranslator {
    pub fn new(bindings: HotkeyBindings) -> Self {
        Self {
            bindings,
            modifier_state: ModifierState::new(),
        }
    }

    pub fn bindings(&self) -> &HotkeyBindings {
        &self.bindings
    }

    pub fn translate(&mut self, event: InputEvent) -> Option<ControlAction> {
        if event.event_type() != EventType::KEY {
            return None;
        }

        let key_state = match KeyState::from_value(event.value()) {
            Some(state) => state,
            None => {
                debug!("Неизвестное значение события: {}", event.value());
                return None;
            }
        };

        // Автоповтор модификатора не меняет их состояние
        if key_state != KeyState::Repeat
            && self
                .modifier_state
                .update_key(evdev::KeyCode::new(event.code()), key_state == KeyState::Pressed)
        {
            return None;
        }

        let key_event = KeyEvent::new(
            KeyCode::new(event.code()),
            key_state,
            self.modifier_state.to_modifiers(),
        );
        crate::trace_if_enabled!("Событие клавиши: {}", key_event);

        self.bindings.action_for(&key_event)
    }
}

/// Читает события, пока канал команд открыт.
///
/// Закрытие канала завершает цикл даже без новых нажатий.
pub(super) async fn forward_hotkeys(
    source: &mut dyn KeyEventSource,
    translator: &mut HotkeyTranslator,
    actions: &UnboundedSender<ControlAction>,
) -> Result<()> {
    loop {
        let event = tokio::select! {
            _ = actions.closed() => {
                info!("Канал действий закрыт, чтение горячих клавиш завершено");
                return Ok(());
            }
            event = source.next_event() => event,
        };

        match event {
            Ok(event) => {
                if let Some(action) = translator.translate(event) {
                    info!("Горячая клавиша: {}", action);
                    if actions.send(action).is_err() {
                        info!("Канал действий закрыт, чтение горячих клавиш завершено");
                        return Ok(());
                    }
                }
            }
            Err(e) => {
                error!("Ошибка чтения событий: {}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// Слушатель глобальных горячих клавиш на физической клавиатуре.
///
/// Устройство не захватывается эксклюзивно: события продолжают идти в
/// рабочий стол, мы только подсматриваем нажатия.
pub struct RealHotkeyListener {
    device: Device,
    device_path: PathBuf,
    translator: HotkeyTranslator,
    actions: UnboundedSender<ControlAction>,
}

impl RealHotkeyListener {
    pub fn new(
        device_path: &str,
        bindings: HotkeyBindings,
        actions: UnboundedSender<ControlAction>,
    ) -> Result<Self> {
        info!("Инициализация RealHotkeyListener");

        let device_path = DeviceFinder::find_keyboard_device(device_path)?;

        let device = Device::open(&device_path).map_err(|e| {
            macro_error!(device_not_found, "Не удалось открыть устройство {:?}: {}", device_path, e)
        })?;

        info!("Устройство: {}", device.name().unwrap_or("Unknown"));
        info!("Физический путь: {:?}", device.physical_path());

        for (hotkey, action) in bindings.iter() {
            debug!("Горячая клавиша {} -> {}", hotkey, action);
        }

        Ok(Self {
            device,
            device_path,
            translator: HotkeyTranslator::new(bindings),
            actions,
        })
    }
}

#[async_trait::async_trait]
impl HotkeyListenerTrait for RealHotkeyListener {
    async fn run(self: Box<Self>) -> Result<()> {
        let RealHotkeyListener {
            device,
            device_path,
            mut translator,
            actions,
        } = *self;

        // Асинхронный поток: задачу можно прервать через abort() при выходе
        let mut stream = device.into_event_stream()?;
        info!(
            "RealHotkeyListener запущен на {:?}, настроено {} горячих клавиш",
            device_path,
            translator.bindings().len()
        );

        forward_hotkeys(&mut stream, &mut translator, &actions).await
    }
}
