use crate::error::{MacroError, Result};
use crate::events::{KeyCode, VirtualKeyEvent};
use crate::macro_error;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

const EV_SYN: i32 = 0;
const EV_KEY: i32 = 1;
const SYN_REPORT: i32 = 0;

/// Отправка нажатий клавиш. Вызывается дважды на каждое срабатывание.
pub trait KeyEmitter: Send + Sync {
    /// Нажать и отпустить клавишу
    fn press_key(&self, key: KeyCode) -> Result<()>;
}

pub struct VirtualDevice {
    device: Option<Mutex<uinput::Device>>,
    device_name: String,
    dry_run: bool,
}

impl VirtualDevice {
    pub fn new(device_name: &str, dry_run: bool) -> Result<Self> {
        info!("Инициализация VirtualDevice '{}' (dry_run: {})", device_name, dry_run);

        let device = if dry_run {
            None
        } else {
            Some(Mutex::new(Self::create_virtual_device(device_name)?))
        };

        Ok(Self {
            device,
            device_name: device_name.to_string(),
            dry_run,
        })
    }

    fn create_virtual_device(device_name: &str) -> Result<uinput::Device> {
        info!("Создание виртуального устройства uinput '{}' для инъекции клавиш", device_name);

        let virtual_device = uinput::default()?
            .name(device_name)?
            .event(uinput::event::Keyboard::All)?
            .create()
            .map_err(|e| {
                macro_error!(internal, "Не удалось создать виртуальное устройство '{}': {}", device_name, e)
            })?;

        info!("Виртуальное устройство '{}' создано успешно", device_name);
        Ok(virtual_device)
    }

    pub fn send_event(&self, event: VirtualKeyEvent) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] Виртуальное событие: {} {:?}", event.key_code, event.state);
            return Ok(());
        }

        let device = self
            .device
            .as_ref()
            .ok_or_else(|| MacroError::Internal("Виртуальное устройство недоступно".to_string()))?;
        let mut device = device.lock();

        let keycode = event.key_code.value() as i32;
        device
            .write(EV_KEY, keycode, event.value())
            .map_err(|e| {
                macro_error!(internal, "Не удалось отправить событие клавиши {}: {}", event.key_code, e)
            })?;

        // Синхронизируем события
        device
            .write(EV_SYN, SYN_REPORT, 0)
            .map_err(|e| macro_error!(internal, "Не удалось синхронизировать события: {}", e))?;

        debug!("Виртуальное событие {} {:?} отправлено", event.key_code, event.state);
        Ok(())
    }

    /// Отпустить клавиши, которые макрос мог оставить нажатыми
    pub fn release_keys(&self, keys: &[KeyCode]) {
        for key in keys {
            if let Err(e) = self.send_event(VirtualKeyEvent::release(*key)) {
                warn!("Не удалось отпустить {}: {}", key, e);
            }
        }
    }
}

impl KeyEmitter for VirtualDevice {
    fn press_key(&self, key: KeyCode) -> Result<()> {
        self.send_event(VirtualKeyEvent::press(key))?;
        self.send_event(VirtualKeyEvent::release(key))
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if !self.dry_run {
            info!("Закрытие виртуального устройства '{}'", self.device_name);
        }
    }
}
