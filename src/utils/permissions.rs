use crate::error::Result;
use crate::macro_error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{info, warn};

const INPUT_DIR: &str = "/dev/input";
const UINPUT_DEVICE: &str = "/dev/uinput";

/// Проверить доступ к клавиатуре (горячие клавиши) и к uinput (отправка нажатий)
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_devices_access()?;
    check_uinput_access()?;
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access() -> Result<()> {
    if !Path::new(INPUT_DIR).exists() {
        return Err(macro_error!(permission, "Директория {} не существует", INPUT_DIR));
    }

    match fs::read_dir(INPUT_DIR) {
        Ok(_) => {
            info!("Доступ к {} подтвержден", INPUT_DIR);
            Ok(())
        }
        Err(e) => Err(macro_error!(
            permission,
            "Нет доступа к {}: {}. Горячие клавиши не будут работать, добавьте пользователя в группу 'input'",
            INPUT_DIR,
            e
        )),
    }
}

fn check_uinput_access() -> Result<()> {
    if !Path::new(UINPUT_DEVICE).exists() {
        // Модуль может быть загружен позже; создание устройства сообщит точную ошибку
        warn!("{} не существует, возможно модуль uinput не загружен", UINPUT_DEVICE);
        return Ok(());
    }

    let metadata = fs::metadata(UINPUT_DEVICE).map_err(|e| {
        macro_error!(permission, "Не удалось проверить права доступа к {}: {}", UINPUT_DEVICE, e)
    })?;

    let mode = metadata.permissions().mode();
    // Обычно 660 с группой uinput/input или 666
    if mode & 0o006 == 0 && mode & 0o060 == 0 {
        return Err(macro_error!(
            permission,
            "Нет прав доступа к {}: нажатия не смогут быть отправлены. Добавьте пользователя в группу 'uinput' или 'input'",
            UINPUT_DEVICE
        ));
    }

    info!("Доступ к {} подтвержден", UINPUT_DEVICE);
    Ok(())
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("⚠️  Приложение запущено от имени root!");
            warn!("   Детекторы окон (xdotool, kdotool) могут не видеть сессию пользователя");
            for command in setup_commands() {
                warn!("   {}", command);
            }
        }
        Ok(user) => {
            info!("Приложение запущено от имени пользователя: {}", user);
        }
        Err(_) => {
            warn!("Не удалось определить пользователя");
        }
    }
}

/// Команды для настройки прав доступа без root
pub fn setup_commands() -> Vec<String> {
    vec![
        "# Добавить пользователя в необходимые группы:".to_string(),
        "sudo usermod -a -G input,uinput $USER".to_string(),
        "# Загрузить модуль uinput:".to_string(),
        "sudo modprobe uinput".to_string(),
        "# Автоматическая загрузка модуля при загрузке системы:".to_string(),
        "echo 'uinput' | sudo tee /etc/modules-load.d/uinput.conf".to_string(),
        "# После выполнения команд перезайдите в систему".to_string(),
    ]
}
