use thiserror::Error;

#[derive(Error, Debug)]
pub enum MacroError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ошибка uinput: {0}")]
    Uinput(#[from] uinput::Error),

    #[error("Ошибка D-Bus: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Неизвестная клавиша: {0}")]
    InvalidKey(String),

    #[error("Ошибка файла настроек: {0}")]
    Preferences(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl MacroError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(MacroError::DeviceNotFound(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, MacroError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! macro_error {
    (device_not_found, $($arg:tt)*) => {
        $crate::error::MacroError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::MacroError::Permission(format!($($arg)*))
    };
    (invalid_key, $($arg:tt)*) => {
        $crate::error::MacroError::InvalidKey(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::MacroError::ServiceUnavailable(format!($($arg)*))
    };
    (preferences, $($arg:tt)*) => {
        $crate::error::MacroError::Preferences(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::MacroError::Internal(format!($($arg)*))
    };
}
