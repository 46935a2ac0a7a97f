use crate::config::NotificationsConfig;
use crate::error::Result;
use std::collections::HashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use zbus::zvariant::Value;
use zbus::Connection;

const APP_NAME: &str = "auto-order-rust";
const DESTINATION: &str = "org.freedesktop.Notifications";
const OBJECT_PATH: &str = "/org/freedesktop/Notifications";

/// Всплывающие уведомления рабочего стола через org.freedesktop.Notifications.
///
/// Уведомления необязательны: любая ошибка D-Bus только логируется.
pub struct Notifier {
    enabled: bool,
    timeout_ms: i32,
    dry_run: bool,
    connection: OnceCell<Connection>,
}

impl Notifier {
    pub fn new(config: &NotificationsConfig, dry_run: bool) -> Self {
        Self {
            enabled: config.enabled,
            timeout_ms: config.timeout_ms,
            dry_run,
            connection: OnceCell::new(),
        }
    }

    #[cfg(test)]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            timeout_ms: 0,
            dry_run: false,
            connection: OnceCell::new(),
        }
    }

    pub async fn notify(&self, summary: &str, body: &str) {
        if !self.enabled {
            debug!("Уведомление пропущено: {} - {}", summary, body);
            return;
        }

        if self.dry_run {
            info!("[DRY RUN] Уведомление: {} - {}", summary, body);
            return;
        }

        if let Err(e) = self.send(summary, body).await {
            warn!("Не удалось показать уведомление: {}", e);
        }
    }

    async fn send(&self, summary: &str, body: &str) -> Result<()> {
        let connection = self
            .connection
            .get_or_try_init(|| async { Connection::session().await })
            .await?;

        let actions: Vec<&str> = Vec::new();
        let hints: HashMap<&str, Value<'_>> = HashMap::new();

        connection
            .call_method(
                Some(DESTINATION),
                OBJECT_PATH,
                Some(DESTINATION),
                "Notify",
                &(APP_NAME, 0u32, "", summary, body, actions, hints, self.timeout_ms),
            )
            .await?;

        debug!("Уведомление отправлено: {}", summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_notifier_is_silent() {
        Notifier::disabled().notify("Saved", "nothing happens").await;
    }

    #[tokio::test]
    async fn test_dry_run_never_touches_dbus() {
        let config = NotificationsConfig {
            enabled: true,
            timeout_ms: 1000,
        };
        let notifier = Notifier::new(&config, true);
        notifier.notify("Saved", "dry").await;
        assert!(notifier.connection.get().is_none());
    }
}
