use crate::config::Config;
use crate::error::Result;
use crate::events::{WindowId, WindowInfo};
use std::sync::Arc;

/// Запрос текущего активного (foreground) окна
#[async_trait::async_trait]
pub trait ForegroundWindow: Send + Sync {
    /// Только идентификатор; вызывается на каждом тике цикла отправки
    async fn foreground_window_id(&self) -> Result<WindowId>;

    /// Полная информация (заголовок, класс) для выбора цели и панели
    async fn foreground_window(&self) -> Result<WindowInfo>;
}

/// Factory function to create an appropriate window detector based on the dry_run flag
pub fn create_window_detector(config: &Config, dry_run: bool) -> Result<Arc<dyn ForegroundWindow>> {
    if dry_run {
        Ok(Arc::new(super::dry_run::DryRunDetector::new()))
    } else {
        Ok(Arc::new(super::window_detector::RealWindowDetector::new(config)?))
    }
}
