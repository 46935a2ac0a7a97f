use crate::error::Result;
use crate::events::{WindowId, WindowInfo};
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

use super::r#trait::ForegroundWindow;

const FAKE_WINDOWS: [&str; 4] = [
    "Terminal - dry_run",
    "Browser - dry_run",
    "Game - dry_run",
    "Editor - dry_run",
];

/// Эмуляция активного окна: окна из списка сменяют друг друга раз в `period`
pub struct DryRunDetector {
    started: Instant,
    period: Duration,
}

impl DryRunDetector {
    pub fn new() -> Self {
        info!("Dry-run режим - WindowDetector работает в режиме эмуляции");
        Self::with_period(Duration::from_secs(10))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            started: Instant::now(),
            period,
        }
    }

    fn current_index(&self) -> usize {
        let slot = self.started.elapsed().as_millis() / self.period.as_millis().max(1);
        (slot % FAKE_WINDOWS.len() as u128) as usize
    }
}

impl Default for DryRunDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ForegroundWindow for DryRunDetector {
    async fn foreground_window_id(&self) -> Result<WindowId> {
        Ok(WindowId::new(format!("dry-{}", self.current_index())))
    }

    async fn foreground_window(&self) -> Result<WindowInfo> {
        let index = self.current_index();
        Ok(WindowInfo::new(
            WindowId::new(format!("dry-{}", index)),
            FAKE_WINDOWS[index].to_string(),
        )
        .with_class("DryRun".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fake_windows_rotate() {
        let detector = DryRunDetector::with_period(Duration::from_secs(10));

        let first = detector.foreground_window().await.unwrap();
        assert_eq!(first.title, "Terminal - dry_run");
        assert_eq!(detector.foreground_window_id().await.unwrap(), first.id);

        tokio::time::advance(Duration::from_secs(10)).await;
        let second = detector.foreground_window().await.unwrap();
        assert_eq!(second.title, "Browser - dry_run");
        assert!(!first.same_window(&second));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(detector.foreground_window_id().await.unwrap(), first.id);
    }
}
