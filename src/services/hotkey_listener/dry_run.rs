use crate::error::Result;
use crate::events::{ControlAction, Mode};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use super::bindings::HotkeyBindings;
use super::r#trait::HotkeyListenerTrait;

/// Сценарий эмуляции: выбрать окно, режим и запустить макрос
const SCRIPT: [(u64, ControlAction); 3] = [
    (1, ControlAction::SetTarget),
    (1, ControlAction::SetMode(Mode::Coffee)),
    (1, ControlAction::Start),
];

pub struct DryRunHotkeyListener {
    bindings: HotkeyBindings,
    actions: UnboundedSender<ControlAction>,
}

impl DryRunHotkeyListener {
    pub fn new(bindings: HotkeyBindings, actions: UnboundedSender<ControlAction>) -> Self {
        info!("Инициализация DryRunHotkeyListener");
        Self { bindings, actions }
    }

    async fn run_impl(self) -> Result<()> {
        info!("Dry-run режим - горячие клавиши эмулируются");
        info!(
            "Настроено {} горячих клавиш (dry-run)",
            self.bindings.len()
        );

        for (delay_secs, action) in SCRIPT {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            info!("Dry-run: эмулируем горячую клавишу {}", action);
            if self.actions.send(action).is_err() {
                return Ok(());
            }
        }

        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            if self.actions.is_closed() {
                return Ok(());
            }
            debug!("HotkeyListener работает в dry-run режиме");
        }
    }
}

#[async_trait::async_trait]
impl HotkeyListenerTrait for DryRunHotkeyListener {
    async fn run(self: Box<Self>) -> Result<()> {
        (*self).run_impl().await
    }
}
