use crate::config::Config;
use crate::error::Result;
use crate::events::ControlAction;
use tokio::sync::mpsc::UnboundedSender;

use super::bindings::HotkeyBindings;

/// Trait for hotkey listeners that can run in different modes
#[async_trait::async_trait]
pub trait HotkeyListenerTrait {
    /// Run the hotkey listener until the action channel closes
    async fn run(self: Box<Self>) -> Result<()>;
}

/// Factory function to create an appropriate hotkey listener based on the dry_run flag
pub fn create_hotkey_listener(
    config: &Config,
    actions: UnboundedSender<ControlAction>,
    dry_run: bool,
) -> Result<Box<dyn HotkeyListenerTrait + Send>> {
    let bindings = HotkeyBindings::from_config(config)?;

    if dry_run {
        Ok(Box::new(super::dry_run::DryRunHotkeyListener::new(
            bindings, actions,
        )))
    } else {
        Ok(Box::new(super::listener::RealHotkeyListener::new(
            &config.input.device_path,
            bindings,
            actions,
        )?))
    }
}
