pub mod control_state;
pub mod controller;
pub mod dispatcher;
pub mod hotkey_listener;
pub mod notifier;
pub mod panel;
pub mod preferences;
pub mod virtual_device;
pub mod window_detector;

pub use control_state::SharedControl;
pub use controller::Controller;
pub use hotkey_listener::create_hotkey_listener;
pub use notifier::Notifier;
pub use panel::StatusPanel;
pub use preferences::{ColorOverride, PreferenceStore};
pub use virtual_device::VirtualDevice;
pub use window_detector::create_window_detector;
