mod bindings;
mod dry_run;
mod listener;
mod modifier_state;
mod r#trait;

pub use self::bindings::HotkeyBindings;
pub use self::r#trait::{create_hotkey_listener, HotkeyListenerTrait};
