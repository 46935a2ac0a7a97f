//! WindowDetector service: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for answering which window
//! is in the foreground right now (id, title, class depending on platform).
//! It MUST NOT contain any dispatch logic: matching the foreground window against
//! the target and the cadence gate live exclusively in the Dispatcher.

mod command;
mod dry_run;
mod kdotool;
mod sway;
mod r#trait;
mod window_detector;
mod wmctrl;
mod xdotool;

pub use self::dry_run::DryRunDetector;
pub use self::r#trait::{create_window_detector, ForegroundWindow};
