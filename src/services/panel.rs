use crate::config::PanelConfig;
use crate::services::control_state::{ControlSnapshot, SharedControl};
use crate::services::preferences::Theme;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

const RESET: &str = "\x1b[0m";

/// Строка состояния для панели
pub fn render_status(snapshot: &ControlSnapshot, theme: &Theme, colored: bool) -> String {
    let state = format!("State: {}", snapshot.run_state());
    let mode = format!(
        "Mode: {}",
        snapshot.mode.map(|m| m.label()).unwrap_or("None")
    );
    let target = match &snapshot.target {
        Some(window) => format!("Target: \"{}\"", window.display_title()),
        None => "Target: None".to_string(),
    };
    let rest = format!(
        "Coffee: {} | Pizza: {} | Cadence: {:.1} s",
        snapshot.counters.coffee,
        snapshot.counters.pizza,
        snapshot.cadence.as_secs_f64()
    );

    if !colored {
        return format!("{} | {} | {} | {}", state, mode, target, rest);
    }

    let base = format!("{}{}", fg(&theme.text), bg(&theme.counter_bg));
    let mode_bg = if snapshot.mode.is_some() {
        &theme.button_active_bg
    } else {
        &theme.button_inactive_bg
    };

    format!(
        "{base}{state} | {mode_style}{mode}{RESET}{base} | {target} | {rest}{RESET}",
        mode_style = format!("{}{}", fg(&theme.text), bg(mode_bg)),
    )
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();

    match hex.len() {
        3 => {
            let mut digits = hex.chars().map(|c| c.to_string().repeat(2));
            Some((
                channel(&digits.next()?)?,
                channel(&digits.next()?)?,
                channel(&digits.next()?)?,
            ))
        }
        6 => Some((
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        )),
        _ => None,
    }
}

fn fg(color: &str) -> String {
    parse_hex(color)
        .map(|(r, g, b)| format!("\x1b[38;2;{};{};{}m", r, g, b))
        .unwrap_or_default()
}

fn bg(color: &str) -> String {
    parse_hex(color)
        .map(|(r, g, b)| format!("\x1b[48;2;{};{};{}m", r, g, b))
        .unwrap_or_default()
}

/// Панель состояния: периодически опрашивает состояние и печатает строку при изменении
pub struct StatusPanel {
    control: SharedControl,
    theme: Arc<RwLock<Theme>>,
    refresh: Duration,
    colored: bool,
}

impl StatusPanel {
    pub fn new(control: SharedControl, theme: Arc<RwLock<Theme>>, config: &PanelConfig) -> Self {
        Self {
            control,
            theme,
            refresh: Duration::from_millis(config.refresh_ms),
            colored: config.colored,
        }
    }

    pub fn render(&self) -> String {
        let snapshot = self.control.snapshot();
        render_status(&snapshot, &self.theme.read(), self.colored)
    }

    pub async fn run(self) {
        let mut ticker = interval(self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_line = String::new();

        loop {
            ticker.tick().await;
            let line = self.render();
            if line != last_line {
                info!(target: "panel", "{}", line);
                last_line = line;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CadenceBounds;
    use crate::events::{DispatchEvent, Mode, WindowId, WindowInfo};

    fn plain(control: &SharedControl) -> String {
        render_status(&control.snapshot(), &Theme::default(), false)
    }

    #[test]
    fn test_initial_status_line() {
        let control = SharedControl::new(CadenceBounds::default());
        assert_eq!(
            plain(&control),
            "State: Stopped | Mode: None | Target: None | Coffee: 0 | Pizza: 0 | Cadence: 5.0 s"
        );
    }

    #[test]
    fn test_running_status_line() {
        let control = SharedControl::new(CadenceBounds::default());
        control.set_target(WindowInfo::new(WindowId::new("1"), "Cafe".to_string()));
        control.set_mode(Mode::Coffee);
        control.start();
        for _ in 0..3 {
            control.record_firing(&DispatchEvent::new(Mode::Coffee));
        }

        assert_eq!(
            plain(&control),
            "State: Running | Mode: COFFEE (E → C) | Target: \"Cafe\" | Coffee: 3 | Pizza: 0 | Cadence: 5.0 s"
        );

        control.pause();
        control.set_cadence(2.4);
        assert!(plain(&control).starts_with("State: Paused"));
        assert!(plain(&control).ends_with("Cadence: 2.4 s"));
    }

    #[test]
    fn test_untitled_target() {
        let control = SharedControl::new(CadenceBounds::default());
        control.set_target(WindowInfo::new(WindowId::new("1"), String::new()));
        assert!(plain(&control).contains("Target: \"(untitled)\""));
    }

    #[test]
    fn test_colored_line_uses_theme() {
        let control = SharedControl::new(CadenceBounds::default());
        control.set_mode(Mode::Pizza);
        let theme = Theme {
            button_active_bg: "#ff0000".to_string(),
            text: "#fff".to_string(),
            ..Theme::default()
        };

        let line = render_status(&control.snapshot(), &theme, true);
        assert!(line.contains("\x1b[48;2;255;0;0mMode: PIZZA (E → Z)"));
        assert!(line.contains("\x1b[38;2;255;255;255m"));
        assert!(line.ends_with(RESET));
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#0f172a"), Some((15, 23, 42)));
        assert_eq!(parse_hex("#abc"), Some((170, 187, 204)));
        assert_eq!(parse_hex("0f172a"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }
}
