use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::Config;
use events::Mode;
use services::{
    create_hotkey_listener, create_window_detector, ColorOverride, Controller, Notifier,
    PreferenceStore, SharedControl, StatusPanel, VirtualDevice,
};

#[derive(Parser, Debug)]
#[command(name = "auto-order-rust")]
#[command(about = "Периодически нажимает E, затем C или Z, пока выбранное окно активно")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "auto-order.toml")]
    config: String,

    /// Режим сухого запуска (без реальных нажатий и без чтения клавиатуры)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long)]
    log_level: Option<String>,

    /// Начальный каденс в секундах
    #[arg(long)]
    cadence: Option<f64>,

    /// Путь к файлу пользовательских настроек
    #[arg(long)]
    preferences: Option<PathBuf>,

    /// Начальный режим
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Цвет панели, можно повторять: --color window_bg=#123456
    #[arg(long = "color", value_name = "NAME=#RRGGBB", value_parser = parse_color)]
    colors: Vec<ColorOverride>,
}

fn parse_color(s: &str) -> std::result::Result<ColorOverride, String> {
    s.parse::<ColorOverride>().map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(path) = &args.preferences {
        config.preferences.path = Some(path.clone());
    }

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск Auto-Order Rust v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    } else if let Err(e) = utils::permissions::check_permissions() {
        error!("{}", e);
        for command in utils::permissions::setup_commands() {
            info!("   {}", command);
        }
        return Err(e.into());
    }

    // Единое виртуальное устройство для всех нажатий макроса
    let virtual_device = Arc::new(VirtualDevice::new(
        "Auto-Order Virtual Keyboard",
        args.dry_run,
    )?);
    let foreground = create_window_detector(&config, args.dry_run)?;
    let bounds = config.cadence_bounds();
    let control = SharedControl::new(bounds);
    let store = PreferenceStore::new(config.preferences_path(), bounds);
    let notifier = Notifier::new(&config.notifications, args.dry_run);

    let controller = Arc::new(Controller::new(
        &config,
        control.clone(),
        foreground,
        virtual_device.clone(),
        store,
        notifier,
    )?);

    if config.preferences.autoload {
        controller.load_preferences(false).await;
    }
    if let Some(cadence) = args.cadence {
        control.set_cadence(cadence);
    }
    if let Some(mode) = args.mode {
        control.set_mode(mode);
    }
    for color in &args.colors {
        controller.set_color(&color.name, &color.value)?;
    }

    let (actions_tx, actions_rx) = tokio::sync::mpsc::unbounded_channel();
    let hotkey_listener = create_hotkey_listener(&config, actions_tx, args.dry_run)?;
    let panel = StatusPanel::new(control.clone(), controller.theme(), &config.panel);
    let quit = Arc::new(Notify::new());

    info!("Все компоненты инициализированы");
    print_controls(&config);

    let listener_handle = tokio::spawn(async move {
        if let Err(e) = hotkey_listener.run().await {
            error!("Ошибка в HotkeyListener: {}", e);
        }
    });
    let controller_handle = tokio::spawn(controller.clone().run(actions_rx, quit.clone()));
    let panel_handle = tokio::spawn(panel.run());

    info!("Все сервисы запущены");

    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        },
        _ = quit.notified() => info!("Выход по горячей клавише"),
    }

    info!("Завершение работы...");

    controller.shutdown();

    // Гарантируем отсутствие залипших клавиш макроса
    let keys = controller.keys();
    virtual_device.release_keys(&[keys.lead, keys.coffee, keys.pizza]);

    listener_handle.abort();
    controller_handle.abort();
    panel_handle.abort();

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = listener_handle.await;
        let _ = controller_handle.await;
        let _ = panel_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("Auto-Order Rust завершил работу");
    Ok(())
}

fn print_controls(config: &Config) {
    let hotkeys = &config.hotkeys;
    info!("Управление:");
    info!("  {:<12} выбрать активное окно целью", hotkeys.set_target);
    info!("  {:<12} старт", hotkeys.start);
    info!("  {:<12} пауза", hotkeys.pause);
    info!("  {:<12} режим {}", hotkeys.mode_coffee, Mode::Coffee.label());
    info!("  {:<12} режим {}", hotkeys.mode_pizza, Mode::Pizza.label());
    info!("  {:<12} сбросить счётчики", hotkeys.reset_counters);
    info!("  {:<12} / {} каденс +/-", hotkeys.cadence_up, hotkeys.cadence_down);
    info!(
        "  {:<12} / {} / {} сохранить / загрузить / сбросить настройки",
        hotkeys.save_preferences, hotkeys.load_preferences, hotkeys.reset_preferences
    );
    info!("  {:<12} выход", hotkeys.quit);
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "full" {
        registry.with(tracing_subscriber::fmt::layer()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
