// src/main.rs

mod app_logic;
mod core;
mod platform_layer;

use crate::app_logic::SlicerAppLogic;
use crate::app_logic::ui_constants::{APP_NAME, WINDOW_TITLE_BASE};
use crate::core::{
    AppConfig, BackgroundThread, CommandSlot, ConfigManagerOperations, CoreConfigManager,
    CoreDocumentStore, DocumentStoreOperations,
};
use crate::platform_layer::{
    PlatformError, PlatformEventHandler, PlatformInterface, PlatformResult, WindowConfig,
};

use simplelog::{ConfigBuilder, LevelFilter};
use std::sync::{Arc, Mutex, Once};

static LOGGING_INIT: Once = Once::new();

// Overrides the per-user configuration directory.
const CONFIG_DIR_ENV: &str = "PAGE_SLICER_CONFIG_DIR";

/*
 * Installs the global logger exactly once. Tests get simplelog's `TestLogger`, which
 * cooperates with the test harness' output capture; the binary logs to stderr.
 */
pub(crate) fn initialize_logging() {
    LOGGING_INIT.call_once(|| {
        let config = ConfigBuilder::new()
            .set_time_format_custom(time::macros::format_description!(
                "[hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .set_thread_level(LevelFilter::Debug)
            .build();

        #[cfg(test)]
        let result = simplelog::TestLogger::init(LevelFilter::Trace, config);
        #[cfg(not(test))]
        let result = simplelog::TermLogger::init(
            LevelFilter::Info,
            config,
            simplelog::TerminalMode::Stderr,
            simplelog::ColorChoice::Auto,
        );

        if let Err(e) = result {
            eprintln!("Failed to initialize logger: {e}");
        }
    });
}

fn create_config_manager() -> CoreConfigManager {
    match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) => {
            log::info!("Main: Using configuration directory {dir:?}");
            CoreConfigManager::with_config_dir(dir)
        }
        None => CoreConfigManager::new(),
    }
}

fn load_config(config_manager: &dyn ConfigManagerOperations) -> AppConfig {
    match config_manager.load_config(APP_NAME) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Main: Could not load configuration, using defaults: {e}");
            AppConfig::default()
        }
    }
}

fn main() -> PlatformResult<()> {
    initialize_logging();
    log::info!("Main: {APP_NAME} starting.");

    let config_manager: Arc<dyn ConfigManagerOperations> = Arc::new(create_config_manager());
    let document_store: Arc<dyn DocumentStoreOperations> = Arc::new(CoreDocumentStore::new());
    let config = load_config(config_manager.as_ref());

    let background = Arc::new(BackgroundThread::spawn("command-worker").map_err(|e| {
        PlatformError::InitializationFailed(format!("Background thread: {e}"))
    })?);
    let command_slot = CommandSlot::new(Arc::clone(&background));

    let platform_interface = PlatformInterface::new()?;
    platform_interface.create_window(WindowConfig {
        title: WINDOW_TITLE_BASE,
        width: config.window_width,
        height: config.window_height,
        min_width: config.min_window_width,
        min_height: config.min_window_height,
    })?;

    let app_logic = SlicerAppLogic::new(
        command_slot,
        document_store,
        config_manager,
        config,
        platform_interface.ui_thread_waker(),
    );
    let event_handler: Arc<Mutex<dyn PlatformEventHandler>> = Arc::new(Mutex::new(app_logic));

    let run_result = platform_interface.run(event_handler);
    background.shutdown();
    log::info!("Main: Exiting.");
    run_result
}
