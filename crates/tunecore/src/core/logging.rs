//! Logging initialization and configuration checking
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Startup diagnostics for the download settings

use anyhow::Result;
use simplelog::*;
use std::fs::File;
use std::path::Path;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to create the file or a logger is already installed
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective download configuration at application startup
///
/// Checks that the scratch directory exists, since every request writes there.
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  Download Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let scratch = Path::new(config::TEMP_FILES_DIR.as_str());
    if scratch.is_dir() {
        log::info!("✅ TEMP_FILES_DIR: {}", scratch.display());
    } else {
        log::error!("❌ TEMP_FILES_DIR: {} (NOT A DIRECTORY!)", scratch.display());
        log::error!("   Every download will fail until the directory exists");
    }

    log::info!(
        "📦 Size ceiling: {} bytes ({})",
        config::limits::MAX_FILE_SIZE_BYTES,
        crate::core::human_size(config::limits::MAX_FILE_SIZE_BYTES)
    );
    log::info!("🧵 Concurrent requests: {}", *config::queue::MAX_CONCURRENT_DOWNLOADS);
    log::info!("⏱️  Progress interval: {:?}", config::progress::interval());

    match config::BOT_API_URL.as_deref() {
        Some(url) => log::info!("🌐 Bot API: {}", url),
        None => log::info!("🌐 Bot API: api.telegram.org"),
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
