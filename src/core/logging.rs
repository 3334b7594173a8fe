//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Broadcast configuration logging at startup

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
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

/// Logs the effective broadcast configuration at application startup
///
/// Reports:
/// - Admin access (broadcast commands are refused without admins)
/// - Roster file location
/// - Fan-out tuning (concurrency ceiling, pacing, progress cadence)
/// - Metrics exporter state
pub fn log_broadcast_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("📣 Broadcast Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_empty() {
        log::warn!("⚠️  BOT_TOKEN / TELOXIDE_TOKEN: not set");
    }

    let admins = config::admin::all_admin_ids();
    if admins.is_empty() {
        log::warn!("⚠️  No admins configured (ADMIN_IDS / ADMIN_USER_ID)");
        log::warn!("   /broadcast, /cancelbroadcast and /broadcasts will be refused");
    } else {
        log::info!("✅ Admins configured: {}", admins.len());
    }

    log::info!("   Roster file: {}", config::ROSTER_PATH.as_str());
    log::info!("   Concurrency ceiling: {}", config::broadcast::MAX_IN_FLIGHT);
    log::info!("   Pacing delay: {} ms", config::broadcast::PACING_DELAY_MS);
    log::info!(
        "   Progress edit cadence: {} ms",
        config::broadcast::PROGRESS_EDIT_INTERVAL_MS
    );
    log::info!("   Per-send timeout: {} s", config::broadcast::SEND_TIMEOUT_SECS);
    log::info!(
        "   Registry purge interval: {} s",
        config::registry::PURGE_INTERVAL_SECS
    );

    if *config::metrics::ENABLED {
        log::info!("   Metrics: enabled on port {}", *config::metrics::PORT);
    } else {
        log::info!("   Metrics: disabled");
    }

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
