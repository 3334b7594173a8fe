//! Configuration for the bot.
//!
//! Values are read from the environment once, at first use, via `Lazy`
//! statics. Tuning knobs that rarely change live as constants in the
//! submodules next to the code that consumes them.

use once_cell::sync::Lazy;
use std::env;

/// Bot token
/// Read from BOT_TOKEN environment variable, falling back to
/// TELOXIDE_TOKEN for stock teloxide deployments
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// Custom Bot API server URL (for a self-hosted telegram-bot-api)
/// Read from BOT_API_URL environment variable
/// None means api.telegram.org
pub static BOT_API_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("BOT_API_URL").ok().filter(|url| !url.trim().is_empty()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: heraldbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "heraldbot.log".to_string()));

/// Roster file path (one chat id per line)
/// Read from ROSTER_PATH environment variable
/// Default: roster.txt
pub static ROSTER_PATH: Lazy<String> =
    Lazy::new(|| env::var("ROSTER_PATH").unwrap_or_else(|_| "roster.txt".to_string()));

/// Admin access configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    pub(crate) fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }

    /// Admin user IDs (comma-separated)
    /// Read from ADMIN_IDS environment variable
    pub static ADMIN_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
        env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default()
    });

    /// Admin user ID for direct messages (startup banner, notifications)
    /// Read from ADMIN_USER_ID or fallback to first ADMIN_IDS entry
    /// Defaults to 0 if not set (no admin notifications)
    pub static ADMIN_USER_ID: Lazy<i64> = Lazy::new(|| {
        env::var("ADMIN_USER_ID")
            .ok()
            .and_then(|s| s.parse().ok())
            .or_else(|| ADMIN_IDS.first().copied())
            .unwrap_or(0)
    });

    /// Admin ids with the primary admin merged in, deduplicated.
    pub fn all_admin_ids() -> Vec<i64> {
        let mut ids = ADMIN_IDS.clone();
        let primary = *ADMIN_USER_ID;
        if primary != 0 && !ids.contains(&primary) {
            ids.push(primary);
        }
        ids
    }
}

/// Broadcast fan-out tuning
pub mod broadcast {
    use std::time::Duration;

    /// Ceiling on concurrent deliveries per broadcast job
    pub const MAX_IN_FLIGHT: usize = 8;

    /// Pause after each delivery, held inside the concurrency slot so the
    /// aggregate send rate stays under the Bot API flood limits
    pub const PACING_DELAY_MS: u64 = 20;

    /// Cadence of the pinned progress-message edits
    pub const PROGRESS_EDIT_INTERVAL_MS: u64 = 1000;

    /// Deadline for a single delivery before it is written off as failed
    pub const SEND_TIMEOUT_SECS: u64 = 30;

    pub fn pacing_delay() -> Duration {
        Duration::from_millis(PACING_DELAY_MS)
    }

    pub fn progress_edit_interval() -> Duration {
        Duration::from_millis(PROGRESS_EDIT_INTERVAL_MS)
    }

    pub fn send_timeout() -> Duration {
        Duration::from_secs(SEND_TIMEOUT_SECS)
    }
}

/// Job registry housekeeping
pub mod registry {
    use std::time::Duration;

    /// How often finished jobs are swept out of the registry
    pub const PURGE_INTERVAL_SECS: u64 = 60 * 60;

    pub fn purge_interval() -> Duration {
        Duration::from_secs(PURGE_INTERVAL_SECS)
    }
}

/// Dispatcher restart policy
pub mod dispatcher {
    use std::time::Duration;

    /// How many times a crashed dispatcher is restarted before giving up
    pub const MAX_RESTARTS: u32 = 5;

    /// Pause between dispatcher restarts
    pub const RESTART_DELAY_SECS: u64 = 5;

    pub fn restart_delay() -> Duration {
        Duration::from_secs(RESTART_DELAY_SECS)
    }
}

/// Metrics and monitoring configuration
pub mod metrics {
    use once_cell::sync::Lazy;
    use std::env;

    /// Enable metrics collection and HTTP server
    /// Read from METRICS_ENABLED environment variable
    /// Default: true
    pub static ENABLED: Lazy<bool> = Lazy::new(|| {
        env::var("METRICS_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(true)
    });

    /// Port for metrics HTTP server
    /// Read from METRICS_PORT environment variable
    /// Default: 9090
    pub static PORT: Lazy<u16> = Lazy::new(|| {
        env::var("METRICS_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(9090)
    });
}

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Timeout for a single Bot API request
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}
