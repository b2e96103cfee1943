use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Temporary files directory for downloads and uploaded playlists
/// Read from TEMP_FILES_DIR environment variable
/// Defaults to /tmp. No tilde expansion, give an absolute path
pub static TEMP_FILES_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FILES_DIR").unwrap_or_else(|_| "/tmp".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: tunerelay.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "tunerelay.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Custom Bot API server URL (local telegram-bot-api instance)
/// Read from BOT_API_URL environment variable
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| {
    env::var("BOT_API_URL").ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
});

/// Download limits
pub mod limits {
    /// Largest declared Content-Length we agree to download (50 MiB).
    /// Telegram bots cannot upload anything bigger.
    pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;
}

/// Request concurrency configuration
pub mod queue {
    use once_cell::sync::Lazy;
    use std::env;

    /// Default number of requests processed at the same time
    pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

    /// Maximum number of concurrent requests
    /// Read from MAX_CONCURRENT_DOWNLOADS environment variable, zero is ignored
    pub static MAX_CONCURRENT_DOWNLOADS: Lazy<usize> = Lazy::new(|| {
        env::var("MAX_CONCURRENT_DOWNLOADS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_CONCURRENT_DOWNLOADS)
    });
}

/// Progress reporting configuration
pub mod progress {
    use super::Duration;
    use once_cell::sync::Lazy;
    use std::env;

    /// Default interval between progress polls (in seconds)
    pub const DEFAULT_INTERVAL_SECS: u64 = 3;

    /// Interval between progress polls
    /// Read from PROGRESS_INTERVAL_SECS environment variable
    pub static INTERVAL_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("PROGRESS_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_INTERVAL_SECS)
    });

    /// Progress poll interval duration
    pub fn interval() -> Duration {
        Duration::from_secs(*INTERVAL_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Client identity sent with every media request
    pub const USER_AGENT: &str = concat!("tunerelay/", env!("CARGO_PKG_VERSION"), " (+media relay bot)");

    /// Connect timeout for remote media (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 30;

    /// Maximum silence between two body chunks before the transfer is abandoned (in seconds)
    pub const READ_TIMEOUT_SECS: u64 = 60;

    /// Request timeout for Bot API calls (in seconds)
    /// Uploads of 50 MB files over slow links take a while
    pub const BOT_API_TIMEOUT_SECS: u64 = 900;

    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }

    pub fn read_timeout() -> Duration {
        Duration::from_secs(READ_TIMEOUT_SECS)
    }

    pub fn bot_api_timeout() -> Duration {
        Duration::from_secs(BOT_API_TIMEOUT_SECS)
    }
}
