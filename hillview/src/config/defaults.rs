//! Default values and constants for all configuration settings.
//!
//! Contains all `DEFAULT_*` constants and the `ConfigFile::default()`
//! implementation.

use super::file::config_directory;
use super::settings::*;

// =============================================================================
// Culling
// =============================================================================

/// Range cap used when an area request does not carry one.
pub const DEFAULT_MAX_RANGE_PHOTOS: usize = 100;

/// Area cap used when an area request sends `0`.
pub const DEFAULT_MAX_AREA_PHOTOS: usize = 400;

// =============================================================================
// Orchestrator
// =============================================================================

/// Priority of the area job synthesized after a config change.
pub const DEFAULT_FOLLOWUP_PRIORITY: i32 = 10;

// =============================================================================
// Loader
// =============================================================================

/// Deadline handed to source loaders, in seconds. `0` disables it.
pub const DEFAULT_LOADER_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Logging
// =============================================================================

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE_NAME: &str = "hillview.log";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Accepted log levels.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Default log file path (~/.hillview/hillview.log).
pub fn default_log_file() -> std::path::PathBuf {
    config_directory().join(DEFAULT_LOG_FILE_NAME)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            culling: CullingSettings {
                max_range_photos: DEFAULT_MAX_RANGE_PHOTOS,
                max_area_photos: DEFAULT_MAX_AREA_PHOTOS,
            },
            orchestrator: JobSettings {
                followup_priority: DEFAULT_FOLLOWUP_PRIORITY,
            },
            loader: LoaderSettings {
                timeout_secs: DEFAULT_LOADER_TIMEOUT_SECS,
                catalog: None,
            },
            logging: LoggingSettings {
                file: default_log_file(),
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}
