//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::orchestrator::OrchestratorSettings;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Culling caps
    pub culling: CullingSettings,
    /// Job scheduling
    pub orchestrator: JobSettings,
    /// Source loading
    pub loader: LoaderSettings,
    /// Logging
    pub logging: LoggingSettings,
}

/// `[culling]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CullingSettings {
    /// Maximum photos in the range set.
    pub max_range_photos: usize,
    /// Maximum photos in the area set when a request leaves it open.
    pub max_area_photos: usize,
}

/// `[orchestrator]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    /// Priority of the area job that follows a config change.
    pub followup_priority: i32,
}

/// `[loader]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Per-load deadline in seconds; `0` disables it.
    pub timeout_secs: u64,
    /// JSON photo catalog served by the CLI.
    pub catalog: Option<PathBuf>,
}

impl LoaderSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Session log file, truncated on start.
    pub file: PathBuf,
    /// Default filter level; `RUST_LOG` overrides it.
    pub level: String,
}

impl ConfigFile {
    /// Orchestrator tunables derived from this configuration.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            max_area_photos: self.culling.max_area_photos,
            max_range_photos: self.culling.max_range_photos,
            followup_priority: self.orchestrator.followup_priority,
            load_timeout: self.loader.timeout(),
        }
    }
}
