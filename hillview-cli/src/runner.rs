//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and catalog loading
//! shared by the command handlers.

use std::path::{Path, PathBuf};

use tracing::info;

use hillview::config::ConfigFile;
use hillview::logging::{init_logging, LoggingGuard};
use hillview::source::CatalogLoader;

use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `debug_mode` - When true, logs at debug level unless RUST_LOG says otherwise
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let level = if debug_mode {
            "debug"
        } else {
            config.logging.level.as_str()
        };
        let logging_guard = init_logging(&config.logging.file, level)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("Hillview v{}", hillview::VERSION);
        info!("Hillview CLI: {} command", command);
    }

    /// Load the catalog named on the command line, falling back to
    /// `loader.catalog` from the config file.
    pub fn load_catalog(&self, explicit: Option<&Path>) -> Result<CatalogLoader, CliError> {
        let path: PathBuf = explicit
            .map(Path::to_path_buf)
            .or_else(|| self.config.loader.catalog.clone())
            .ok_or(CliError::MissingCatalog)?;

        let loader = CatalogLoader::from_file(&path)
            .map_err(|error| CliError::Catalog { path: path.clone(), error })?;
        info!(
            path = %path.display(),
            sources = loader.source_ids().len(),
            photos = loader.photo_count(),
            "Catalog loaded"
        );
        Ok(loader)
    }
}
