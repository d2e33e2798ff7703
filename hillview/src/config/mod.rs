//! User configuration for the hillview service.
//!
//! Settings live in `~/.hillview/config.ini`, one `[section]` per concern:
//!
//! - `[culling]` caps for the area and range sets
//! - `[orchestrator]` follow-up job priority
//! - `[loader]` load deadline and the catalog served by the CLI
//! - `[logging]` log file and level
//!
//! # Example
//!
//! ```
//! use hillview::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::default();
//! ConfigKey::CullingMaxRangePhotos.set(&mut config, "25").unwrap();
//! assert_eq!(config.orchestrator_settings().max_range_photos, 25);
//! ```

pub mod defaults;
mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{ConfigFile, CullingSettings, JobSettings, LoaderSettings, LoggingSettings};
