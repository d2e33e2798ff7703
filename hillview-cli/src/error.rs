//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use hillview::config::ConfigFileError;
use hillview::source::LoadError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// No catalog given on the command line or in the config file
    MissingCatalog,
    /// Failed to read the photo catalog
    Catalog { path: PathBuf, error: LoadError },
    /// Invalid command-line argument
    InvalidArgument(String),
    /// One-shot culling failed
    Cull(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to read requests or write updates
    Io(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::MissingCatalog = self {
            eprintln!();
            eprintln!("Pass a catalog with --catalog <FILE>, or store one in the config:");
            eprintln!("  hillview config set loader.catalog ~/photos/catalog.json");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::MissingCatalog => write!(f, "No photo catalog configured"),
            CliError::Catalog { path, error } => {
                write!(f, "Failed to read catalog '{}': {}", path.display(), error)
            }
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Cull(msg) => write!(f, "Culling failed: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Catalog { error, .. } => Some(error),
            CliError::Runtime(e) | CliError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}
