//! Configuration key access and validation.
//!
//! This module provides a type-safe interface for getting and setting
//! configuration values by key name, with validation via the Specification Pattern.

use std::str::FromStr;
use thiserror::Error;

use super::defaults::LOG_LEVELS;
use super::file::{expand_tilde, path_to_display};
use super::settings::ConfigFile;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
///
/// Each key maps to a specific field in [`ConfigFile`] and knows how to
/// get and set its value with proper validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // Culling settings
    CullingMaxRangePhotos,
    CullingMaxAreaPhotos,

    // Orchestrator settings
    OrchestratorFollowupPriority,

    // Loader settings
    LoaderTimeoutSecs,
    LoaderCatalog,

    // Logging settings
    LoggingFile,
    LoggingLevel,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "culling.max_range_photos" => Ok(ConfigKey::CullingMaxRangePhotos),
            "culling.max_area_photos" => Ok(ConfigKey::CullingMaxAreaPhotos),

            "orchestrator.followup_priority" => Ok(ConfigKey::OrchestratorFollowupPriority),

            "loader.timeout_secs" => Ok(ConfigKey::LoaderTimeoutSecs),
            "loader.catalog" => Ok(ConfigKey::LoaderCatalog),

            "logging.file" => Ok(ConfigKey::LoggingFile),
            "logging.level" => Ok(ConfigKey::LoggingLevel),

            _ => Err(ConfigKeyError::UnknownKey(s.to_string())),
        }
    }
}

impl ConfigKey {
    /// Get the canonical key name (e.g., "culling.max_range_photos").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::CullingMaxRangePhotos => "culling.max_range_photos",
            ConfigKey::CullingMaxAreaPhotos => "culling.max_area_photos",
            ConfigKey::OrchestratorFollowupPriority => "orchestrator.followup_priority",
            ConfigKey::LoaderTimeoutSecs => "loader.timeout_secs",
            ConfigKey::LoaderCatalog => "loader.catalog",
            ConfigKey::LoggingFile => "logging.file",
            ConfigKey::LoggingLevel => "logging.level",
        }
    }

    /// Get the section name (e.g., "culling").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Get the key name within the section (e.g., "max_range_photos").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Get the value from a config file as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::CullingMaxRangePhotos => config.culling.max_range_photos.to_string(),
            ConfigKey::CullingMaxAreaPhotos => config.culling.max_area_photos.to_string(),
            ConfigKey::OrchestratorFollowupPriority => {
                config.orchestrator.followup_priority.to_string()
            }
            ConfigKey::LoaderTimeoutSecs => config.loader.timeout_secs.to_string(),
            ConfigKey::LoaderCatalog => config
                .loader
                .catalog
                .as_ref()
                .map(|p| path_to_display(p))
                .unwrap_or_default(),
            ConfigKey::LoggingFile => path_to_display(&config.logging.file),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Set the value in a config file.
    ///
    /// Validates the value according to the key's specification before setting.
    /// On error the config is left unchanged.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        self.validate(value)?;
        let value = value.trim();
        match self {
            ConfigKey::CullingMaxRangePhotos => {
                config.culling.max_range_photos = self.parse(value)?;
            }
            ConfigKey::CullingMaxAreaPhotos => {
                config.culling.max_area_photos = self.parse(value)?;
            }
            ConfigKey::OrchestratorFollowupPriority => {
                config.orchestrator.followup_priority = self.parse(value)?;
            }
            ConfigKey::LoaderTimeoutSecs => {
                config.loader.timeout_secs = self.parse(value)?;
            }
            ConfigKey::LoaderCatalog => {
                config.loader.catalog = (!value.is_empty()).then(|| expand_tilde(value));
            }
            ConfigKey::LoggingFile => {
                config.logging.file = expand_tilde(value);
            }
            ConfigKey::LoggingLevel => {
                config.logging.level = value.to_lowercase();
            }
        }
        Ok(())
    }

    fn parse<T: FromStr>(&self, value: &str) -> Result<T, ConfigKeyError> {
        value.parse().map_err(|_| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: format!("cannot parse '{}'", value),
        })
    }

    /// Validate a value according to this key's specification.
    pub fn validate(&self, value: &str) -> Result<(), ConfigKeyError> {
        self.specification()
            .is_satisfied_by(value.trim())
            .map_err(|reason| ConfigKeyError::ValidationFailed {
                key: self.name().to_string(),
                reason,
            })
    }

    /// Get the validation specification for this key.
    fn specification(&self) -> Box<dyn ValueSpecification> {
        match self {
            ConfigKey::CullingMaxRangePhotos => Box::new(NonNegativeIntegerSpec),
            ConfigKey::CullingMaxAreaPhotos => Box::new(NonNegativeIntegerSpec),
            ConfigKey::OrchestratorFollowupPriority => Box::new(IntegerSpec),
            ConfigKey::LoaderTimeoutSecs => Box::new(NonNegativeIntegerSpec),
            ConfigKey::LoaderCatalog => Box::new(OptionalPathSpec),
            ConfigKey::LoggingFile => Box::new(PathSpec),
            ConfigKey::LoggingLevel => Box::new(OneOfSpec::new(LOG_LEVELS)),
        }
    }

    /// Get all supported configuration keys.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::CullingMaxRangePhotos,
            ConfigKey::CullingMaxAreaPhotos,
            ConfigKey::OrchestratorFollowupPriority,
            ConfigKey::LoaderTimeoutSecs,
            ConfigKey::LoaderCatalog,
            ConfigKey::LoggingFile,
            ConfigKey::LoggingLevel,
        ]
    }
}

// ============================================================================
// Value Specifications (Specification Pattern)
// ============================================================================

/// Trait for value validation specifications.
trait ValueSpecification {
    /// Check if the value satisfies this specification.
    /// Returns Ok(()) if valid, Err(reason) if invalid.
    fn is_satisfied_by(&self, value: &str) -> Result<(), String>;
}

/// Specification that requires the value to be one of a set of options.
struct OneOfSpec {
    options: &'static [&'static str],
}

impl OneOfSpec {
    fn new(options: &'static [&'static str]) -> Self {
        Self { options }
    }
}

impl ValueSpecification for OneOfSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        let lower = value.to_lowercase();
        if self.options.iter().any(|opt| *opt == lower) {
            Ok(())
        } else {
            Err(format!("must be one of: {}", self.options.join(", ")))
        }
    }
}

/// Specification for counts and durations (zero allowed).
struct NonNegativeIntegerSpec;

impl ValueSpecification for NonNegativeIntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<u64>()
            .map(|_| ())
            .map_err(|_| "must be a non-negative integer".to_string())
    }
}

/// Specification for signed integers such as priorities.
struct IntegerSpec;

impl ValueSpecification for IntegerSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        value
            .parse::<i32>()
            .map(|_| ())
            .map_err(|_| "must be an integer".to_string())
    }
}

/// Specification for path values (non-empty).
struct PathSpec;

impl ValueSpecification for PathSpec {
    fn is_satisfied_by(&self, value: &str) -> Result<(), String> {
        if value.is_empty() {
            Err("must be a valid path".to_string())
        } else {
            Ok(())
        }
    }
}

/// Specification for optional path values (empty clears the setting).
struct OptionalPathSpec;

impl ValueSpecification for OptionalPathSpec {
    fn is_satisfied_by(&self, _value: &str) -> Result<(), String> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_key() {
        assert_eq!(
            "culling.max_range_photos".parse::<ConfigKey>().unwrap(),
            ConfigKey::CullingMaxRangePhotos
        );
        assert_eq!(
            "LOGGING.LEVEL".parse::<ConfigKey>().unwrap(),
            ConfigKey::LoggingLevel
        );
        assert!(matches!(
            "culling.nope".parse::<ConfigKey>(),
            Err(ConfigKeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_key_parts() {
        let key = ConfigKey::OrchestratorFollowupPriority;
        assert_eq!(key.section(), "orchestrator");
        assert_eq!(key.key_name(), "followup_priority");
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_get_and_set() {
        let mut config = ConfigFile::default();

        ConfigKey::CullingMaxRangePhotos
            .set(&mut config, "25")
            .unwrap();
        ConfigKey::OrchestratorFollowupPriority
            .set(&mut config, "-2")
            .unwrap();
        ConfigKey::LoggingLevel.set(&mut config, "DEBUG").unwrap();

        assert_eq!(config.culling.max_range_photos, 25);
        assert_eq!(ConfigKey::CullingMaxRangePhotos.get(&config), "25");
        assert_eq!(config.orchestrator.followup_priority, -2);
        assert_eq!(ConfigKey::LoggingLevel.get(&config), "debug");
    }

    #[test]
    fn test_validate_counts() {
        assert!(ConfigKey::LoaderTimeoutSecs.validate("0").is_ok());
        assert!(ConfigKey::LoaderTimeoutSecs.validate("-1").is_err());
        assert!(ConfigKey::CullingMaxAreaPhotos.validate("lots").is_err());
        assert!(ConfigKey::OrchestratorFollowupPriority
            .validate("-5")
            .is_ok());
    }

    #[test]
    fn test_set_invalid_value_fails() {
        let mut config = ConfigFile::default();

        let result = ConfigKey::LoggingLevel.set(&mut config, "loud");
        assert!(matches!(
            result,
            Err(ConfigKeyError::ValidationFailed { .. })
        ));

        // Config should be unchanged
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_clear_optional_catalog() {
        let mut config = ConfigFile::default();

        ConfigKey::LoaderCatalog
            .set(&mut config, "/data/photos.json")
            .unwrap();
        assert_eq!(
            config.loader.catalog,
            Some(PathBuf::from("/data/photos.json"))
        );

        ConfigKey::LoaderCatalog.set(&mut config, "").unwrap();
        assert!(config.loader.catalog.is_none());
        assert_eq!(ConfigKey::LoaderCatalog.get(&config), "");
    }

    #[test]
    fn test_logging_file_requires_a_path() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::LoggingFile.set(&mut config, "  ").is_err());
    }
}
