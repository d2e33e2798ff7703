//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! Every recognised `section.key` is applied through [`ConfigKey::set`], so
//! the file and the `config set` command share one set of validation rules.

use ini::Ini;
use tracing::warn;

use super::file::ConfigFileError;
use super::keys::{ConfigKey, ConfigKeyError};
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
/// Empty values keep the default. Unknown keys are logged and ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    for key in ConfigKey::all() {
        let Some(section) = ini.section(Some(key.section())) else {
            continue;
        };
        let Some(value) = section.get(key.key_name()) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        key.set(&mut config, value)
            .map_err(|e| invalid_value(key, value, e))?;
    }

    for (section, properties) in ini.iter() {
        let Some(section) = section else { continue };
        for (name, _) in properties.iter() {
            let full = format!("{}.{}", section, name);
            if full.parse::<ConfigKey>().is_err() {
                warn!(key = %full, "Ignoring unknown configuration key");
            }
        }
    }

    Ok(config)
}

fn invalid_value(key: &ConfigKey, value: &str, error: ConfigKeyError) -> ConfigFileError {
    let reason = match error {
        ConfigKeyError::ValidationFailed { reason, .. } => reason,
        other => other.to_string(),
    };
    ConfigFileError::InvalidValue {
        section: key.section().to_string(),
        key: key.key_name().to_string(),
        value: value.to_string(),
        reason,
    }
}
