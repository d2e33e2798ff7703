//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use super::file::path_to_display;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let catalog = config
        .loader
        .catalog
        .as_ref()
        .map(|p| path_to_display(p))
        .unwrap_or_default();

    format!(
        r#"[culling]
; Maximum photos in the range set, nearest to the focal point first
max_range_photos = {}
; Maximum photos in the area set when a request sends maxPhotos = 0
max_area_photos = {}

[orchestrator]
; Priority of the area job that follows a config change (lower runs first)
followup_priority = {}

[loader]
; Deadline for a single source load in seconds (0 = no deadline)
timeout_secs = {}
; JSON photo catalog served by `hillview run` (optional)
catalog = {}

[logging]
; Session log, truncated at startup
file = {}
; One of: trace, debug, info, warn, error (RUST_LOG overrides)
level = {}
"#,
        config.culling.max_range_photos,
        config.culling.max_area_photos,
        config.orchestrator.followup_priority,
        config.loader.timeout_secs,
        catalog,
        path_to_display(&config.logging.file),
        config.logging.level,
    )
}
