//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::SnipConfig;

/// Conventional configuration file name.
pub const CONFIG_FILE: &str = "snip.toml";

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<SnipConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<SnipConfig, ConfigError> {
    let config: SnipConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are consistent.
fn validate_config(config: &SnipConfig) -> Result<(), ConfigError> {
    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.dir must not be empty".to_string(),
        ));
    }
    // Room for at least one leading character plus the "..." placeholder.
    if config.index.title_tail + 4 > config.index.title_width {
        return Err(ConfigError::ValidationError(format!(
            "index.title_tail ({}) leaves no room in index.title_width ({})",
            config.index.title_tail, config.index.title_width
        )));
    }
    config.compiled_patterns()?;
    Ok(())
}
