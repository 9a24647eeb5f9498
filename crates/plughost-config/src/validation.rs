// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::PluginHostConfig;

/// Log levels accepted by `host.log_level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &PluginHostConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.plugins.dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "plugins.dir must not be empty".to_string(),
        });
    }

    if matches!(&config.plugins.base_dir, Some(base) if base.trim().is_empty()) {
        errors.push(ConfigError::Validation {
            message: "plugins.base_dir must not be empty when set".to_string(),
        });
    }

    if config.plugins.watch_debounce_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "plugins.watch_debounce_ms must be greater than 0".to_string(),
        });
    }

    let level = config.host.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "host.log_level `{}` is not one of: {}",
                config.host.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.wasm.fuel == 0 {
        errors.push(ConfigError::Validation {
            message: "wasm.fuel must be greater than 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(errors: &[ConfigError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&PluginHostConfig::default()).is_ok());
    }

    #[test]
    fn empty_dir_fails_validation() {
        let mut config = PluginHostConfig::default();
        config.plugins.dir = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("plugins.dir")));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = PluginHostConfig::default();
        config.host.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(messages(&errors).iter().any(|m| m.contains("verbose")));
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = PluginHostConfig::default();
        config.host.log_level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = PluginHostConfig::default();
        config.wasm.fuel = 0;
        config.plugins.watch_debounce_ms = 0;
        config.plugins.base_dir = Some(String::new());
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
