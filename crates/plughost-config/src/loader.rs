// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./plughost.toml` > `~/.config/plughost/plughost.toml` > `/etc/plughost/plughost.toml`
//! with environment variable overrides via `PLUGHOST_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PluginHostConfig;

/// System-wide config file location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/plughost/plughost.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "plughost.toml";

/// Path of the per-user config file, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("plughost").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/plughost/plughost.toml` (system-wide)
/// 3. `~/.config/plughost/plughost.toml` (user XDG config)
/// 4. `./plughost.toml` (local directory)
/// 5. `PLUGHOST_*` environment variables
pub fn load_config() -> Result<PluginHostConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PluginHostConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluginHostConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PluginHostConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluginHostConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PluginHostConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping `PLUGHOST_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PLUGHOST_PLUGINS_WATCH_DEBOUNCE_MS` must map to
/// `plugins.watch_debounce_ms`. The key reaches the mapper in its original
/// upper case, so it is lowercased before the section prefixes are matched.
fn env_provider() -> Env {
    Env::prefixed("PLUGHOST_").map(|key| {
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("host_", "host.", 1)
            .replacen("plugins_", "plugins.", 1)
            .replacen("wasm_", "wasm.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[plugins]
dir = "from-file"
watch_debounce_ms = 250
"#,
            )?;
            jail.set_env("PLUGHOST_PLUGINS_DIR", "from-env");
            jail.set_env("PLUGHOST_WASM_FUEL", "42");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.plugins.dir, "from-env");
            assert_eq!(config.plugins.watch_debounce_ms, 250);
            assert_eq!(config.wasm.fuel, 42);
            Ok(())
        });
    }

    #[test]
    fn env_maps_underscored_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PLUGHOST_PLUGINS_WATCH_DEBOUNCE_MS", "900");
            jail.set_env("PLUGHOST_HOST_LOG_LEVEL", "debug");

            let config = load_config_from_path(Path::new("missing.toml"))?;
            assert_eq!(config.plugins.watch_debounce_ms, 900);
            assert_eq!(config.host.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn env_keys_are_case_insensitive() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PLUGHOST_PLUGINS_RECOMPOSE_ON_REFRESH", "false");
            jail.set_env("plughost_plugins_dir", "lower");

            let config = load_config()?;
            assert!(!config.plugins.recompose_on_refresh);
            assert_eq!(config.plugins.dir, "lower");
            Ok(())
        });
    }

    #[test]
    fn local_file_is_part_of_hierarchy() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(LOCAL_CONFIG_FILE, "[plugins]\nrecompose_on_refresh = false\n")?;
            let config = load_config()?;
            assert!(!config.plugins.recompose_on_refresh);
            Ok(())
        });
    }
}
