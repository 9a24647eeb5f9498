// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the plugin host.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a misspelled key
//! is rejected at startup instead of silently falling back to a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level plugin host configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginHostConfig {
    /// Host process settings.
    #[serde(default)]
    pub host: HostConfig,

    /// Plugin discovery settings.
    #[serde(default)]
    pub plugins: PluginsConfig,

    /// WebAssembly module settings.
    #[serde(default)]
    pub wasm: WasmConfig,
}

/// Host process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Plugin discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginsConfig {
    /// Plugin directory, resolved against `base_dir` when relative.
    #[serde(default = "default_plugin_dir")]
    pub dir: String,

    /// Base directory for a relative `dir`. Defaults to the directory of the
    /// running executable.
    #[serde(default)]
    pub base_dir: Option<String>,

    /// Recompose the container after every catalog refresh so that modules
    /// added after startup are picked up. `false` keeps the set composed at
    /// startup.
    #[serde(default = "default_recompose_on_refresh")]
    pub recompose_on_refresh: bool,

    /// Debounce window for `plughost watch`, in milliseconds.
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            dir: default_plugin_dir(),
            base_dir: None,
            recompose_on_refresh: default_recompose_on_refresh(),
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

impl PluginsConfig {
    /// Resolve the plugin directory against `base_dir`, or against
    /// `fallback_base` when no base directory is configured.
    pub fn resolve_dir(&self, fallback_base: &Path) -> PathBuf {
        let dir = Path::new(&self.dir);
        if dir.is_absolute() {
            return dir.to_path_buf();
        }
        match &self.base_dir {
            Some(base) => Path::new(base).join(dir),
            None => fallback_base.join(dir),
        }
    }
}

fn default_plugin_dir() -> String {
    "Plugins".to_string()
}

fn default_recompose_on_refresh() -> bool {
    true
}

fn default_watch_debounce_ms() -> u64 {
    500
}

/// WebAssembly module configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WasmConfig {
    /// Fuel budget for a single `register_services` call.
    #[serde(default = "default_fuel")]
    pub fuel: u64,
}

impl Default for WasmConfig {
    fn default() -> Self {
        Self {
            fuel: default_fuel(),
        }
    }
}

fn default_fuel() -> u64 {
    10_000_000
}
