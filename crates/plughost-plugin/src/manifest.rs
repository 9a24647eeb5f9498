// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sidecar manifest parsing.
//!
//! A module `greeter.wasm` may ship a `greeter.toml` next to it describing the
//! plugin's name, version, and resource budget. Without a manifest the plugin
//! is named after the module's file stem.

use std::path::{Path, PathBuf};

use plughost_core::PluginHostError;
use serde::Deserialize;

/// File extension of sidecar manifests.
pub const MANIFEST_EXTENSION: &str = "toml";

/// Parsed sidecar manifest describing a plugin module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginManifest {
    /// Plugin name, unique among loaded plugins.
    pub name: String,
    /// Semantic version of the plugin.
    pub version: semver::Version,
    /// Human-readable description.
    pub description: Option<String>,
    /// Optional author identifier.
    pub author: Option<String>,
    /// Fuel budget for registration, overriding `wasm.fuel`.
    pub fuel: Option<u64>,
}

/// Intermediate TOML deserialization struct for the manifest file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    plugin: PluginSection,
}

/// The `[plugin]` section.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PluginSection {
    name: String,
    version: String,
    description: Option<String>,
    author: Option<String>,
    fuel: Option<u64>,
}

/// Path of the sidecar manifest belonging to `module`.
pub fn manifest_path_for(module: &Path) -> PathBuf {
    module.with_extension(MANIFEST_EXTENSION)
}

/// Parse a manifest from TOML content. `path` is only used for error context.
///
/// Validates that the name is non-empty and the version is valid semver.
pub fn parse_plugin_manifest(path: &Path, toml_content: &str) -> Result<PluginManifest, PluginHostError> {
    let invalid = |message: String| PluginHostError::Manifest {
        path: path.to_path_buf(),
        message,
    };

    let file: ManifestFile = toml::from_str(toml_content).map_err(|e| invalid(e.to_string()))?;
    let section = file.plugin;

    if section.name.trim().is_empty() {
        return Err(invalid("name must not be empty".to_string()));
    }

    if section.version.trim().is_empty() {
        return Err(invalid("version must not be empty".to_string()));
    }

    let version = semver::Version::parse(section.version.trim())
        .map_err(|e| invalid(format!("invalid version '{}': {e}", section.version)))?;

    if section.fuel == Some(0) {
        return Err(invalid("fuel must be greater than 0".to_string()));
    }

    Ok(PluginManifest {
        name: section.name.trim().to_string(),
        version,
        description: section.description,
        author: section.author,
        fuel: section.fuel,
    })
}

/// Load the sidecar manifest for `module`, if one exists.
pub fn load_sidecar_manifest(module: &Path) -> Result<Option<PluginManifest>, PluginHostError> {
    let path = manifest_path_for(module);
    if !path.is_file() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path).map_err(|e| PluginHostError::Manifest {
        path: path.clone(),
        message: e.to_string(),
    })?;
    parse_plugin_manifest(&path, &content).map(Some)
}
