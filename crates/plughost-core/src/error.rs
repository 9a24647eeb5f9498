// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the plughost plugin host.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across discovery, composition, and registration.
#[derive(Debug, Error)]
pub enum PluginHostError {
    /// The plugin directory could not be created or read.
    #[error("plugin directory {}: {source}", path.display())]
    PluginDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The catalog cannot be built over the given path (missing, not a directory).
    #[error("plugin catalog {}: {message}", path.display())]
    Catalog { path: PathBuf, message: String },

    /// A module file could not be turned into a plugin instance.
    #[error("failed to load module {}: {message}", module.display())]
    ModuleLoad { module: PathBuf, message: String },

    /// A sidecar manifest is malformed.
    #[error("invalid plugin manifest {}: {message}", path.display())]
    Manifest { path: PathBuf, message: String },

    /// A plugin's service registration failed.
    #[error("plugin '{plugin}' failed to register services: {message}")]
    Registration { plugin: String, message: String },

    /// Configuration errors surfaced outside the config crate's diagnostics.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PluginHostError {
    /// Shorthand for a [`PluginHostError::Registration`] error.
    pub fn registration(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Registration {
            plugin: plugin.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors that abort host startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PluginHostError::PluginDirectory { .. } | PluginHostError::Catalog { .. }
        )
    }
}
