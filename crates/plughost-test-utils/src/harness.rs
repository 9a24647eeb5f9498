// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end plugin host tests.
//!
//! `TestHarness` writes mock and WebAssembly modules into a temporary base
//! directory and builds a [`PluginManager`] over its `Plugins` directory with
//! the [`MockLoader`] installed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use plughost_config::PluginHostConfig;
use plughost_core::{Plugin, PluginHostError};
use plughost_plugin::PluginManager;

use crate::mock_plugin::{MOCK_EXTENSION, MockLoader};

/// A module file to write before the manager is built.
enum Fixture {
    Mock { stem: String, content: String },
    Wasm { stem: String, wat: String },
    Manifest { stem: String, toml: String },
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    fixtures: Vec<Fixture>,
    config: PluginHostConfig,
    defer_composition: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            fixtures: Vec::new(),
            config: PluginHostConfig::default(),
            defer_composition: false,
        }
    }

    /// Add a `<stem>.mock` module with the given content.
    pub fn with_mock_module(mut self, stem: &str, content: &str) -> Self {
        self.fixtures.push(Fixture::Mock {
            stem: stem.to_string(),
            content: content.to_string(),
        });
        self
    }

    /// Add a `<stem>.wasm` module compiled from WebAssembly text.
    pub fn with_wasm_module(mut self, stem: &str, wat: &str) -> Self {
        self.fixtures.push(Fixture::Wasm {
            stem: stem.to_string(),
            wat: wat.to_string(),
        });
        self
    }

    /// Add a `<stem>.toml` sidecar manifest.
    pub fn with_manifest(mut self, stem: &str, toml: &str) -> Self {
        self.fixtures.push(Fixture::Manifest {
            stem: stem.to_string(),
            toml: toml.to_string(),
        });
        self
    }

    /// Set `plugins.recompose_on_refresh` (default `true`).
    pub fn with_recompose_on_refresh(mut self, enabled: bool) -> Self {
        self.config.plugins.recompose_on_refresh = enabled;
        self
    }

    /// Set `plugins.dir` (default `Plugins`).
    pub fn with_plugin_dir(mut self, dir: &str) -> Self {
        self.config.plugins.dir = dir.to_string();
        self
    }

    /// Build the manager without composing.
    pub fn defer_composition(mut self) -> Self {
        self.defer_composition = true;
        self
    }

    /// Write all fixtures and build the manager.
    pub fn build(self) -> Result<TestHarness, PluginHostError> {
        let temp_dir = tempfile::TempDir::new().map_err(|source| PluginHostError::PluginDirectory {
            path: std::env::temp_dir(),
            source,
        })?;

        let mut config = self.config;
        config.plugins.base_dir = Some(temp_dir.path().display().to_string());
        let plugin_dir = config.plugins.resolve_dir(temp_dir.path());

        if !self.fixtures.is_empty() {
            std::fs::create_dir_all(&plugin_dir).map_err(|source| PluginHostError::PluginDirectory {
                path: plugin_dir.clone(),
                source,
            })?;
            for fixture in &self.fixtures {
                write_fixture(&plugin_dir, fixture)?;
            }
        }

        let loader = MockLoader::new();
        let loads = loader.load_counter();
        let registrations = loader.registration_counter();

        let mut builder = PluginManager::builder(config.clone()).loader(loader);
        if self.defer_composition {
            builder = builder.defer_composition();
        }
        let manager = builder.build()?;

        Ok(TestHarness {
            manager,
            config,
            loads,
            registrations,
            temp_dir,
        })
    }
}

/// A temporary plugin directory with a ready [`PluginManager`].
pub struct TestHarness {
    /// The manager under test.
    pub manager: PluginManager,
    /// Configuration the manager was built with.
    pub config: PluginHostConfig,
    loads: Arc<AtomicUsize>,
    registrations: Arc<AtomicUsize>,
    /// Temp directory kept alive for cleanup on drop.
    temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one build of the plugin service provider.
    pub fn build(&mut self) -> Result<Option<Vec<Arc<dyn Plugin>>>, PluginHostError> {
        self.manager.build_plugin_service_provider()
    }

    /// The resolved plugin directory.
    pub fn plugin_dir(&self) -> &Path {
        self.manager.plugin_dir()
    }

    /// Temporary base directory.
    pub fn base_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Add a mock module after construction.
    pub fn add_mock_module(&self, stem: &str, content: &str) -> Result<PathBuf, PluginHostError> {
        write_fixture(
            self.plugin_dir(),
            &Fixture::Mock {
                stem: stem.to_string(),
                content: content.to_string(),
            },
        )
    }

    /// Add a WebAssembly module after construction.
    pub fn add_wasm_module(&self, stem: &str, wat: &str) -> Result<PathBuf, PluginHostError> {
        write_fixture(
            self.plugin_dir(),
            &Fixture::Wasm {
                stem: stem.to_string(),
                wat: wat.to_string(),
            },
        )
    }

    /// Delete a module file by file name.
    pub fn remove_module(&self, file_name: &str) -> Result<(), PluginHostError> {
        let path = self.plugin_dir().join(file_name);
        std::fs::remove_file(&path).map_err(|source| PluginHostError::PluginDirectory { path, source })
    }

    /// Move a module's modification time a minute past its current value, so
    /// the next composition treats it as rebuilt.
    pub fn touch_module(&self, file_name: &str) -> Result<(), PluginHostError> {
        let path = self.plugin_dir().join(file_name);
        let io_error = |source: std::io::Error| PluginHostError::PluginDirectory {
            path: path.clone(),
            source,
        };
        let file = std::fs::File::options()
            .write(true)
            .open(&path)
            .map_err(io_error)?;
        let modified = file.metadata().and_then(|m| m.modified()).map_err(io_error)?;
        file.set_modified(modified + Duration::from_secs(60))
            .map_err(io_error)
    }

    /// Number of mock modules loaded so far.
    pub fn mock_loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of mock `register_services` calls so far.
    pub fn mock_registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

fn write_fixture(dir: &Path, fixture: &Fixture) -> Result<PathBuf, PluginHostError> {
    let (path, bytes) = match fixture {
        Fixture::Mock { stem, content } => (
            dir.join(format!("{stem}.{MOCK_EXTENSION}")),
            content.as_bytes().to_vec(),
        ),
        Fixture::Wasm { stem, wat } => {
            let bytes = wat::parse_str(wat)
                .map_err(|e| PluginHostError::Internal(format!("invalid wat for '{stem}': {e}")))?;
            (dir.join(format!("{stem}.wasm")), bytes)
        }
        Fixture::Manifest { stem, toml } => (dir.join(format!("{stem}.toml")), toml.as_bytes().to_vec()),
    };

    std::fs::write(&path, bytes).map_err(|source| PluginHostError::PluginDirectory {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
