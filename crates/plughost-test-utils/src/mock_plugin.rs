// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock plugins and a loader for `*.mock` module files.
//!
//! A mock module is a text file with one service key per line. Blank lines and
//! lines starting with `#` are ignored. A `!fail` line makes the plugin's
//! registration return an error after it has added its services.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use plughost_core::{Plugin, PluginHostError, ServiceRegistry};
use plughost_plugin::{ModuleDescriptor, ModuleLoader};

/// File extension handled by [`MockLoader`].
pub const MOCK_EXTENSION: &str = "mock";

/// Directive that makes a mock module fail registration.
const FAIL_DIRECTIVE: &str = "!fail";

/// Service registered by a [`MockPlugin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockService {
    pub plugin: String,
    pub key: String,
}

/// A native plugin that registers a fixed list of service keys.
pub struct MockPlugin {
    name: String,
    version: semver::Version,
    keys: Vec<String>,
    fail: bool,
    registrations: Arc<AtomicUsize>,
}

impl MockPlugin {
    /// Create a plugin with no services.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: semver::Version::new(0, 1, 0),
            keys: Vec::new(),
            fail: false,
            registrations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a service key to register.
    pub fn with_service(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    /// Set the plugin version.
    pub fn with_version(mut self, version: semver::Version) -> Self {
        self.version = version;
        self
    }

    /// Make every registration attempt fail once its services are added.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Share a registration counter with other plugins.
    fn with_counter(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.registrations = counter;
        self
    }

    /// Number of `register_services` calls so far.
    pub fn registration_count(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }
}

impl Plugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        self.version.clone()
    }

    fn register_services(&self, services: &mut ServiceRegistry) -> Result<(), PluginHostError> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        for key in &self.keys {
            services.add_singleton(
                key.clone(),
                Arc::new(MockService {
                    plugin: self.name.clone(),
                    key: key.clone(),
                }),
            );
        }
        if self.fail {
            return Err(PluginHostError::registration(&self.name, "mock registration failure"));
        }
        Ok(())
    }
}

/// Loads `*.mock` files into [`MockPlugin`]s.
#[derive(Default)]
pub struct MockLoader {
    loads: Arc<AtomicUsize>,
    registrations: Arc<AtomicUsize>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counter of modules loaded by this loader.
    pub fn load_counter(&self) -> Arc<AtomicUsize> {
        self.loads.clone()
    }

    /// Counter of `register_services` calls across all loaded mock plugins.
    pub fn registration_counter(&self) -> Arc<AtomicUsize> {
        self.registrations.clone()
    }
}

impl ModuleLoader for MockLoader {
    fn extension(&self) -> &str {
        MOCK_EXTENSION
    }

    fn load(&self, module: &ModuleDescriptor) -> Result<Arc<dyn Plugin>, PluginHostError> {
        let content = std::fs::read_to_string(&module.path).map_err(|e| PluginHostError::ModuleLoad {
            module: module.path.clone(),
            message: e.to_string(),
        })?;
        self.loads.fetch_add(1, Ordering::SeqCst);

        let mut plugin = MockPlugin::new(module.plugin_name()).with_counter(self.registrations.clone());
        if let Some(manifest) = &module.manifest {
            plugin = plugin.with_version(manifest.version.clone());
        }
        for line in content.lines().map(str::trim) {
            match line {
                "" => {}
                l if l.starts_with('#') => {}
                FAIL_DIRECTIVE => plugin = plugin.failing(),
                key => plugin = plugin.with_service(key),
            }
        }

        tracing::debug!(plugin = %plugin.name(), services = plugin.keys.len(), "loaded mock plugin");
        Ok(Arc::new(plugin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn descriptor(path: PathBuf) -> ModuleDescriptor {
        ModuleDescriptor {
            stem: path.file_stem().unwrap().to_string_lossy().into_owned(),
            extension: MOCK_EXTENSION.to_string(),
            path,
            manifest: None,
            modified: None,
        }
    }

    #[test]
    fn plugin_registers_its_keys() {
        let plugin = MockPlugin::new("p").with_service("a").with_service("b");
        let mut services = ServiceRegistry::new();
        plugin.register_services(&mut services).unwrap();

        assert_eq!(services.len(), 2);
        let a = services.resolve::<MockService>(&"a".into()).unwrap();
        assert_eq!(a.plugin, "p");
        assert_eq!(plugin.registration_count(), 1);
    }

    #[test]
    fn failing_plugin_errors_after_adding() {
        let plugin = MockPlugin::new("p").with_service("a").failing();
        let mut services = ServiceRegistry::new();
        assert!(plugin.register_services(&mut services).is_err());
        assert!(services.contains(&"a".into()));
    }

    #[test]
    fn loader_parses_module_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greeter.mock");
        std::fs::write(&path, "# services\ngreeter.hello\n\ngreeter.bye\n").unwrap();

        let loader = MockLoader::new();
        let plugin = loader.load(&descriptor(path)).unwrap();
        assert_eq!(plugin.name(), "greeter");

        let mut services = ServiceRegistry::new();
        plugin.register_services(&mut services).unwrap();
        let keys: Vec<&str> = services.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["greeter.hello", "greeter.bye"]);
        assert_eq!(loader.load_counter().load(Ordering::SeqCst), 1);
        assert_eq!(loader.registration_counter().load(Ordering::SeqCst), 1);
    }

    #[test]
    fn loader_honours_fail_directive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.mock");
        std::fs::write(&path, "broken.service\n!fail\n").unwrap();

        let plugin = MockLoader::new().load(&descriptor(path)).unwrap();
        let mut services = ServiceRegistry::new();
        let err = plugin.register_services(&mut services).unwrap_err();
        assert!(err.to_string().contains("broken"));
        assert_eq!(services.len(), 1);
    }
}
