// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manager: the host-facing entry point.
//!
//! Construction resolves and creates the plugin directory, builds the catalog
//! and container, composes once, and seeds the service registry with the
//! catalog and container. [`PluginManager::build_plugin_service_provider`]
//! then refreshes, (re)composes, and lets each plugin register its services
//! exactly once. A plugin registers into a staged copy of the registry, which
//! replaces the shared one only when registration succeeds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use plughost_config::PluginHostConfig;
use plughost_core::{Plugin, PluginHostError, PluginRecord, ServiceKey, ServiceRegistry};
use tracing::{debug, info};

use crate::catalog::DirectoryCatalog;
use crate::container::CompositionContainer;
use crate::loader::{LoaderSet, ModuleLoader};
use crate::wasm::WasmModuleLoader;

/// Owns the plugin catalog, the composition container, and the service registry.
pub struct PluginManager {
    plugin_dir: PathBuf,
    recompose_on_refresh: bool,
    catalog: Arc<DirectoryCatalog>,
    container: Arc<CompositionContainer>,
    services: ServiceRegistry,
    /// Instance that last registered under each plugin name.
    registered: HashMap<String, Arc<dyn Plugin>>,
}

impl PluginManager {
    /// Construct a manager with the default WebAssembly loader and compose once.
    pub fn new(config: &PluginHostConfig) -> Result<Self, PluginHostError> {
        Self::builder(config.clone()).build()
    }

    /// Start building a manager with custom loaders or base directory.
    pub fn builder(config: PluginHostConfig) -> PluginManagerBuilder {
        PluginManagerBuilder {
            config,
            loaders: LoaderSet::new(),
            base_dir: None,
            defer_composition: false,
        }
    }

    /// Refresh the catalog, compose, and register every plugin's services.
    ///
    /// Returns `Ok(None)` if the container has never composed. Plugins whose
    /// services are already registered are skipped, unless the container has
    /// reloaded the module since. A registration failure is returned
    /// immediately, leaves the registry untouched, and that plugin is retried
    /// on the next call.
    pub fn build_plugin_service_provider(
        &mut self,
    ) -> Result<Option<Vec<Arc<dyn Plugin>>>, PluginHostError> {
        let Some(composed) = self.container.plugins() else {
            debug!("plugin container not composed, no plugins to register");
            return Ok(None);
        };

        self.catalog.refresh()?;
        let plugins = if self.recompose_on_refresh {
            self.container.compose()
        } else {
            composed
        };

        for plugin in &plugins {
            let marker = ServiceKey::plugin(plugin.name());
            let reloaded = self.is_reloaded(plugin, &plugins);
            if self.services.contains(&marker) && !reloaded {
                debug!(plugin = %plugin.name(), "plugin services already registered, skipping");
                continue;
            }

            let mut staged = self.services.clone();
            plugin.register_services(&mut staged)?;
            let added = staged.len() - self.services.len();

            staged.add_singleton(
                marker,
                Arc::new(PluginRecord {
                    name: plugin.name().to_string(),
                    version: plugin.version(),
                }),
            );
            self.services = staged;
            self.registered
                .insert(plugin.name().to_string(), Arc::clone(plugin));
            info!(
                plugin = %plugin.name(),
                version = %plugin.version(),
                services = added,
                reloaded,
                "plugin services registered"
            );
        }

        Ok(Some(plugins))
    }

    /// True when `plugin` replaces the instance that registered under its
    /// name and that instance is no longer composed. A second module sharing
    /// the name of a live plugin is not a reload.
    fn is_reloaded(&self, plugin: &Arc<dyn Plugin>, current: &[Arc<dyn Plugin>]) -> bool {
        match self.registered.get(plugin.name()) {
            Some(previous) => {
                !Arc::ptr_eq(previous, plugin) && !current.iter().any(|p| Arc::ptr_eq(p, previous))
            }
            None => false,
        }
    }

    /// The shared service registry.
    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// The plugin catalog (also registered under [`ServiceKey::CATALOG`]).
    pub fn catalog(&self) -> &Arc<DirectoryCatalog> {
        &self.catalog
    }

    /// The composition container (also registered under [`ServiceKey::CONTAINER`]).
    pub fn container(&self) -> &Arc<CompositionContainer> {
        &self.container
    }

    /// The resolved plugin directory.
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Whether a build recomposes after refreshing the catalog.
    pub fn recompose_on_refresh(&self) -> bool {
        self.recompose_on_refresh
    }
}

/// Builder for [`PluginManager`].
pub struct PluginManagerBuilder {
    config: PluginHostConfig,
    loaders: LoaderSet,
    base_dir: Option<PathBuf>,
    defer_composition: bool,
}

impl PluginManagerBuilder {
    /// Add a module loader. It takes precedence over the built-in WebAssembly
    /// loader for the same extension.
    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// Base directory used when `plugins.base_dir` is not configured,
    /// instead of the running executable's directory.
    pub fn base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Skip the initial composition. Builds return `None` until
    /// [`CompositionContainer::compose`] is called.
    pub fn defer_composition(mut self) -> Self {
        self.defer_composition = true;
        self
    }

    /// Resolve the plugin directory and assemble the manager.
    pub fn build(self) -> Result<PluginManager, PluginHostError> {
        let fallback_base = match self.base_dir {
            Some(dir) => dir,
            None => executable_dir()?,
        };
        let plugin_dir = self.config.plugins.resolve_dir(&fallback_base);
        ensure_plugin_dir(&plugin_dir)?;

        let mut loaders = self.loaders;
        loaders.push(Box::new(WasmModuleLoader::new(&self.config.wasm)?));

        let catalog = Arc::new(DirectoryCatalog::new(&plugin_dir, loaders.extensions())?);
        let container = Arc::new(CompositionContainer::new(catalog.clone(), loaders));
        if !self.defer_composition {
            container.compose();
        }

        let mut services = ServiceRegistry::new();
        services.add_singleton(ServiceKey::CATALOG, catalog.clone());
        services.add_singleton(ServiceKey::CONTAINER, container.clone());

        info!(
            plugin_dir = %plugin_dir.display(),
            recompose_on_refresh = self.config.plugins.recompose_on_refresh,
            deferred = self.defer_composition,
            "plugin manager ready"
        );

        Ok(PluginManager {
            plugin_dir,
            recompose_on_refresh: self.config.plugins.recompose_on_refresh,
            catalog,
            container,
            services,
            registered: HashMap::new(),
        })
    }
}

/// Directory containing the running executable.
fn executable_dir() -> Result<PathBuf, PluginHostError> {
    let exe = std::env::current_exe().map_err(|e| {
        PluginHostError::Internal(format!("cannot locate running executable: {e}"))
    })?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| PluginHostError::Internal(format!("executable {} has no parent", exe.display())))
}

/// Create the plugin directory if it does not exist.
fn ensure_plugin_dir(dir: &Path) -> Result<(), PluginHostError> {
    if dir.is_dir() {
        return Ok(());
    }
    std::fs::create_dir_all(dir).map_err(|source| PluginHostError::PluginDirectory {
        path: dir.to_path_buf(),
        source,
    })?;
    info!(path = %dir.display(), "created plugin directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleDescriptor;

    fn config_for(base: &Path) -> PluginHostConfig {
        let mut config = PluginHostConfig::default();
        config.plugins.base_dir = Some(base.display().to_string());
        config
    }

    struct KeyPlugin(String);

    impl Plugin for KeyPlugin {
        fn name(&self) -> &str {
            &self.0
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn register_services(&self, services: &mut ServiceRegistry) -> Result<(), PluginHostError> {
            services.add_singleton(format!("{}.service", self.0), Arc::new(self.0.clone()));
            Ok(())
        }
    }

    struct KeyLoader;

    impl ModuleLoader for KeyLoader {
        fn extension(&self) -> &str {
            "key"
        }

        fn load(&self, module: &ModuleDescriptor) -> Result<Arc<dyn Plugin>, PluginHostError> {
            Ok(Arc::new(KeyPlugin(module.plugin_name().to_string())))
        }
    }

    #[test]
    fn creates_missing_plugin_dir() {
        let base = tempfile::tempdir().unwrap();
        let manager = PluginManager::new(&config_for(base.path())).unwrap();
        assert_eq!(manager.plugin_dir(), base.path().join("Plugins"));
        assert!(manager.plugin_dir().is_dir());
    }

    #[test]
    fn builder_base_dir_is_the_fallback() {
        let base = tempfile::tempdir().unwrap();
        let manager = PluginManager::builder(PluginHostConfig::default())
            .base_dir(base.path())
            .build()
            .unwrap();
        assert_eq!(manager.plugin_dir(), base.path().join("Plugins"));
    }

    #[test]
    fn seeds_catalog_and_container() {
        let base = tempfile::tempdir().unwrap();
        let manager = PluginManager::new(&config_for(base.path())).unwrap();

        let services = manager.services();
        assert_eq!(services.len(), 2);
        let catalog = services.resolve::<DirectoryCatalog>(&ServiceKey::CATALOG).unwrap();
        assert!(Arc::ptr_eq(&catalog, manager.catalog()));
        let container = services
            .resolve::<CompositionContainer>(&ServiceKey::CONTAINER)
            .unwrap();
        assert!(Arc::ptr_eq(&container, manager.container()));
    }

    #[test]
    fn plugin_dir_that_is_a_file_is_fatal() {
        let base = tempfile::tempdir().unwrap();
        std::fs::write(base.path().join("Plugins"), b"").unwrap();
        let err = PluginManager::new(&config_for(base.path())).err().unwrap();
        assert!(err.is_fatal());
    }

    #[test]
    fn registers_each_plugin_once() {
        let base = tempfile::tempdir().unwrap();
        let plugins = base.path().join("Plugins");
        std::fs::create_dir(&plugins).unwrap();
        std::fs::write(plugins.join("a.key"), b"").unwrap();
        std::fs::write(plugins.join("b.key"), b"").unwrap();

        let mut manager = PluginManager::builder(config_for(base.path()))
            .loader(KeyLoader)
            .build()
            .unwrap();

        let first = manager.build_plugin_service_provider().unwrap().unwrap();
        assert_eq!(first.len(), 2);
        let services = manager.services();
        assert!(services.contains(&"a.service".into()));
        assert!(services.contains(&"b.service".into()));
        let record = services
            .resolve::<PluginRecord>(&ServiceKey::plugin("a"))
            .unwrap();
        assert_eq!(record.version, semver::Version::new(0, 1, 0));

        let size = manager.services().len();
        manager.build_plugin_service_provider().unwrap();
        assert_eq!(manager.services().len(), size);
    }

    /// Adds `half.first`, then fails.
    struct HalfPlugin;

    impl Plugin for HalfPlugin {
        fn name(&self) -> &str {
            "half"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }

        fn register_services(&self, services: &mut ServiceRegistry) -> Result<(), PluginHostError> {
            services.add_singleton("half.first", Arc::new(1u32));
            Err(PluginHostError::registration("half", "second service unavailable"))
        }
    }

    struct HalfLoader;

    impl ModuleLoader for HalfLoader {
        fn extension(&self) -> &str {
            "half"
        }

        fn load(&self, _module: &ModuleDescriptor) -> Result<Arc<dyn Plugin>, PluginHostError> {
            Ok(Arc::new(HalfPlugin))
        }
    }

    #[test]
    fn failed_registration_leaves_registry_untouched() {
        let base = tempfile::tempdir().unwrap();
        let plugins = base.path().join("Plugins");
        std::fs::create_dir(&plugins).unwrap();
        std::fs::write(plugins.join("a.key"), b"").unwrap();
        std::fs::write(plugins.join("half.half"), b"").unwrap();

        let mut manager = PluginManager::builder(config_for(base.path()))
            .loader(KeyLoader)
            .loader(HalfLoader)
            .build()
            .unwrap();

        let err = manager.build_plugin_service_provider().err().unwrap();
        assert!(matches!(err, PluginHostError::Registration { ref plugin, .. } if plugin == "half"));

        let services = manager.services();
        assert!(!services.contains(&"half.first".into()));
        assert!(!services.contains(&ServiceKey::plugin("half")));
        // `a` sorts first and keeps its registration.
        assert!(services.contains(&"a.service".into()));
        assert!(services.contains(&ServiceKey::plugin("a")));
        assert_eq!(services.len(), 4);
    }

    #[test]
    fn replaced_instance_registers_again() {
        let base = tempfile::tempdir().unwrap();
        let plugins = base.path().join("Plugins");
        std::fs::create_dir(&plugins).unwrap();
        let module = plugins.join("a.key");
        std::fs::write(&module, b"").unwrap();

        let mut manager = PluginManager::builder(config_for(base.path()))
            .loader(KeyLoader)
            .build()
            .unwrap();
        let first = manager.build_plugin_service_provider().unwrap().unwrap();
        assert!(!manager.is_reloaded(&first[0], &first));

        let later = std::time::SystemTime::now() + std::time::Duration::from_secs(60);
        std::fs::File::options()
            .write(true)
            .open(&module)
            .unwrap()
            .set_modified(later)
            .unwrap();

        manager.catalog().refresh().unwrap();
        let second = manager.container().compose();
        assert!(!Arc::ptr_eq(&first[0], &second[0]));
        assert!(manager.is_reloaded(&second[0], &second));

        let size = manager.services().len();
        manager.build_plugin_service_provider().unwrap();
        assert_eq!(manager.services().len(), size);
        assert!(!manager.is_reloaded(&second[0], &second));
    }

    #[test]
    fn deferred_manager_builds_nothing() {
        let base = tempfile::tempdir().unwrap();
        let mut manager = PluginManager::builder(config_for(base.path()))
            .defer_composition()
            .build()
            .unwrap();

        assert!(manager.build_plugin_service_provider().unwrap().is_none());
        assert_eq!(manager.services().len(), 2);

        manager.container().compose();
        assert_eq!(manager.build_plugin_service_provider().unwrap().map(|p| p.len()), Some(0));
    }
}
