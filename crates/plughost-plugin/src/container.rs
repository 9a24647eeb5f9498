// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composition container.
//!
//! The container turns the catalog's current module set into plugin
//! instances. It never refreshes the catalog itself: callers refresh, then
//! compose, then read [`CompositionContainer::plugins`].

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use plughost_core::Plugin;
use tracing::{debug, info, warn};

use crate::catalog::{DirectoryCatalog, ModuleDescriptor};
use crate::loader::LoaderSet;

/// A module the container could not load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedModule {
    /// Path of the module file.
    pub path: PathBuf,
    /// Loader error message.
    pub reason: String,
}

/// A module together with the plugin instance created from it.
#[derive(Clone)]
struct Composed {
    module: ModuleDescriptor,
    plugin: Arc<dyn Plugin>,
}

/// Resolves catalog modules into plugin instances.
pub struct CompositionContainer {
    catalog: Arc<DirectoryCatalog>,
    loaders: LoaderSet,
    composed: ArcSwapOption<Vec<Composed>>,
    rejected: ArcSwap<Vec<RejectedModule>>,
}

impl CompositionContainer {
    /// Create a container over `catalog`. Nothing is composed yet.
    pub fn new(catalog: Arc<DirectoryCatalog>, loaders: LoaderSet) -> Self {
        Self {
            catalog,
            loaders,
            composed: ArcSwapOption::empty(),
            rejected: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Compose plugins from the catalog's current snapshot.
    ///
    /// A module whose file and manifest are unchanged since the last
    /// composition keeps its instance. Modules that fail to load are skipped
    /// and reported by [`CompositionContainer::rejected`].
    pub fn compose(&self) -> Vec<Arc<dyn Plugin>> {
        let modules = self.catalog.modules();
        let previous = self.composed.load_full();
        let mut reusable: HashMap<&PathBuf, &Composed> = previous
            .as_deref()
            .map(|composed| composed.iter().map(|c| (&c.module.path, c)).collect())
            .unwrap_or_default();

        let mut composed = Vec::with_capacity(modules.len());
        let mut rejected = Vec::new();
        let mut loaded = 0usize;

        for module in modules.iter() {
            match reusable.remove(&module.path) {
                Some(existing) if existing.module == *module => {
                    composed.push(existing.clone());
                    continue;
                }
                _ => {}
            }

            match self.loaders.load(module) {
                Ok(plugin) => {
                    debug!(plugin = %plugin.name(), module = %module.path.display(), "composed plugin");
                    loaded += 1;
                    composed.push(Composed {
                        module: module.clone(),
                        plugin,
                    });
                }
                Err(e) => {
                    warn!(module = %module.path.display(), error = %e, "rejected plugin module");
                    rejected.push(RejectedModule {
                        path: module.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            plugins = composed.len(),
            loaded,
            dropped = reusable.len(),
            rejected = rejected.len(),
            "plugin composition complete"
        );

        let plugins = composed.iter().map(|c| c.plugin.clone()).collect();
        self.composed.store(Some(Arc::new(composed)));
        self.rejected.store(Arc::new(rejected));
        plugins
    }

    /// Plugins from the last composition, or `None` if never composed.
    pub fn plugins(&self) -> Option<Vec<Arc<dyn Plugin>>> {
        self.composed
            .load()
            .as_deref()
            .map(|composed| composed.iter().map(|c| c.plugin.clone()).collect())
    }

    /// Returns true once [`CompositionContainer::compose`] has run.
    pub fn is_composed(&self) -> bool {
        self.composed.load().is_some()
    }

    /// Modules rejected by the last composition.
    pub fn rejected(&self) -> Arc<Vec<RejectedModule>> {
        self.rejected.load_full()
    }

    /// The catalog this container composes from.
    pub fn catalog(&self) -> &Arc<DirectoryCatalog> {
        &self.catalog
    }

    /// Loaders used to instantiate modules.
    pub fn loaders(&self) -> &LoaderSet {
        &self.loaders
    }
}

impl fmt::Debug for CompositionContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositionContainer")
            .field("catalog", &self.catalog.path())
            .field("loaders", &self.loaders)
            .field("plugins", &self.composed.load().as_deref().map(Vec::len))
            .field("rejected", &self.rejected.load().len())
            .finish()
    }
}
