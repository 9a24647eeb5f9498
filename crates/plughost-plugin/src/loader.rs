// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module loaders turn discovered module files into plugin instances.

use std::fmt;
use std::sync::Arc;

use plughost_core::{Plugin, PluginHostError};

use crate::catalog::ModuleDescriptor;

/// Loads one kind of module file (identified by extension) into a plugin.
pub trait ModuleLoader: Send + Sync {
    /// Lower-case file extension this loader handles, without the dot.
    fn extension(&self) -> &str;

    /// Instantiate the plugin contained in `module`.
    fn load(&self, module: &ModuleDescriptor) -> Result<Arc<dyn Plugin>, PluginHostError>;
}

/// The set of loaders available to a container, keyed by extension.
#[derive(Default)]
pub struct LoaderSet {
    loaders: Vec<Box<dyn ModuleLoader>>,
}

impl LoaderSet {
    /// Create an empty loader set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a loader. A loader for an extension that is already handled is ignored.
    pub fn with(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.push(Box::new(loader));
        self
    }

    /// Add a boxed loader, ignoring it if its extension is already handled.
    pub fn push(&mut self, loader: Box<dyn ModuleLoader>) {
        let extension = loader.extension().to_ascii_lowercase();
        if self.for_extension(&extension).is_none() {
            self.loaders.push(loader);
        } else {
            tracing::warn!(extension = %extension, "duplicate module loader ignored");
        }
    }

    /// Extensions handled by this set, in registration order.
    pub fn extensions(&self) -> Vec<String> {
        self.loaders
            .iter()
            .map(|l| l.extension().to_ascii_lowercase())
            .collect()
    }

    /// Find the loader for `extension` (case-insensitive).
    pub fn for_extension(&self, extension: &str) -> Option<&dyn ModuleLoader> {
        self.loaders
            .iter()
            .find(|l| l.extension().eq_ignore_ascii_case(extension))
            .map(|l| l.as_ref())
    }

    /// Load `module` with the loader owning its extension.
    pub fn load(&self, module: &ModuleDescriptor) -> Result<Arc<dyn Plugin>, PluginHostError> {
        let loader = self
            .for_extension(&module.extension)
            .ok_or_else(|| PluginHostError::ModuleLoad {
                module: module.path.clone(),
                message: format!("no loader for extension '{}'", module.extension),
            })?;
        loader.load(module)
    }

    /// Returns the number of loaders.
    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    /// Returns true if no loader is registered.
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}

impl fmt::Debug for LoaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderSet")
            .field("extensions", &self.extensions())
            .finish()
    }
}
