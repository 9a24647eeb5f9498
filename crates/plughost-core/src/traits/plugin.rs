// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The contract every plugin implements.

use crate::error::PluginHostError;
use crate::registry::ServiceRegistry;

/// A dynamically discovered unit of code that contributes services to the host.
///
/// Plugins are produced by a module loader when the composition container
/// resolves the catalog. The host calls [`Plugin::register_services`] at most
/// once per plugin name per registry; a plugin may add any number of
/// registrations but has no way to remove or replace existing ones.
pub trait Plugin: Send + Sync + 'static {
    /// Returns the name of this plugin, unique among loaded plugins.
    fn name(&self) -> &str;

    /// Returns the semantic version of this plugin.
    fn version(&self) -> semver::Version;

    /// Adds this plugin's services to the shared registry.
    ///
    /// An error aborts the current refresh cycle and is returned to the host
    /// unchanged.
    fn register_services(&self, services: &mut ServiceRegistry) -> Result<(), PluginHostError>;
}
