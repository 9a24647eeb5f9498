// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the service registry and the plugin contract.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Prefix of the marker keys recorded once a plugin's services are registered.
const PLUGIN_MARKER_PREFIX: &str = "plughost.plugin/";

/// Identifies the shape of a service in the [`ServiceRegistry`](crate::ServiceRegistry).
///
/// Keys are explicit names chosen by whoever registers the service; the
/// registry never derives identity from Rust types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceKey(Cow<'static, str>);

impl ServiceKey {
    /// Key under which the manager registers its plugin catalog.
    pub const CATALOG: ServiceKey = ServiceKey(Cow::Borrowed("plughost.catalog"));

    /// Key under which the manager registers its composition container.
    pub const CONTAINER: ServiceKey = ServiceKey(Cow::Borrowed("plughost.container"));

    /// Create a key from any string.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Marker key recording that the plugin named `name` has registered its services.
    pub fn plugin(name: &str) -> Self {
        Self(Cow::Owned(format!("{PLUGIN_MARKER_PREFIX}{name}")))
    }

    /// Returns true if this is a per-plugin marker key.
    pub fn is_plugin_marker(&self) -> bool {
        self.0.starts_with(PLUGIN_MARKER_PREFIX)
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&'static str> for ServiceKey {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for ServiceKey {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// A type-erased service instance.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Produces a service instance on demand.
pub type ServiceFactory = Arc<dyn Fn() -> ServiceInstance + Send + Sync>;

/// How a registered service is obtained.
#[derive(Clone)]
pub enum ServiceProvider {
    /// One shared instance handed out on every resolution.
    Singleton(ServiceInstance),
    /// A factory invoked on every resolution.
    Factory(ServiceFactory),
}

impl ServiceProvider {
    /// Obtain an instance from this provider.
    pub fn instance(&self) -> ServiceInstance {
        match self {
            ServiceProvider::Singleton(instance) => Arc::clone(instance),
            ServiceProvider::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceProvider::Singleton(_) => f.write_str("Singleton"),
            ServiceProvider::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// A single (key, provider) pair in the registry.
#[derive(Debug, Clone)]
pub struct ServiceRegistration {
    pub key: ServiceKey,
    pub provider: ServiceProvider,
}

impl ServiceRegistration {
    pub fn new(key: impl Into<ServiceKey>, provider: ServiceProvider) -> Self {
        Self {
            key: key.into(),
            provider,
        }
    }

    /// A registration backed by a single shared instance.
    pub fn singleton<T: Any + Send + Sync>(key: impl Into<ServiceKey>, instance: Arc<T>) -> Self {
        Self::new(key, ServiceProvider::Singleton(instance))
    }
}

/// Provider stored under a plugin's marker key once its services are registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRecord {
    pub name: String,
    pub version: semver::Version,
}
