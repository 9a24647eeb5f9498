// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the plughost plugin host.
//!
//! This crate provides the plugin contract, the shared service registry, and
//! the error type used throughout the workspace. Plugin authors depend only on
//! this crate.

pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PluginHostError;
pub use registry::ServiceRegistry;
pub use traits::Plugin;
pub use types::{
    PluginRecord, ServiceFactory, ServiceInstance, ServiceKey, ServiceProvider,
    ServiceRegistration,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Echo;

    impl Plugin for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(1, 2, 3)
        }

        fn register_services(&self, services: &mut ServiceRegistry) -> Result<(), PluginHostError> {
            services.add_singleton("echo.service", Arc::new(String::from("echo")));
            Ok(())
        }
    }

    #[test]
    fn plugin_is_object_safe_and_registers() {
        let plugin: Arc<dyn Plugin> = Arc::new(Echo);
        let mut services = ServiceRegistry::new();
        plugin.register_services(&mut services).unwrap();

        assert_eq!(plugin.name(), "echo");
        assert!(services.contains(&"echo.service".into()));
    }

    #[test]
    fn builtin_keys_are_distinct() {
        assert_ne!(ServiceKey::CATALOG, ServiceKey::CONTAINER);
        assert_eq!(ServiceKey::CATALOG.as_str(), "plughost.catalog");
        assert_eq!(ServiceKey::CONTAINER.as_str(), "plughost.container");
    }

    #[test]
    fn plugin_marker_keys_are_per_plugin() {
        let a = ServiceKey::plugin("alpha");
        let b = ServiceKey::plugin("beta");
        assert_ne!(a, b);
        assert!(a.is_plugin_marker());
        assert!(!ServiceKey::CATALOG.is_plugin_marker());
        assert_eq!(a.to_string(), "plughost.plugin/alpha");
    }

    #[test]
    fn error_display_includes_context() {
        let err = PluginHostError::registration("greeter", "wasm trap: unreachable");
        assert_eq!(
            err.to_string(),
            "plugin 'greeter' failed to register services: wasm trap: unreachable"
        );
        assert!(!err.is_fatal());

        let fatal = PluginHostError::Catalog {
            path: PathBuf::from("/nope"),
            message: "not a directory".into(),
        };
        assert!(fatal.is_fatal());
        assert!(fatal.to_string().contains("/nope"));
    }
}
