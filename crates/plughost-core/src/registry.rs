// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service registry shared by the host and its plugins.
//!
//! The `ServiceRegistry` stores `ServiceRegistration` records in insertion
//! order with at most one registration per `ServiceKey`. Adding a key that is
//! already present is a silent no-op, so plugins can be asked to register
//! again on every refresh without accumulating duplicates.

use std::any::Any;
use std::sync::Arc;

use tracing::debug;

use crate::types::{
    ServiceFactory, ServiceInstance, ServiceKey, ServiceProvider, ServiceRegistration,
};

/// Ordered, keyed collection of service registrations with idempotent add.
#[derive(Debug, Default, Clone)]
pub struct ServiceRegistry {
    registrations: Vec<ServiceRegistration>,
}

impl ServiceRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a registration unless its key is already present.
    ///
    /// Returns `true` if the registration was inserted.
    pub fn add(&mut self, registration: ServiceRegistration) -> bool {
        if self.contains(&registration.key) {
            debug!(key = %registration.key, "service already registered, ignoring");
            return false;
        }
        self.registrations.push(registration);
        true
    }

    /// Register a shared instance under `key`.
    pub fn add_singleton<T: Any + Send + Sync>(
        &mut self,
        key: impl Into<ServiceKey>,
        instance: Arc<T>,
    ) -> bool {
        self.add(ServiceRegistration::singleton(key, instance))
    }

    /// Register a factory invoked on every resolution of `key`.
    pub fn add_factory<T, F>(&mut self, key: impl Into<ServiceKey>, factory: F) -> bool
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: ServiceFactory = Arc::new(move || -> ServiceInstance { Arc::new(factory()) });
        self.add(ServiceRegistration::new(key, ServiceProvider::Factory(factory)))
    }

    /// Returns true if a registration exists for `key`.
    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.registrations.iter().any(|r| &r.key == key)
    }

    /// Get the registration for `key`.
    pub fn get(&self, key: &ServiceKey) -> Option<&ServiceRegistration> {
        self.registrations.iter().find(|r| &r.key == key)
    }

    /// Resolve the service under `key` as a `T`.
    ///
    /// Returns `None` if the key is unknown or the instance is not a `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, key: &ServiceKey) -> Option<Arc<T>> {
        self.get(key)?.provider.instance().downcast::<T>().ok()
    }

    /// All registrations in insertion order.
    pub fn get_all(&self) -> &[ServiceRegistration] {
        &self.registrations
    }

    /// Iterate over registered keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &ServiceKey> {
        self.registrations.iter().map(|r| &r.key)
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Greeter(&'static str);

    #[test]
    fn add_and_resolve_singleton() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.add_singleton("greeter", Arc::new(Greeter("hello"))));

        let greeter = registry.resolve::<Greeter>(&"greeter".into()).unwrap();
        assert_eq!(*greeter, Greeter("hello"));
    }

    #[test]
    fn second_add_with_same_key_is_ignored() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.add_singleton("greeter", Arc::new(Greeter("first"))));
        assert!(!registry.add_singleton("greeter", Arc::new(Greeter("second"))));

        assert_eq!(registry.len(), 1);
        let greeter = registry.resolve::<Greeter>(&"greeter".into()).unwrap();
        assert_eq!(greeter.0, "first");
    }

    #[test]
    #[tracing_test::traced_test]
    fn duplicate_add_is_logged() {
        let mut registry = ServiceRegistry::new();
        registry.add_singleton("greeter", Arc::new(Greeter("first")));
        registry.add_singleton("greeter", Arc::new(Greeter("second")));
        assert!(logs_contain("service already registered"));
    }

    #[test]
    fn factory_builds_fresh_instances() {
        let mut registry = ServiceRegistry::new();
        registry.add_factory("counter", || Vec::<u8>::with_capacity(4));

        let a = registry.resolve::<Vec<u8>>(&"counter".into()).unwrap();
        let b = registry.resolve::<Vec<u8>>(&"counter".into()).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn resolve_with_wrong_type_returns_none() {
        let mut registry = ServiceRegistry::new();
        registry.add_singleton("greeter", Arc::new(Greeter("hello")));
        assert!(registry.resolve::<String>(&"greeter".into()).is_none());
        assert!(registry.resolve::<Greeter>(&"missing".into()).is_none());
    }

    #[test]
    fn get_all_preserves_insertion_order() {
        let mut registry = ServiceRegistry::new();
        registry.add_singleton("zebra", Arc::new(1u32));
        registry.add_singleton("alpha", Arc::new(2u32));
        registry.add_singleton("middle", Arc::new(3u32));

        let keys: Vec<&str> = registry.get_all().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["zebra", "alpha", "middle"]);
    }

    #[test]
    fn len_and_is_empty() {
        let mut registry = ServiceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);

        registry.add_singleton("test", Arc::new(()));
        assert!(!registry.is_empty());
        assert_eq!(registry.len(), 1);
    }

    proptest! {
        // Only the first registration per key survives, whatever the call order.
        #[test]
        fn repeated_keys_keep_first_registration(
            adds in proptest::collection::vec((0u8..6, any::<u32>()), 0..64)
        ) {
            let mut registry = ServiceRegistry::new();
            let mut expected: Vec<(u8, u32)> = Vec::new();

            for (key, value) in &adds {
                let inserted = registry.add_singleton(format!("svc-{key}"), Arc::new(*value));
                let first = !expected.iter().any(|(k, _)| k == key);
                prop_assert_eq!(inserted, first);
                if first {
                    expected.push((*key, *value));
                }
            }

            prop_assert_eq!(registry.len(), expected.len());
            for (key, value) in expected {
                let stored = registry.resolve::<u32>(&format!("svc-{key}").into()).unwrap();
                prop_assert_eq!(*stored, value);
            }
        }
    }
}
