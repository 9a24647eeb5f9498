// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin discovery, composition, and service registration.
//!
//! Plugins are module files in a directory. The [`DirectoryCatalog`] tracks
//! which modules exist, the [`CompositionContainer`] turns them into plugin
//! instances through [`ModuleLoader`]s, and the [`PluginManager`] ties both
//! to a shared [`plughost_core::ServiceRegistry`].

pub mod catalog;
pub mod container;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod wasm;

pub use catalog::{DirectoryCatalog, ModuleDescriptor, RefreshSummary};
pub use container::{CompositionContainer, RejectedModule};
pub use loader::{LoaderSet, ModuleLoader};
pub use manager::{PluginManager, PluginManagerBuilder};
pub use manifest::{parse_plugin_manifest, PluginManifest};
pub use wasm::{WasmModuleLoader, WasmPlugin, WasmService};
