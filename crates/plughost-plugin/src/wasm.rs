// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebAssembly plugin modules using wasmtime.
//!
//! A `.wasm` module is a plugin if it exports `register_services: () -> ()`
//! and imports nothing outside the `plughost` host module. During
//! registration the module calls back into the host:
//!
//! - `plughost.add_service(key_ptr, key_len, desc_ptr, desc_len) -> i32`
//!   returns `0` when the service is added, `1` when the key is already
//!   registered, and `-1` when the arguments cannot be read.
//! - `plughost.log(level, ptr, len)` forwards a message to `tracing`
//!   (0 = trace .. 4 = error).
//!
//! Every `register_services` call runs in a fresh [`Store`] with a fuel
//! budget. Services are buffered while the module runs and are only applied
//! to the registry once the export returns, so a trapping module leaves the
//! registry untouched.

use std::collections::HashSet;
use std::sync::Arc;

use plughost_config::WasmConfig;
use plughost_core::{Plugin, PluginHostError, ServiceRegistry};
use tracing::{debug, error, info, trace, warn};
use wasmtime::{Caller, Config, Engine, ExternType, Linker, Memory, Module, Store};

use crate::catalog::ModuleDescriptor;
use crate::loader::ModuleLoader;

/// Import module name for host functions.
pub const HOST_MODULE: &str = "plughost";

/// Export every plugin module must provide.
pub const REGISTER_EXPORT: &str = "register_services";

/// File extension of WebAssembly plugin modules.
pub const WASM_EXTENSION: &str = "wasm";

/// A service contributed by a WebAssembly plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmService {
    /// Name of the contributing plugin.
    pub plugin: String,
    /// Key the service was registered under.
    pub key: String,
    /// Free-form description supplied by the module.
    pub description: String,
}

/// Loads `.wasm` plugin modules into [`WasmPlugin`]s.
///
/// The engine is shared by every module this loader compiles.
pub struct WasmModuleLoader {
    engine: Engine,
    fuel: u64,
}

impl WasmModuleLoader {
    /// Create a loader with fuel metering enabled.
    pub fn new(config: &WasmConfig) -> Result<Self, PluginHostError> {
        let mut engine_config = Config::new();
        engine_config.consume_fuel(true);

        let engine = Engine::new(&engine_config)
            .map_err(|e| PluginHostError::Internal(format!("failed to create wasmtime engine: {e}")))?;

        debug!(fuel = config.fuel, "wasm module loader initialized");
        Ok(Self {
            engine,
            fuel: config.fuel,
        })
    }

    /// Default fuel budget for modules without a manifest override.
    pub fn fuel(&self) -> u64 {
        self.fuel
    }

    /// Compile and validate a module, applying its manifest overrides.
    pub fn load_plugin(&self, module: &ModuleDescriptor) -> Result<WasmPlugin, PluginHostError> {
        let rejected = |message: String| PluginHostError::ModuleLoad {
            module: module.path.clone(),
            message,
        };

        let bytes = std::fs::read(&module.path).map_err(|e| rejected(e.to_string()))?;
        let compiled = Module::new(&self.engine, &bytes)
            .map_err(|e| rejected(format!("failed to compile: {e:#}")))?;
        validate_module(&compiled).map_err(rejected)?;

        let manifest = module.manifest.as_ref();
        let plugin = WasmPlugin {
            name: module.plugin_name().to_string(),
            version: manifest
                .map(|m| m.version.clone())
                .unwrap_or_else(|| semver::Version::new(0, 0, 0)),
            fuel: manifest.and_then(|m| m.fuel).unwrap_or(self.fuel),
            engine: self.engine.clone(),
            module: compiled,
        };

        info!(
            plugin = %plugin.name,
            version = %plugin.version,
            module = %module.path.display(),
            "loaded wasm plugin"
        );
        Ok(plugin)
    }
}

impl ModuleLoader for WasmModuleLoader {
    fn extension(&self) -> &str {
        WASM_EXTENSION
    }

    fn load(&self, module: &ModuleDescriptor) -> Result<Arc<dyn Plugin>, PluginHostError> {
        Ok(Arc::new(self.load_plugin(module)?))
    }
}

/// Check the module's export and imports against the plugin ABI.
fn validate_module(module: &Module) -> Result<(), String> {
    match module.get_export(REGISTER_EXPORT) {
        Some(ExternType::Func(ty)) if ty.params().len() == 0 && ty.results().len() == 0 => {}
        Some(_) => return Err(format!("export '{REGISTER_EXPORT}' must be a function () -> ()")),
        None => return Err(format!("missing export '{REGISTER_EXPORT}'")),
    }

    if let Some(import) = module.imports().find(|i| i.module() != HOST_MODULE) {
        return Err(format!(
            "unsupported import '{}.{}' (only '{HOST_MODULE}' is provided)",
            import.module(),
            import.name()
        ));
    }

    Ok(())
}

/// A plugin backed by a compiled WebAssembly module.
pub struct WasmPlugin {
    name: String,
    version: semver::Version,
    fuel: u64,
    engine: Engine,
    module: Module,
}

impl WasmPlugin {
    /// Fuel budget of a single registration call.
    pub fn fuel(&self) -> u64 {
        self.fuel
    }
}

/// State stored in the wasmtime Store for one registration call.
struct RegistrationState {
    plugin: String,
    /// Keys present in the registry when the call started.
    existing: HashSet<String>,
    /// Services added by the module, applied once the call returns.
    pending: Vec<(String, String)>,
}

impl Plugin for WasmPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        self.version.clone()
    }

    fn register_services(&self, services: &mut ServiceRegistry) -> Result<(), PluginHostError> {
        let failed = |message: String| PluginHostError::registration(&self.name, message);

        let state = RegistrationState {
            plugin: self.name.clone(),
            existing: services.keys().map(|k| k.as_str().to_string()).collect(),
            pending: Vec::new(),
        };
        let mut store = Store::new(&self.engine, state);
        store
            .set_fuel(self.fuel)
            .map_err(|e| failed(format!("failed to set fuel: {e}")))?;

        let mut linker = Linker::new(&self.engine);
        define_host_functions(&mut linker).map_err(|e| failed(format!("failed to define host function: {e}")))?;

        let instance = linker
            .instantiate(&mut store, &self.module)
            .map_err(|e| failed(format!("failed to instantiate: {e:#}")))?;
        let register = instance
            .get_typed_func::<(), ()>(&mut store, REGISTER_EXPORT)
            .map_err(|e| failed(format!("{e:#}")))?;
        register
            .call(&mut store, ())
            .map_err(|e| failed(format!("{e:#}")))?;

        let state = store.into_data();
        let added = state.pending.len();
        for (key, description) in state.pending {
            let service = WasmService {
                plugin: self.name.clone(),
                key: key.clone(),
                description,
            };
            services.add_singleton(key, Arc::new(service));
        }

        info!(plugin = %self.name, services = added, "wasm plugin registered services");
        Ok(())
    }
}

fn define_host_functions(linker: &mut Linker<RegistrationState>) -> wasmtime::Result<()> {
    linker.func_wrap(
        HOST_MODULE,
        "add_service",
        |mut caller: Caller<'_, RegistrationState>,
         key_ptr: i32,
         key_len: i32,
         desc_ptr: i32,
         desc_len: i32|
         -> i32 {
            let Some(memory) = exported_memory(&mut caller) else {
                return -1;
            };
            let key = read_string_from_memory(&memory, &caller, key_ptr, key_len);
            let description = read_string_from_memory(&memory, &caller, desc_ptr, desc_len);
            let (Some(key), Some(description)) = (key, description) else {
                return -1;
            };
            if key.is_empty() {
                return -1;
            }

            let state = caller.data_mut();
            if state.existing.contains(&key) || state.pending.iter().any(|(k, _)| *k == key) {
                debug!(plugin = %state.plugin, key = %key, "service already registered");
                return 1;
            }
            state.pending.push((key, description));
            0
        },
    )?;

    linker.func_wrap(
        HOST_MODULE,
        "log",
        |mut caller: Caller<'_, RegistrationState>, level: i32, ptr: i32, len: i32| {
            let Some(memory) = exported_memory(&mut caller) else {
                return;
            };
            let Some(msg) = read_string_from_memory(&memory, &caller, ptr, len) else {
                return;
            };
            let plugin = caller.data().plugin.as_str();
            match level {
                0 => trace!(plugin = %plugin, "{msg}"),
                1 => debug!(plugin = %plugin, "{msg}"),
                3 => warn!(plugin = %plugin, "{msg}"),
                4 => error!(plugin = %plugin, "{msg}"),
                _ => info!(plugin = %plugin, "{msg}"),
            }
        },
    )?;

    Ok(())
}

fn exported_memory(caller: &mut Caller<'_, RegistrationState>) -> Option<Memory> {
    match caller.get_export("memory") {
        Some(wasmtime::Extern::Memory(mem)) => Some(mem),
        _ => None,
    }
}

/// Read a UTF-8 string from module memory, or `None` if out of bounds or invalid.
fn read_string_from_memory(
    memory: &Memory,
    caller: &Caller<'_, RegistrationState>,
    ptr: i32,
    len: i32,
) -> Option<String> {
    let start = usize::try_from(ptr).ok()?;
    let len = usize::try_from(len).ok()?;
    let bytes = memory.data(caller).get(start..start.checked_add(len)?)?;
    String::from_utf8(bytes.to_vec()).ok()
}
