// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plughost list` and `plughost services` command implementations.

use std::sync::Arc;

use plughost_config::PluginHostConfig;
use plughost_core::{Plugin, PluginHostError, PluginRecord, ServiceProvider, ServiceRegistration};
use plughost_plugin::{
    CompositionContainer, DirectoryCatalog, PluginManager, RejectedModule, WasmService,
};

/// Run the `plughost list` command.
///
/// Builds once, then prints each plugin with its version and each module the
/// container rejected.
pub fn run_list(config: &PluginHostConfig, use_color: bool) -> Result<(), PluginHostError> {
    let mut manager = PluginManager::new(config)?;
    let plugins = manager.build_plugin_service_provider()?.unwrap_or_default();
    let rejected = manager.container().rejected();

    println!();
    println!("  plughost plugins ({})", manager.plugin_dir().display());
    println!("  {}", "-".repeat(50));
    for line in plugin_lines(&plugins, &rejected, use_color) {
        println!("{line}");
    }
    println!();
    println!("  {} loaded, {} rejected", plugins.len(), rejected.len());
    Ok(())
}

/// Run the `plughost services` command.
///
/// Builds once, then prints every registration key in registry order.
pub fn run_services(config: &PluginHostConfig) -> Result<(), PluginHostError> {
    let mut manager = PluginManager::new(config)?;
    manager.build_plugin_service_provider()?;

    for registration in manager.services().get_all() {
        println!("{:<40} {}", registration.key, describe(registration));
    }
    Ok(())
}

/// Format plugin and rejection lines for `list`.
pub fn plugin_lines(
    plugins: &[Arc<dyn Plugin>],
    rejected: &[RejectedModule],
    use_color: bool,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(plugins.len() + rejected.len());

    for plugin in plugins {
        if use_color {
            use colored::Colorize;
            lines.push(format!(
                "    {} {:<24} {}",
                "✓".green(),
                plugin.name(),
                plugin.version()
            ));
        } else {
            lines.push(format!("    [OK]   {:<24} {}", plugin.name(), plugin.version()));
        }
    }

    for module in rejected {
        let file = module
            .path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| module.path.display().to_string());
        if use_color {
            use colored::Colorize;
            lines.push(format!("    {} {:<24} {}", "✗".red(), file, module.reason.red()));
        } else {
            lines.push(format!("    [FAIL] {:<24} {}", file, module.reason));
        }
    }

    lines
}

/// One-line description of what a registration provides.
pub fn describe(registration: &ServiceRegistration) -> String {
    let instance = match &registration.provider {
        ServiceProvider::Factory(_) => return "factory".to_string(),
        ServiceProvider::Singleton(instance) => instance,
    };

    if let Some(catalog) = instance.downcast_ref::<DirectoryCatalog>() {
        format!("catalog ({} modules in {})", catalog.len(), catalog.path().display())
    } else if let Some(container) = instance.downcast_ref::<CompositionContainer>() {
        let plugins = container.plugins().map(|p| p.len()).unwrap_or(0);
        format!("container ({plugins} plugins)")
    } else if let Some(record) = instance.downcast_ref::<PluginRecord>() {
        format!("plugin {} {}", record.name, record.version)
    } else if let Some(service) = instance.downcast_ref::<WasmService>() {
        if service.description.is_empty() {
            format!("from {}", service.plugin)
        } else {
            format!("from {}: {}", service.plugin, service.description)
        }
    } else {
        "singleton".to_string()
    }
}
