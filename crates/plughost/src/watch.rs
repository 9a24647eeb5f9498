// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `plughost watch` command implementation.
//!
//! Builds once, then rebuilds the plugin service provider every time the
//! plugin directory settles after a change.

use std::collections::BTreeSet;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use plughost_config::PluginHostConfig;
use plughost_core::{Plugin, PluginHostError};
use plughost_plugin::PluginManager;
use tracing::{debug, info, warn};

/// Plugins that appeared or disappeared between two builds.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PluginChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl PluginChanges {
    /// Compare two sets of plugin names.
    pub fn between(before: &BTreeSet<String>, after: &BTreeSet<String>) -> Self {
        Self {
            added: after.difference(before).cloned().collect(),
            removed: before.difference(after).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Run the `plughost watch` command. Only returns on a fatal error.
pub fn run_watch(config: &PluginHostConfig, use_color: bool) -> Result<(), PluginHostError> {
    let mut manager = PluginManager::new(config)?;
    let plugins = manager.build_plugin_service_provider()?.unwrap_or_default();
    let mut current = names(&plugins);
    println!(
        "watching {} ({} plugins loaded)",
        manager.plugin_dir().display(),
        current.len()
    );

    let (tx, rx) = mpsc::channel::<DebounceEventResult>();
    let debounce = Duration::from_millis(config.plugins.watch_debounce_ms);
    let mut debouncer = new_debouncer(debounce, tx)
        .map_err(|e| PluginHostError::Internal(format!("failed to start watcher: {e}")))?;
    debouncer
        .watcher()
        .watch(manager.plugin_dir(), RecursiveMode::NonRecursive)
        .map_err(|e| PluginHostError::Internal(format!("failed to watch plugin directory: {e}")))?;
    info!(path = %manager.plugin_dir().display(), debounce_ms = config.plugins.watch_debounce_ms, "watching plugin directory");

    for result in rx {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "plugin directory watch error");
                continue;
            }
        };
        debug!(events = events.len(), "plugin directory changed");

        match manager.build_plugin_service_provider() {
            Ok(Some(plugins)) => {
                let next = names(&plugins);
                let changes = PluginChanges::between(&current, &next);
                for line in change_lines(&changes, manager.services().len(), use_color) {
                    println!("{line}");
                }
                current = next;
            }
            Ok(None) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(error = %e, "plugin build failed");
                eprintln!("plughost: {e}");
            }
        }
    }

    Ok(())
}

fn names(plugins: &[Arc<dyn Plugin>]) -> BTreeSet<String> {
    plugins.iter().map(|p| p.name().to_string()).collect()
}

/// Format a change report. An unchanged plugin set prints a single status line.
pub fn change_lines(changes: &PluginChanges, services: usize, use_color: bool) -> Vec<String> {
    if changes.is_empty() {
        return vec![format!("no plugin changes ({services} services)")];
    }

    let mut lines = Vec::new();
    for name in &changes.added {
        if use_color {
            use colored::Colorize;
            lines.push(format!("  {} {name}", "+".green()));
        } else {
            lines.push(format!("  + {name}"));
        }
    }
    for name in &changes.removed {
        if use_color {
            use colored::Colorize;
            lines.push(format!("  {} {name}", "-".red()));
        } else {
            lines.push(format!("  - {name}"));
        }
    }
    lines.push(format!("{services} services registered"));
    lines
}
