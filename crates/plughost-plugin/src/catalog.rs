// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory-backed plugin catalog.
//!
//! A [`DirectoryCatalog`] is a live view over one directory of candidate
//! plugin modules. It scans once at construction (failing fast if the
//! directory is unusable) and again on every [`DirectoryCatalog::refresh`].
//! The current module set is published as an immutable snapshot, so readers
//! never observe a half-finished scan.

use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::ArcSwap;
use plughost_core::PluginHostError;
use tracing::{debug, info, warn};

use crate::manifest::{load_sidecar_manifest, PluginManifest};

/// A module file discovered in the plugin directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Full path of the module file.
    pub path: PathBuf,
    /// File name without extension.
    pub stem: String,
    /// Lower-cased extension, used to pick a loader.
    pub extension: String,
    /// Sidecar manifest, if one was found next to the module.
    pub manifest: Option<PluginManifest>,
    /// Last modification time of the module file, if the platform reports it.
    pub modified: Option<SystemTime>,
}

impl ModuleDescriptor {
    /// Name of the plugin this module provides: the manifest name, or the file stem.
    pub fn plugin_name(&self) -> &str {
        self.manifest
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or(&self.stem)
    }
}

/// What changed between two scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Modules present now but not before.
    pub added: usize,
    /// Modules present before but not now.
    pub removed: usize,
    /// Modules in the catalog after the refresh.
    pub total: usize,
}

impl RefreshSummary {
    /// Returns true if no module was added or removed.
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Catalog of loadable plugin modules found in a directory.
pub struct DirectoryCatalog {
    path: PathBuf,
    extensions: Vec<String>,
    modules: ArcSwap<Vec<ModuleDescriptor>>,
}

impl DirectoryCatalog {
    /// Build a catalog over `path`, discovering files with one of `extensions`.
    ///
    /// Fails if the directory does not exist, is not a directory, or cannot be read.
    pub fn new<I, S>(path: impl Into<PathBuf>, extensions: I) -> Result<Self, PluginHostError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = path.into();
        let extensions: Vec<String> = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .collect();

        let modules = scan(&path, &extensions)?;
        info!(
            path = %path.display(),
            modules = modules.len(),
            extensions = ?extensions,
            "plugin catalog created"
        );

        Ok(Self {
            path,
            extensions,
            modules: ArcSwap::from_pointee(modules),
        })
    }

    /// Re-scan the directory and publish the new module set.
    ///
    /// Added modules become visible to the next composition; removed ones are
    /// dropped from it. On error the previous snapshot is kept.
    pub fn refresh(&self) -> Result<RefreshSummary, PluginHostError> {
        let scanned = scan(&self.path, &self.extensions)?;
        let previous = self.modules.load();

        let before: HashSet<&Path> = previous.iter().map(|m| m.path.as_path()).collect();
        let after: HashSet<&Path> = scanned.iter().map(|m| m.path.as_path()).collect();
        let summary = RefreshSummary {
            added: after.difference(&before).count(),
            removed: before.difference(&after).count(),
            total: scanned.len(),
        };

        if summary.is_unchanged() {
            debug!(path = %self.path.display(), total = summary.total, "plugin catalog unchanged");
        } else {
            info!(
                path = %self.path.display(),
                added = summary.added,
                removed = summary.removed,
                total = summary.total,
                "plugin catalog refreshed"
            );
        }

        self.modules.store(Arc::new(scanned));
        Ok(summary)
    }

    /// Snapshot of the modules found by the last scan, sorted by path.
    pub fn modules(&self) -> Arc<Vec<ModuleDescriptor>> {
        self.modules.load_full()
    }

    /// The directory this catalog scans.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extensions (lower-case, without dot) treated as modules.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns the number of modules in the current snapshot.
    pub fn len(&self) -> usize {
        self.modules.load().len()
    }

    /// Returns true if the current snapshot holds no modules.
    pub fn is_empty(&self) -> bool {
        self.modules.load().is_empty()
    }
}

impl fmt::Debug for DirectoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryCatalog")
            .field("path", &self.path)
            .field("extensions", &self.extensions)
            .field("modules", &self.len())
            .finish()
    }
}

/// List module files in `dir` (non-recursive), sorted by path.
fn scan(dir: &Path, extensions: &[String]) -> Result<Vec<ModuleDescriptor>, PluginHostError> {
    let metadata = std::fs::metadata(dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => PluginHostError::Catalog {
            path: dir.to_path_buf(),
            message: "directory does not exist".to_string(),
        },
        _ => PluginHostError::PluginDirectory {
            path: dir.to_path_buf(),
            source: e,
        },
    })?;

    if !metadata.is_dir() {
        return Err(PluginHostError::Catalog {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let read_err = |source: std::io::Error| PluginHostError::PluginDirectory {
        path: dir.to_path_buf(),
        source,
    };

    let mut modules = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let Ok(metadata) = std::fs::metadata(&path) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let Some(extension) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
        else {
            continue;
        };
        if !extensions.contains(&extension) {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            warn!(path = %path.display(), "skipping module with non UTF-8 file name");
            continue;
        };

        match load_sidecar_manifest(&path) {
            Ok(manifest) => modules.push(ModuleDescriptor {
                path,
                stem,
                extension,
                manifest,
                modified: metadata.modified().ok(),
            }),
            Err(e) => {
                warn!(module = %path.display(), error = %e, "skipping module with invalid manifest");
            }
        }
    }

    modules.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(modules)
}
