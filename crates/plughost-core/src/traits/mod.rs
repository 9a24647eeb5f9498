// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for the plugin contract.

pub mod plugin;

pub use plugin::Plugin;
