// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for plughost integration tests.
//!
//! Provides mock plugins and a test harness that builds a plugin manager over
//! a temporary plugin directory.
//!
//! # Components
//!
//! - [`MockPlugin`] - Native plugin registering a fixed set of service keys
//! - [`MockLoader`] - Loader for `*.mock` module files
//! - [`TestHarness`] - Temporary plugin directory plus a ready manager

pub mod harness;
pub mod mock_plugin;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_plugin::{MockLoader, MockPlugin, MockService, MOCK_EXTENSION};
