// SPDX-FileCopyrightText: 2026 Plughost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the plughost configuration system.

use std::io::Write;

use plughost_config::diagnostic::ConfigError;
use plughost_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[host]
log_level = "debug"

[plugins]
dir = "extensions"
base_dir = "/opt/app"
recompose_on_refresh = false
watch_debounce_ms = 1000

[wasm]
fuel = 5000
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.host.log_level, "debug");
    assert_eq!(config.plugins.dir, "extensions");
    assert_eq!(config.plugins.base_dir.as_deref(), Some("/opt/app"));
    assert!(!config.plugins.recompose_on_refresh);
    assert_eq!(config.plugins.watch_debounce_ms, 1000);
    assert_eq!(config.wasm.fuel, 5000);
}

/// Empty input falls back to compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.plugins.dir, "Plugins");
    assert!(config.plugins.recompose_on_refresh);
}

/// A misspelled key is reported with a suggestion and a source span.
#[test]
fn unknown_key_suggests_correction() {
    let toml = r#"
[plugins]
recompose_on_refesh = false
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("should produce an UnknownKey diagnostic");

    assert_eq!(unknown.0, "recompose_on_refesh");
    assert_eq!(unknown.1.as_deref(), Some("recompose_on_refresh"));
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[plugin]
dir = "x"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown section");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::UnknownKey { key, .. } if key == "plugin")));
}

/// Wrong value types produce InvalidType diagnostics.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[wasm]
fuel = "lots"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string fuel");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("fuel"))));
}

/// Semantic validation runs after successful deserialization.
#[test]
fn validation_errors_surface_through_load() {
    let toml = r#"
[wasm]
fuel = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero fuel is invalid");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("wasm.fuel"))));
}

/// Loading from an explicit path reads that file.
#[test]
fn load_from_explicit_path() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tempfile");
    writeln!(file, "[plugins]\ndir = \"mods\"").unwrap();

    let config = load_and_validate_path(file.path()).expect("file config should validate");
    assert_eq!(config.plugins.dir, "mods");
}
