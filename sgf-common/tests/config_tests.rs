//! Unit tests for configuration loading and root folder resolution
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate SGF_CONFIG or SGF_ROOT_FOLDER are marked with #[serial].

use serial_test::serial;
use sgf_common::config::{default_root_folder, InputMode, TomlConfig, CONFIG_ENV_VAR, ROOT_FOLDER_ENV_VAR};
use sgf_common::{Error, NullBoundPolicy};
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();

    let config = TomlConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config.bot.port, 5790);
    assert_eq!(config.catalog.null_bound_policy, NullBoundPolicy::Zero);
}

#[test]
#[serial]
fn test_explicit_config_file_is_loaded() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/steel"

        [bot]
        port = 6000
        input_mode = "guided"

        [activity]
        min_uses = 3
        "#,
    )
    .unwrap();

    let config = TomlConfig::load(Some(&path)).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/steel")));
    assert_eq!(config.bot.port, 6000);
    assert_eq!(config.bot.input_mode, InputMode::Guided);
    assert_eq!(config.activity.min_uses, 3);
}

#[test]
#[serial]
fn test_config_env_var_is_used_when_no_cli_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "[bot]\nport = 7001\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let config = TomlConfig::load(None).unwrap();
    assert_eq!(config.bot.port, 7001);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_malformed_config_is_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[bot\nport = ").unwrap();

    assert!(matches!(TomlConfig::load(Some(&path)), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_root_folder_priority() {
    env::remove_var(ROOT_FOLDER_ENV_VAR);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/from/toml")),
        ..TomlConfig::default()
    };

    // TOML beats compiled default
    assert_eq!(config.resolve_root_folder(None), PathBuf::from("/from/toml"));

    // Environment beats TOML
    env::set_var(ROOT_FOLDER_ENV_VAR, "/from/env");
    assert_eq!(config.resolve_root_folder(None), PathBuf::from("/from/env"));

    // CLI beats everything
    assert_eq!(
        config.resolve_root_folder(Some(Path::new("/from/cli"))),
        PathBuf::from("/from/cli")
    );

    env::remove_var(ROOT_FOLDER_ENV_VAR);
}

#[test]
#[serial]
fn test_root_folder_falls_back_to_default() {
    env::remove_var(ROOT_FOLDER_ENV_VAR);
    let config = TomlConfig::default();
    assert_eq!(config.resolve_root_folder(None), default_root_folder());
}
