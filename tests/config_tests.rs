// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use camera_controls::Config;
use camera_controls::errors::ConfigError;
use std::path::PathBuf;

fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("camera-controls-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(
        config.tool_command,
        vec!["v4l2-ctl".to_string()],
        "v4l2-ctl from PATH should be the default tool"
    );
    assert_eq!(config.command_timeout_ms, 5000);
    assert!(
        !config.restore_default_on_remove,
        "Removing an effect should not write to the device by default"
    );
}

#[test]
fn test_config_load_explicit_file() {
    let path = temp_file(
        "flatpak.json",
        r#"{
            "tool_command": ["flatpak-spawn", "--host", "v4l2-ctl"],
            "command_timeout_ms": 1500,
            "restore_default_on_remove": true
        }"#,
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.tool_command.len(), 3);
    assert_eq!(config.command_timeout().as_millis(), 1500);
    assert!(config.restore_default_on_remove);
    assert_eq!(config.default_device, None);
}

#[test]
fn test_config_missing_explicit_file_is_error() {
    let path = std::env::temp_dir().join("camera-controls-does-not-exist.json");
    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
fn test_config_parse_error_names_file() {
    let path = temp_file("broken.json", "{ \"command_timeout_ms\": \"soon\" }");
    match Config::load(Some(&path)) {
        Err(ConfigError::Parse { path: reported, .. }) => {
            assert!(reported.ends_with("broken.json"))
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}
