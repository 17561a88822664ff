#![allow(clippy::unwrap_used)]

use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::{NamedTempFile, TempDir};

use netcounter_config::{Config, ConfigError, load_config, load_config_or_default, save_config};

fn toml_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn file_overrides_only_the_keys_it_names() {
    let file = toml_file(
        r#"
[defaults]
output = "json"

[counter]
accuracy = 2048
running = true
"#,
    );
    let cfg = load_config(Some(file.path())).unwrap();
    assert_eq!(cfg.defaults.output, "json");
    assert_eq!(cfg.defaults.color, "auto");

    let counter = cfg.counter_config().unwrap();
    assert_eq!(counter.accuracy, 2048);
    assert_eq!(counter.interval, 1);
    assert!(counter.start_running);
    assert_eq!(counter.path_prefix, "/ConnectivityCounter");
}

#[test]
fn invalid_prefix_in_file_fails_validation() {
    let file = toml_file("[counter]\npath_prefix = \"no-leading-slash\"\n");
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }), "got {err:?}");
    assert_eq!(load_config_or_default(Some(file.path())), Config::default());
}

#[test]
fn wrong_type_is_a_loading_error() {
    let file = toml_file("[counter]\naccuracy = \"lots\"\n");
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)), "got {err:?}");
}

#[test]
fn saved_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    cfg.counter.interval = 60;
    cfg.counter.path_prefix = "/org/example/Counter".into();
    cfg.defaults.color = "never".into();

    let written = save_config(&cfg, Some(&path)).unwrap();
    assert_eq!(written, path);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[counter]"));
    assert!(text.contains("interval = 60"));

    assert_eq!(load_config(Some(&path)).unwrap(), cfg);
}
