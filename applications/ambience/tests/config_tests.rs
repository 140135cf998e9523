//! Configuration loading tests

use ambience::{AppConfig, AppError};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("ambience.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
settings_path = "/var/lib/ambience/sounds.json"

[resolver]
program = "/usr/local/bin/yt-dlp"
timeout_secs = 20
"#,
    );

    let config = AppConfig::load(Some(path.as_path())).unwrap();
    config.validate().unwrap();

    assert_eq!(
        config.settings_path,
        PathBuf::from("/var/lib/ambience/sounds.json")
    );
    assert_eq!(config.resolver.program, PathBuf::from("/usr/local/bin/yt-dlp"));
    assert_eq!(config.resolver.format, "bestaudio");
    assert_eq!(config.log_filter, "ambience=info");

    let resolver = config.resolver_config();
    assert_eq!(resolver.timeout, Some(Duration::from_secs(20)));
    assert_eq!(resolver.locate_program, PathBuf::from("which"));
}

#[test]
fn missing_timeout_means_no_timeout() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[resolver]\nformat = \"bestaudio[ext=m4a]\"\n");

    let config = AppConfig::load(Some(path.as_path())).unwrap();

    assert_eq!(config.resolver.format, "bestaudio[ext=m4a]");
    assert_eq!(config.resolver_config().timeout, None);
}

#[test]
fn explicit_config_file_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(matches!(
        AppConfig::load(Some(missing.as_path())),
        Err(AppError::Config(_))
    ));
}

#[test]
fn zero_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[resolver]\ntimeout_secs = 0\n");

    let config = AppConfig::load(Some(path.as_path())).unwrap();
    match config.validate() {
        Err(AppError::Config(message)) => assert!(message.contains("timeout_secs")),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn empty_helper_program_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[resolver]\nprogram = \"\"\n");

    let config = AppConfig::load(Some(path.as_path())).unwrap();
    assert!(matches!(config.validate(), Err(AppError::Config(_))));
}

#[test]
fn malformed_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[resolver\nprogram = ");

    assert!(matches!(
        AppConfig::load(Some(path.as_path())),
        Err(AppError::Config(_))
    ));
}
