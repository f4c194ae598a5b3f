use std::path::PathBuf;

use enclave::{Config, ConfigError};

use super::FIXTURES_PATH;

#[tokio::test]
async fn load_config_from_file() {
    let path = format!("{FIXTURES_PATH}/config/enclave.toml");
    let config = Config::from_file(&path).expect("fixture config should load");

    assert_eq!(config.unit_root, PathBuf::from("/srv/enclave/units"));
    assert_eq!(config.unit_extensions, vec!["wasm"]);
    assert_eq!(config.reclaim.attempts, 5);
    assert_eq!(config.reclaim.pause_ms, 25);
}

#[tokio::test]
async fn missing_config_file_fails() {
    let result = Config::from_file("/nonexistent/enclave.toml");
    assert!(result.is_err());
}

#[tokio::test]
async fn embedded_example_matches_defaults() {
    let from_example = Config::parse_toml(enclave::EXAMPLE_CONFIG).expect("example should parse");
    let default = Config::default();

    assert_eq!(from_example.unit_root, default.unit_root);
    assert_eq!(from_example.unit_extensions, default.unit_extensions);
    assert_eq!(from_example.reclaim.attempts, default.reclaim.attempts);
}

#[tokio::test]
async fn invalid_reclaim_budget_rejected() {
    let result = Config::parse_toml("[reclaim]\nattempts = 0\n");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}
