//! Tests for config functionality.

use super::types::*;
use crate::config::Config;
use crate::error::AgentError;
use serial_test::serial;
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::TempDir;

const ADMIN_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
const TOKEN: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
const LOTTERY: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

fn full_env() -> impl Fn(&str) -> Option<String> {
    env(&[
        (ENV_INFURA_API_KEY, "abc123"),
        (ENV_ADMIN_PRIVATE_KEY, ADMIN_KEY),
        (ENV_TOKEN_ADDRESS, TOKEN),
        (ENV_LOTTERY_ADDRESS, LOTTERY),
    ])
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.rpc_url, None);
    assert_eq!(config.admin_private_key, None);
    assert_eq!(config.agents_file, PathBuf::from("agents.csv"));
    assert_eq!(config.events_file, PathBuf::from("events.ndjson"));
    assert_eq!(config.native_amount, "0.001");
    assert_eq!(config.token_amount, "50");
    assert_eq!(config.gas_limit_native, 21_000);
    assert_eq!(config.gas_limit_contract, 0);
    assert_eq!(config.poll_interval_ms, 2_000);
    assert_eq!(config.confirmation_timeout_secs, 0);
    config.validate().unwrap();
}

#[test]
fn test_parse_minimal_yaml() {
    let config = Config::from_yaml("").unwrap();
    assert_eq!(config.native_amount, "0.001");
    assert_eq!(config.agents_file, PathBuf::from("agents.csv"));
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
rpc_url: http://localhost:8545
token_address: "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
lottery_address: "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
chain_id: 31337
agents_file: assets/agents.csv
events_file: assets/events.ndjson
native_amount: "0.01"
token_amount: "25.5"
gas_limit_native: 30000
gas_limit_contract: 250000
poll_interval_ms: 500
confirmation_timeout_secs: 120
some_future_field: ignored
"#;
    let config = Config::from_yaml(yaml).unwrap();

    assert_eq!(config.rpc_url.as_deref(), Some("http://localhost:8545"));
    assert_eq!(config.token_address.as_deref(), Some(TOKEN));
    assert_eq!(config.lottery_address.as_deref(), Some(LOTTERY));
    assert_eq!(config.chain_id, Some(31337));
    assert_eq!(config.agents_file, PathBuf::from("assets/agents.csv"));
    assert_eq!(config.events_file, PathBuf::from("assets/events.ndjson"));
    assert_eq!(config.native_amount, "0.01");
    assert_eq!(config.token_amount, "25.5");
    assert_eq!(config.gas_limit_native, 30_000);
    assert_eq!(config.gas_limit_contract, 250_000);
    assert_eq!(config.poll_interval_ms, 500);
    assert_eq!(config.confirmation_timeout_secs, 120);
}

#[test]
fn test_admin_key_is_never_read_from_yaml() {
    let yaml = format!("admin_private_key: \"{}\"\n", ADMIN_KEY);
    let config = Config::from_yaml(&yaml).unwrap();
    assert!(config.admin_private_key.is_none());
}

#[test]
fn test_validation_rejects_bad_amounts() {
    assert!(Config::from_yaml("native_amount: \"0\"").is_err());
    assert!(Config::from_yaml("native_amount: lots").is_err());
    assert!(Config::from_yaml("token_amount: \"-5\"").is_err());
}

#[test]
fn test_validation_rejects_zero_token_amount() {
    for zero in ["0", "0.0", "0.000000"] {
        let err = Config::from_yaml(&format!("token_amount: \"{}\"", zero)).unwrap_err();
        assert!(matches!(err, AgentError::ConfigError(_)));
        assert!(err.to_string().contains("token_amount must be greater than 0"));
    }
}

#[test]
fn test_validation_rejects_zero_limits() {
    let err = Config::from_yaml("gas_limit_native: 0").unwrap_err();
    assert!(err.to_string().contains("gas_limit_native"));

    let err = Config::from_yaml("poll_interval_ms: 0").unwrap_err();
    assert!(err.to_string().contains("poll_interval_ms"));
}

#[test]
fn test_invalid_yaml_is_config_error() {
    let err = Config::from_yaml("native_amount: [unclosed").unwrap_err();
    assert!(matches!(err, AgentError::ConfigError(_)));
}

#[test]
fn test_env_infura_key_expands_to_sepolia() {
    let mut config = Config::default();
    config.apply_env(env(&[(ENV_INFURA_API_KEY, "abc123")]));
    assert_eq!(
        config.rpc_url.as_deref(),
        Some("https://sepolia.infura.io/v3/abc123")
    );
}

#[test]
fn test_env_rpc_url_wins_over_infura() {
    let mut config = Config::default();
    config.apply_env(env(&[
        (ENV_INFURA_API_KEY, "abc123"),
        (ENV_RPC_URL, "http://127.0.0.1:8545"),
    ]));
    assert_eq!(config.rpc_url.as_deref(), Some("http://127.0.0.1:8545"));
}

#[test]
fn test_env_overrides_file_values() {
    let mut config = Config::from_yaml(&format!("token_address: \"{}\"", LOTTERY)).unwrap();
    config.apply_env(env(&[(ENV_TOKEN_ADDRESS, TOKEN)]));
    assert_eq!(config.token_address.as_deref(), Some(TOKEN));
}

#[test]
fn test_empty_env_values_are_unset() {
    let mut config = Config::default();
    config.apply_env(env(&[(ENV_ADMIN_PRIVATE_KEY, "  ")]));
    assert!(config.admin_private_key.is_none());
}

#[test]
fn test_missing_settings_listed_together() {
    let config = Config::default();
    let err = config.evm_settings(true).unwrap_err();

    assert!(matches!(err, AgentError::ConfigError(_)));
    let msg = err.to_string();
    assert!(msg.contains(ENV_INFURA_API_KEY));
    assert!(msg.contains(ENV_ADMIN_PRIVATE_KEY));
    assert!(msg.contains(ENV_TOKEN_ADDRESS));
    assert!(msg.contains(ENV_LOTTERY_ADDRESS));
}

#[test]
fn test_lottery_address_only_required_when_asked() {
    let mut config = Config::default();
    config.apply_env(env(&[
        (ENV_INFURA_API_KEY, "abc123"),
        (ENV_ADMIN_PRIVATE_KEY, ADMIN_KEY),
        (ENV_TOKEN_ADDRESS, TOKEN),
    ]));

    let settings = config.evm_settings(false).unwrap();
    assert!(settings.lottery.is_none());
    assert!(config.evm_settings(true).is_err());
}

#[test]
fn test_evm_settings_from_full_env() {
    let mut config = Config::default();
    config.confirmation_timeout_secs = 90;
    config.apply_env(full_env());

    let settings = config.evm_settings(true).unwrap();
    assert_eq!(settings.rpc_url, "https://sepolia.infura.io/v3/abc123");
    assert_eq!(
        settings.admin.address().to_string(),
        "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
    );
    assert_eq!(settings.token.to_string(), TOKEN);
    assert_eq!(settings.lottery.map(|a| a.to_string()).as_deref(), Some(LOTTERY));
    assert_eq!(settings.confirmation_timeout.map(|d| d.as_secs()), Some(90));
}

#[test]
fn test_zero_timeout_means_wait_forever() {
    let mut config = Config::default();
    config.apply_env(full_env());
    assert!(config.evm_settings(false).unwrap().confirmation_timeout.is_none());
}

#[test]
fn test_malformed_values_are_config_errors() {
    let mut config = Config::default();
    config.apply_env(env(&[
        (ENV_INFURA_API_KEY, "abc123"),
        (ENV_ADMIN_PRIVATE_KEY, "0xnothex"),
        (ENV_TOKEN_ADDRESS, TOKEN),
    ]));
    let err = config.evm_settings(false).unwrap_err();
    assert!(matches!(err, AgentError::ConfigError(_)));
    assert!(err.to_string().contains(ENV_ADMIN_PRIVATE_KEY));

    let mut config = Config::default();
    config.apply_env(env(&[
        (ENV_INFURA_API_KEY, "abc123"),
        (ENV_ADMIN_PRIVATE_KEY, ADMIN_KEY),
        (ENV_TOKEN_ADDRESS, "0x0000000000000000000000000000000000000000"),
    ]));
    let err = config.evm_settings(false).unwrap_err();
    assert!(err.to_string().contains("zero address"));
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let err = Config::load(temp_dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, AgentError::ConfigError(_)));
}

#[test]
#[serial]
fn test_resolve_reads_file_and_process_env() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lottery-agents.yaml");
    std::fs::write(&path, "token_amount: \"10\"\nrpc_url: http://file:8545\n").unwrap();

    // SAFETY: serialized with other env-mutating tests.
    unsafe {
        std::env::set_var(ENV_RPC_URL, "http://env:8545");
    }
    let config = Config::resolve(Some(&path));
    unsafe {
        std::env::remove_var(ENV_RPC_URL);
    }

    let config = config.unwrap();
    assert_eq!(config.token_amount, "10");
    assert_eq!(config.rpc_url.as_deref(), Some("http://env:8545"));
}

#[test]
#[serial]
fn test_resolve_reads_env_file_under_process_env() {
    let temp_dir = TempDir::new().unwrap();
    let env_path = temp_dir.path().join("agents.env");
    std::fs::write(
        &env_path,
        format!(
            "# local secrets\n{}={}\n{}={}\n{}=http://dotenv:8545\n",
            ENV_ADMIN_PRIVATE_KEY, ADMIN_KEY, ENV_TOKEN_ADDRESS, TOKEN, ENV_RPC_URL
        ),
    )
    .unwrap();
    let path = temp_dir.path().join("lottery-agents.yaml");
    std::fs::write(&path, format!("env_file: {}\n", env_path.display())).unwrap();

    // SAFETY: serialized with other env-mutating tests.
    unsafe {
        std::env::set_var(ENV_RPC_URL, "http://env:8545");
        std::env::remove_var(ENV_ADMIN_PRIVATE_KEY);
        std::env::remove_var(ENV_TOKEN_ADDRESS);
    }
    let config = Config::resolve(Some(&path));
    unsafe {
        std::env::remove_var(ENV_RPC_URL);
    }

    let config = config.unwrap();
    assert_eq!(config.rpc_url.as_deref(), Some("http://env:8545"));
    assert_eq!(config.admin_private_key.as_deref(), Some(ADMIN_KEY));
    assert_eq!(config.token_address.as_deref(), Some(TOKEN));
}

#[test]
#[serial]
fn test_resolve_tolerates_missing_env_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("lottery-agents.yaml");
    std::fs::write(&path, "env_file: does-not-exist.env\n").unwrap();

    let config = Config::resolve(Some(&path)).unwrap();
    assert_eq!(config.env_file, PathBuf::from("does-not-exist.env"));
}

#[test]
#[serial]
fn test_resolve_rejects_malformed_env_file() {
    let temp_dir = TempDir::new().unwrap();
    let env_path = temp_dir.path().join("broken.env");
    std::fs::write(&env_path, "RPC_URL http://missing-equals\n").unwrap();
    let path = temp_dir.path().join("lottery-agents.yaml");
    std::fs::write(&path, format!("env_file: {}\n", env_path.display())).unwrap();

    let err = Config::resolve(Some(&path)).unwrap_err();
    assert!(matches!(err, AgentError::ConfigError(_)));
    assert!(err.to_string().contains("failed to parse env file"));
}
