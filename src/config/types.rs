//! Configuration constants and defaults for lottery-agents.
//!
//! This module defines the environment variable names and the default value
//! functions used by the Config struct.

use std::path::PathBuf;

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lottery-agents.yaml";

/// Full JSON-RPC endpoint URL. Takes precedence over `INFURA_API_KEY`.
pub const ENV_RPC_URL: &str = "RPC_URL";

/// Infura project key; expands to the Sepolia endpoint.
pub const ENV_INFURA_API_KEY: &str = "INFURA_API_KEY";

/// Hex private key of the funding/admin account.
pub const ENV_ADMIN_PRIVATE_KEY: &str = "ADMIN_PRIVATE_KEY";

/// Address of the ERC-20 token used for funding.
pub const ENV_TOKEN_ADDRESS: &str = "MOCK_USDT_ADDRESS";

/// Address of the lottery manager contract.
pub const ENV_LOTTERY_ADDRESS: &str = "STEM_PAY_CONTRACT_ADDRESS";

/// Sepolia endpoint for a given Infura key.
pub fn infura_sepolia_url(api_key: &str) -> String {
    format!("https://sepolia.infura.io/v3/{}", api_key)
}

// Default value functions for serde
pub(crate) fn default_env_file() -> PathBuf {
    PathBuf::from(".env")
}
pub(crate) fn default_agents_file() -> PathBuf {
    PathBuf::from("agents.csv")
}
pub(crate) fn default_events_file() -> PathBuf {
    PathBuf::from("events.ndjson")
}
pub(crate) fn default_native_amount() -> String {
    "0.001".to_string()
}
pub(crate) fn default_token_amount() -> String {
    "50".to_string()
}
pub(crate) fn default_gas_limit_native() -> u64 {
    21_000
}
pub(crate) fn default_poll_interval_ms() -> u64 {
    2_000
}
