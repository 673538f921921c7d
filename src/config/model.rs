//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for lottery-agents.
///
/// The YAML file holds non-secret settings. Endpoint, keys and contract
/// addresses may also come from the environment, which wins over the file.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Ledger endpoint and accounts
    // =========================================================================
    /// JSON-RPC endpoint URL.
    #[serde(default)]
    pub rpc_url: Option<String>,

    /// Funding/admin private key. Only ever read from the environment.
    #[serde(skip)]
    pub admin_private_key: Option<String>,

    /// ERC-20 token used to fund agents.
    #[serde(default)]
    pub token_address: Option<String>,

    /// Lottery manager contract (needed by `join` and `lottery`).
    #[serde(default)]
    pub lottery_address: Option<String>,

    /// Chain id used for signing; queried from the node when unset.
    #[serde(default)]
    pub chain_id: Option<u64>,

    // =========================================================================
    // State files
    // =========================================================================
    /// Agent batch CSV (default: "agents.csv").
    #[serde(default = "default_agents_file")]
    pub agents_file: PathBuf,

    /// NDJSON event log (default: "events.ndjson").
    #[serde(default = "default_events_file")]
    pub events_file: PathBuf,

    /// Dotenv file with secrets and endpoints (default: ".env"). Optional;
    /// variables already set in the process environment take precedence.
    #[serde(default = "default_env_file")]
    pub env_file: PathBuf,

    // =========================================================================
    // Funding
    // =========================================================================
    /// Native amount sent to each agent, as a decimal string (default: "0.001").
    #[serde(default = "default_native_amount")]
    pub native_amount: String,

    /// Token amount sent to each agent, as a decimal string (default: "50").
    #[serde(default = "default_token_amount")]
    pub token_amount: String,

    // =========================================================================
    // Transaction settings
    // =========================================================================
    /// Gas limit for plain native transfers.
    #[serde(default = "default_gas_limit_native")]
    pub gas_limit_native: u64,

    /// Gas limit for contract calls; 0 estimates each call.
    #[serde(default)]
    pub gas_limit_contract: u64,

    /// Receipt polling interval in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for a receipt after this many seconds; 0 waits forever.
    #[serde(default)]
    pub confirmation_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: None,
            admin_private_key: None,
            token_address: None,
            lottery_address: None,
            chain_id: None,
            agents_file: default_agents_file(),
            events_file: default_events_file(),
            env_file: default_env_file(),
            native_amount: default_native_amount(),
            token_amount: default_token_amount(),
            gas_limit_native: default_gas_limit_native(),
            gas_limit_contract: 0,
            poll_interval_ms: default_poll_interval_ms(),
            confirmation_timeout_secs: 0,
        }
    }
}
