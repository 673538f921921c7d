//! Config loading, environment overlay, validation and ledger settings.

use super::model::Config;
use super::types::*;
use crate::error::{AgentError, Result};
use crate::ledger::evm::EvmSettings;
use crate::units::{NATIVE_DECIMALS, parse_units, validate_decimal};
use crate::wallet::{Address, Wallet};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

impl Config {
    /// Resolve the effective configuration for a run.
    ///
    /// Reads the YAML file at `path` (or the default file when `path` is
    /// `None`), overlays the dotenv file and the process environment, and
    /// validates the result. An explicitly named file must exist; the default
    /// file and the dotenv file are optional. The process environment wins
    /// over the dotenv file.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        let dotenv = read_env_file(&config.env_file)?;
        config.apply_env(|name| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| dotenv.get(name).cloned())
        });
        config.validate()?;
        Ok(config)
    }

    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            AgentError::ConfigError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| AgentError::ConfigError(format!("failed to parse config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Overlay settings from environment variables.
    ///
    /// `lookup` returns the value of a variable; empty values count as unset.
    /// `RPC_URL` wins over `INFURA_API_KEY`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc_url = Some(url);
        } else if let Some(key) = get(ENV_INFURA_API_KEY) {
            self.rpc_url = Some(infura_sepolia_url(key.trim()));
        }
        if let Some(key) = get(ENV_ADMIN_PRIVATE_KEY) {
            self.admin_private_key = Some(key);
        }
        if let Some(address) = get(ENV_TOKEN_ADDRESS) {
            self.token_address = Some(address);
        }
        if let Some(address) = get(ENV_LOTTERY_ADDRESS) {
            self.lottery_address = Some(address);
        }
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `native_amount` parses with 18 decimals and is positive
    /// - `token_amount` is a well-formed positive decimal
    /// - `gas_limit_native` and `poll_interval_ms` must be positive
    pub fn validate(&self) -> Result<()> {
        let native = parse_units(&self.native_amount, NATIVE_DECIMALS).map_err(|e| {
            AgentError::ConfigError(format!("config validation failed: native_amount: {}", e))
        })?;
        if native == 0 {
            return Err(AgentError::ConfigError(
                "config validation failed: native_amount must be greater than 0".to_string(),
            ));
        }

        let token = validate_decimal(&self.token_amount).map_err(|e| {
            AgentError::ConfigError(format!("config validation failed: token_amount: {}", e))
        })?;
        if token == 0 {
            return Err(AgentError::ConfigError(
                "config validation failed: token_amount must be greater than 0".to_string(),
            ));
        }

        if self.gas_limit_native == 0 {
            return Err(AgentError::ConfigError(
                "config validation failed: gas_limit_native must be greater than 0".to_string(),
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(AgentError::ConfigError(
                "config validation failed: poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Build validated ledger settings.
    ///
    /// Reports every missing variable at once. When `need_lottery` is set the
    /// lottery contract address is required as well.
    pub fn evm_settings(&self, need_lottery: bool) -> Result<EvmSettings> {
        let mut missing = Vec::new();
        if self.rpc_url.is_none() {
            missing.push(format!("{} (or {})", ENV_INFURA_API_KEY, ENV_RPC_URL));
        }
        if self.admin_private_key.is_none() {
            missing.push(ENV_ADMIN_PRIVATE_KEY.to_string());
        }
        if self.token_address.is_none() {
            missing.push(ENV_TOKEN_ADDRESS.to_string());
        }
        if need_lottery && self.lottery_address.is_none() {
            missing.push(ENV_LOTTERY_ADDRESS.to_string());
        }
        if !missing.is_empty() {
            return Err(AgentError::ConfigError(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let admin = Wallet::from_private_key(self.admin_private_key.as_deref().unwrap_or_default())
            .map_err(|e| AgentError::ConfigError(format!("{}: {}", ENV_ADMIN_PRIVATE_KEY, e)))?;
        let token = parse_config_address(ENV_TOKEN_ADDRESS, self.token_address.as_deref())?
            .ok_or_else(|| AgentError::ConfigError(format!("{} is not set", ENV_TOKEN_ADDRESS)))?;
        let lottery = parse_config_address(ENV_LOTTERY_ADDRESS, self.lottery_address.as_deref())?;

        Ok(EvmSettings {
            rpc_url: self.rpc_url.clone().unwrap_or_default(),
            admin,
            token,
            lottery,
            chain_id: self.chain_id,
            gas_limit_native: self.gas_limit_native,
            gas_limit_contract: self.gas_limit_contract,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            confirmation_timeout: match self.confirmation_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        })
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment. A missing file yields no variables.
pub(crate) fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let entries = dotenvy::from_path_iter(path).map_err(|e| {
        AgentError::ConfigError(format!(
            "failed to read env file '{}': {}",
            path.display(),
            e
        ))
    })?;
    entries
        .map(|entry| {
            entry.map_err(|e| {
                AgentError::ConfigError(format!(
                    "failed to parse env file '{}': {}",
                    path.display(),
                    e
                ))
            })
        })
        .collect()
}

fn parse_config_address(name: &str, value: Option<&str>) -> Result<Option<Address>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let address = Address::from_str(value)
        .map_err(|e| AgentError::ConfigError(format!("{}: {}", name, e)))?;
    if address.is_zero() {
        return Err(AgentError::ConfigError(format!(
            "{} must not be the zero address",
            name
        )));
    }
    Ok(Some(address))
}
