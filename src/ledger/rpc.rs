//! Blocking JSON-RPC 2.0 client for an Ethereum node.

use super::TxHash;
use crate::error::{AgentError, Result};
use crate::wallet::Address;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::cell::Cell;
use std::str::FromStr;
use std::time::Duration;

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// The parts of a transaction receipt this tool cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub succeeded: bool,
    pub block_number: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    block_number: Option<String>,
}

/// JSON-RPC endpoint wrapper.
pub struct RpcClient {
    url: String,
    http: Client,
    next_id: Cell<u64>,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AgentError::LedgerError(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            url: url.to_string(),
            http,
            next_id: Cell::new(1),
        })
    }

    /// Issue one JSON-RPC call and deserialize its `result`.
    ///
    /// A `null` result deserializes into `T` as JSON null, so callers that
    /// expect "not found" should ask for an `Option`.
    pub fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .map_err(|e| AgentError::LedgerError(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        let body: RpcResponse = response.json().map_err(|e| {
            AgentError::LedgerError(format!(
                "{} returned an unreadable response (HTTP {}): {}",
                method, status, e
            ))
        })?;

        if let Some(error) = body.error {
            return Err(AgentError::LedgerError(describe_rpc_error(method, &error)));
        }

        serde_json::from_value(body.result.unwrap_or(Value::Null)).map_err(|e| {
            AgentError::LedgerError(format!("{} returned an unexpected result: {}", method, e))
        })
    }

    pub fn chain_id(&self) -> Result<u64> {
        let hex: String = self.request("eth_chainId", json!([]))?;
        to_u64(parse_quantity(&hex)?, "chain id")
    }

    pub fn balance(&self, address: &Address) -> Result<u128> {
        let hex: String = self.request("eth_getBalance", json!([address.to_string(), "latest"]))?;
        parse_quantity(&hex)
    }

    /// `eth_call` against the latest block.
    pub fn call(&self, to: &Address, data: &[u8]) -> Result<Vec<u8>> {
        let hex: String = self.request(
            "eth_call",
            json!([{ "to": to.to_string(), "data": encode_data(data) }, "latest"]),
        )?;
        parse_data(&hex)
    }

    /// Next nonce for `address`, counting pending transactions.
    pub fn pending_nonce(&self, address: &Address) -> Result<u64> {
        let hex: String = self.request(
            "eth_getTransactionCount",
            json!([address.to_string(), "pending"]),
        )?;
        to_u64(parse_quantity(&hex)?, "nonce")
    }

    pub fn gas_price(&self) -> Result<u128> {
        let hex: String = self.request("eth_gasPrice", json!([]))?;
        parse_quantity(&hex)
    }

    pub fn estimate_gas(
        &self,
        from: &Address,
        to: &Address,
        value: u128,
        data: &[u8],
    ) -> Result<u64> {
        let hex: String = self.request(
            "eth_estimateGas",
            json!([{
                "from": from.to_string(),
                "to": to.to_string(),
                "value": to_quantity(value),
                "data": encode_data(data),
            }]),
        )?;
        to_u64(parse_quantity(&hex)?, "gas estimate")
    }

    pub fn send_raw_transaction(&self, raw_hex: &str) -> Result<TxHash> {
        let hex: String = self.request("eth_sendRawTransaction", json!([raw_hex]))?;
        TxHash::from_str(&hex)
    }

    /// Receipt for `tx`, or `None` while it is still pending.
    pub fn receipt(&self, tx: &TxHash) -> Result<Option<Receipt>> {
        let raw: Option<RawReceipt> =
            self.request("eth_getTransactionReceipt", json!([tx.to_string()]))?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        // Pre-Byzantium receipts have no status; treat them as successful.
        let succeeded = match raw.status.as_deref() {
            Some(status) => parse_quantity(status)? == 1,
            None => true,
        };
        let block_number = match raw.block_number.as_deref() {
            Some(n) => Some(to_u64(parse_quantity(n)?, "block number")?),
            None => None,
        };

        Ok(Some(Receipt {
            succeeded,
            block_number,
        }))
    }
}

fn describe_rpc_error(method: &str, error: &RpcErrorBody) -> String {
    // Revert payloads often carry the reason in `data`.
    match &error.data {
        Some(Value::String(data)) if !data.is_empty() => format!(
            "{} failed ({}): {} [{}]",
            method, error.code, error.message, data
        ),
        _ => format!("{} failed ({}): {}", method, error.code, error.message),
    }
}

/// `0x`-prefixed minimal hex quantity.
pub fn to_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

/// Parse a hex quantity such as `0x1bc16d674ec80000`.
pub fn parse_quantity(hex: &str) -> Result<u128> {
    let body = hex
        .strip_prefix("0x")
        .ok_or_else(|| AgentError::LedgerError(format!("quantity '{}' lacks 0x prefix", hex)))?;
    let body = body.trim_start_matches('0');
    if body.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(body, 16)
        .map_err(|e| AgentError::LedgerError(format!("invalid quantity '{}': {}", hex, e)))
}

fn to_u64(value: u128, what: &str) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| AgentError::LedgerError(format!("{} {} is out of range", what, value)))
}

fn encode_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn parse_data(hex_str: &str) -> Result<Vec<u8>> {
    let body = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(body)
        .map_err(|e| AgentError::LedgerError(format!("invalid data '{}': {}", hex_str, e)))
}
