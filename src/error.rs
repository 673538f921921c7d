//! Error types for the lottery-agents CLI.
//!
//! Uses thiserror for derive macros and provides user-actionable error messages.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for lottery-agents operations.
///
/// Each variant maps to a specific exit code. Only ledger errors raised inside
/// a per-agent step are absorbed by the workflows; everything else ends the run.
#[derive(Error, Debug)]
pub enum AgentError {
    /// User provided invalid input (agent count, lottery id, parameters).
    #[error("{0}")]
    InvalidInput(String),

    /// Required settings are missing or malformed.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A JSON-RPC call failed, or a transaction reverted or never confirmed.
    #[error("Ledger error: {0}")]
    LedgerError(String),

    /// Durable state could not be read or written.
    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

impl AgentError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            AgentError::InvalidInput(_) => exit_codes::USER_ERROR,
            AgentError::ConfigError(_) => exit_codes::CONFIG_ERROR,
            AgentError::LedgerError(_) => exit_codes::LEDGER_FAILURE,
            AgentError::PersistenceError(_) => exit_codes::PERSISTENCE_FAILURE,
        }
    }
}

/// Result type alias for lottery-agents operations.
pub type Result<T> = std::result::Result<T, AgentError>;
