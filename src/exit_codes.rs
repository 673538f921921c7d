//! Exit code constants for the lottery-agents CLI.
//!
//! - 0: Success
//! - 1: Invalid input (bad agent count, bad lottery id, bad parameters)
//! - 2: Configuration error (missing or malformed settings)
//! - 3: Ledger failure (RPC error, reverted or unconfirmed transaction)
//! - 4: Persistence failure (batch file or event log I/O)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// Invalid user input: bad arguments or prompt answers.
pub const USER_ERROR: i32 = 1;

/// Required configuration is missing or invalid.
pub const CONFIG_ERROR: i32 = 2;

/// A ledger call failed outside of a per-agent step.
pub const LEDGER_FAILURE: i32 = 3;

/// Reading or writing durable state failed.
pub const PERSISTENCE_FAILURE: i32 = 4;
