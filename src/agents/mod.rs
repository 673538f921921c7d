//! Agent records and the persisted batch file.
//!
//! An agent is a generated test account. Its identity (address and private
//! key) never changes once written; its balances are snapshots refreshed from
//! the ledger on every provisioning run.

mod batch_file;


pub use batch_file::{AgentRow, BATCH_HEADER, BatchFile};

use crate::wallet::{Address, Wallet};

/// One agent within a batch.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// 1-based position within the batch.
    pub index: u32,
    pub wallet: Wallet,
    /// Native balance in wei, as last observed.
    pub native_balance: u128,
    /// Token balance in base units, as last observed.
    pub token_balance: u128,
}

impl AgentRecord {
    /// A freshly generated agent with unknown (zero) balances.
    pub fn generate(index: u32) -> Self {
        Self {
            index,
            wallet: Wallet::random(),
            native_balance: 0,
            token_balance: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Generate `count` agents indexed `1..=count`.
pub fn generate_batch(count: u32) -> Vec<AgentRecord> {
    (1..=count).map(AgentRecord::generate).collect()
}
