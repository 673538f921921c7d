//! Access to the external EVM ledger.
//!
//! The workflows only see the [`Ledger`] and [`LotteryGateway`] traits; the
//! JSON-RPC implementation lives in [`evm`]. Every method blocks until the node
//! answers, and callers submit transactions strictly one after another: the
//! funding sender's nonce is read from the pending pool on each submission, so
//! overlapping submissions from the same sender would collide.

pub mod abi;
pub mod evm;
pub mod rpc;
pub mod tx;

use crate::error::{AgentError, Result};
use crate::lottery::{CreateLotteryParams, LotteryInfo};
use crate::wallet::{Address, Wallet};
use std::fmt;
use std::str::FromStr;

pub use evm::EvmLedger;

/// Hash identifying a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

impl FromStr for TxHash {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(body, &mut bytes).map_err(|e| {
            AgentError::LedgerError(format!("invalid transaction hash '{}': {}", s, e))
        })?;
        Ok(TxHash(bytes))
    }
}

/// Funding-side capabilities: the admin account pays, agents receive.
pub trait Ledger {
    /// Decimal precision of the funding token.
    fn token_decimals(&self) -> Result<u8>;

    /// Native balance of `address`, in wei.
    fn native_balance(&self, address: &Address) -> Result<u128>;

    /// Funding-token balance of `address`, in base units.
    fn token_balance(&self, address: &Address) -> Result<u128>;

    /// Submit a native transfer from the admin account.
    fn send_native(&self, to: &Address, amount: u128) -> Result<TxHash>;

    /// Submit a funding-token `transfer` from the admin account.
    fn send_token(&self, to: &Address, amount: u128) -> Result<TxHash>;

    /// Block until `tx` is mined; a reverted transaction is an error.
    fn wait_for_confirmation(&self, tx: &TxHash) -> Result<()>;
}

/// Lottery-contract capabilities used by the join and admin commands.
pub trait LotteryGateway {
    /// Address of the lottery manager contract.
    fn lottery_address(&self) -> Result<Address>;

    /// Read `getLotteryInfo(lottery_id)`.
    fn lottery_info(&self, lottery_id: u64) -> Result<LotteryInfo>;

    /// Decimal precision of an arbitrary ERC-20 token.
    fn decimals_of(&self, token: &Address) -> Result<u8>;

    /// Let the lottery contract pull `amount` of `token` from `owner`.
    fn approve_lottery(&self, owner: &Wallet, token: &Address, amount: u128) -> Result<TxHash>;

    /// Call `enterLottery(lottery_id)` signed by `participant`.
    fn enter_lottery(&self, participant: &Wallet, lottery_id: u64) -> Result<TxHash>;

    /// Call `createLottery(...)` signed by the admin account.
    fn create_lottery(&self, params: &CreateLotteryParams) -> Result<TxHash>;

    /// Call `drawWinner(lottery_id)` signed by the admin account.
    fn draw_winner(&self, lottery_id: u64) -> Result<TxHash>;

    /// Call `cancelLottery(lottery_id)` signed by the admin account.
    fn cancel_lottery(&self, lottery_id: u64) -> Result<TxHash>;

    /// Ids of lotteries still open for entry.
    fn active_lotteries(&self) -> Result<Vec<u64>>;

    /// Ids of lotteries whose winner has been drawn.
    fn drawn_lotteries(&self) -> Result<Vec<u64>>;

    /// Block until `tx` is mined; a reverted transaction is an error.
    fn confirm(&self, tx: &TxHash) -> Result<()>;
}
