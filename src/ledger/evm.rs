//! JSON-RPC backed implementation of [`Ledger`] and [`LotteryGateway`].

use super::abi::{AbiDecoder, Token, encode_call};
use super::rpc::RpcClient;
use super::tx::LegacyTransaction;
use super::{Ledger, LotteryGateway, TxHash};
use crate::error::{AgentError, Result};
use crate::lottery::{
    CANCEL_LOTTERY, CreateLotteryParams, DRAW_WINNER, ENTER_LOTTERY, GET_ACTIVE_LOTTERIES,
    GET_DRAWN_LOTTERIES, GET_LOTTERY_INFO, LotteryInfo, decode_lottery_ids,
};
use crate::wallet::{Address, Wallet};
use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// Everything needed to talk to the node and sign as the admin account.
#[derive(Debug, Clone)]
pub struct EvmSettings {
    pub rpc_url: String,
    pub admin: Wallet,
    pub token: Address,
    pub lottery: Option<Address>,
    /// Queried from the node on first submission when unset.
    pub chain_id: Option<u64>,
    pub gas_limit_native: u64,
    /// Zero means estimate per call.
    pub gas_limit_contract: u64,
    pub poll_interval: Duration,
    /// `None` waits indefinitely.
    pub confirmation_timeout: Option<Duration>,
}

pub struct EvmLedger {
    rpc: RpcClient,
    settings: EvmSettings,
    chain_id: Cell<Option<u64>>,
}

impl EvmLedger {
    /// Build the client. No network traffic happens until the first call.
    pub fn new(settings: EvmSettings) -> Result<Self> {
        let rpc = RpcClient::new(&settings.rpc_url)?;
        let chain_id = Cell::new(settings.chain_id);
        Ok(Self {
            rpc,
            settings,
            chain_id,
        })
    }

    pub fn admin_address(&self) -> Address {
        self.settings.admin.address()
    }

    fn chain_id(&self) -> Result<u64> {
        if let Some(id) = self.chain_id.get() {
            return Ok(id);
        }
        let id = self.rpc.chain_id()?;
        self.chain_id.set(Some(id));
        Ok(id)
    }

    /// Sign and submit one transaction from `signer`.
    ///
    /// The nonce comes from the pending pool, so submissions from one signer
    /// must not overlap.
    fn submit(&self, signer: &Wallet, to: &Address, value: u128, data: Vec<u8>) -> Result<TxHash> {
        let from = signer.address();
        let gas_limit = if data.is_empty() {
            self.settings.gas_limit_native
        } else if self.settings.gas_limit_contract > 0 {
            self.settings.gas_limit_contract
        } else {
            let estimate = self.rpc.estimate_gas(&from, to, value, &data)?;
            estimate.saturating_add(estimate / 5)
        };

        let tx = LegacyTransaction {
            nonce: self.rpc.pending_nonce(&from)?,
            gas_price: self.rpc.gas_price()?,
            gas_limit,
            to: *to,
            value,
            data,
            chain_id: self.chain_id()?,
        };

        let signed = tx.sign(signer)?;
        self.rpc.send_raw_transaction(&signed.raw_hex())
    }

    fn admin_lottery_call(&self, signature: &str, lottery_id: u64) -> Result<TxHash> {
        let contract = self.lottery_address()?;
        let data = encode_call(signature, &[Token::Uint(lottery_id as u128)]);
        self.submit(&self.settings.admin, &contract, 0, data)
    }

    fn lottery_ids(&self, signature: &str) -> Result<Vec<u64>> {
        let contract = self.lottery_address()?;
        let data = self.rpc.call(&contract, &encode_call(signature, &[]))?;
        decode_lottery_ids(&data)
    }

    fn erc20_uint(&self, token: &Address, signature: &str, args: &[Token]) -> Result<u128> {
        let data = self.rpc.call(token, &encode_call(signature, args))?;
        AbiDecoder::new(&data).uint_at(0)
    }

    fn wait(&self, tx: &TxHash) -> Result<()> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.rpc.receipt(tx)? {
                if receipt.succeeded {
                    return Ok(());
                }
                return Err(AgentError::LedgerError(format!(
                    "transaction {} reverted{}",
                    tx,
                    receipt
                        .block_number
                        .map(|n| format!(" in block {}", n))
                        .unwrap_or_default()
                )));
            }

            if let Some(limit) = self.settings.confirmation_timeout
                && started.elapsed() >= limit
            {
                return Err(AgentError::LedgerError(format!(
                    "transaction {} not confirmed after {}s",
                    tx,
                    limit.as_secs()
                )));
            }

            thread::sleep(self.settings.poll_interval);
        }
    }
}

impl Ledger for EvmLedger {
    fn token_decimals(&self) -> Result<u8> {
        self.decimals_of(&self.settings.token)
    }

    fn native_balance(&self, address: &Address) -> Result<u128> {
        self.rpc.balance(address)
    }

    fn token_balance(&self, address: &Address) -> Result<u128> {
        self.erc20_uint(
            &self.settings.token,
            "balanceOf(address)",
            &[Token::Address(*address)],
        )
    }

    fn send_native(&self, to: &Address, amount: u128) -> Result<TxHash> {
        self.submit(&self.settings.admin, to, amount, Vec::new())
    }

    fn send_token(&self, to: &Address, amount: u128) -> Result<TxHash> {
        let data = encode_call(
            "transfer(address,uint256)",
            &[Token::Address(*to), Token::Uint(amount)],
        );
        self.submit(&self.settings.admin, &self.settings.token, 0, data)
    }

    fn wait_for_confirmation(&self, tx: &TxHash) -> Result<()> {
        self.wait(tx)
    }
}

impl LotteryGateway for EvmLedger {
    fn lottery_address(&self) -> Result<Address> {
        self.settings.lottery.ok_or_else(|| {
            AgentError::ConfigError("STEM_PAY_CONTRACT_ADDRESS is not set".to_string())
        })
    }

    fn lottery_info(&self, lottery_id: u64) -> Result<LotteryInfo> {
        let contract = self.lottery_address()?;
        let data = self.rpc.call(
            &contract,
            &encode_call(GET_LOTTERY_INFO, &[Token::Uint(lottery_id as u128)]),
        )?;
        LotteryInfo::decode(&data)
    }

    fn decimals_of(&self, token: &Address) -> Result<u8> {
        let value = self.erc20_uint(token, "decimals()", &[])?;
        u8::try_from(value).map_err(|_| {
            AgentError::LedgerError(format!("token {} reports invalid decimals {}", token, value))
        })
    }

    fn approve_lottery(&self, owner: &Wallet, token: &Address, amount: u128) -> Result<TxHash> {
        let spender = self.lottery_address()?;
        let data = encode_call(
            "approve(address,uint256)",
            &[Token::Address(spender), Token::Uint(amount)],
        );
        self.submit(owner, token, 0, data)
    }

    fn enter_lottery(&self, participant: &Wallet, lottery_id: u64) -> Result<TxHash> {
        let contract = self.lottery_address()?;
        let data = encode_call(ENTER_LOTTERY, &[Token::Uint(lottery_id as u128)]);
        self.submit(participant, &contract, 0, data)
    }

    fn create_lottery(&self, params: &CreateLotteryParams) -> Result<TxHash> {
        let contract = self.lottery_address()?;
        self.submit(&self.settings.admin, &contract, 0, params.calldata())
    }

    fn draw_winner(&self, lottery_id: u64) -> Result<TxHash> {
        self.admin_lottery_call(DRAW_WINNER, lottery_id)
    }

    fn cancel_lottery(&self, lottery_id: u64) -> Result<TxHash> {
        self.admin_lottery_call(CANCEL_LOTTERY, lottery_id)
    }

    fn active_lotteries(&self) -> Result<Vec<u64>> {
        self.lottery_ids(GET_ACTIVE_LOTTERIES)
    }

    fn drawn_lotteries(&self) -> Result<Vec<u64>> {
        self.lottery_ids(GET_DRAWN_LOTTERIES)
    }

    fn confirm(&self, tx: &TxHash) -> Result<()> {
        self.wait(tx)
    }
}
