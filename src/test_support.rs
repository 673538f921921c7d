//! In-memory ledger used by workflow tests.

use crate::error::{AgentError, Result};
use crate::ledger::{Ledger, LotteryGateway, TxHash};
use crate::lottery::{CreateLotteryParams, LotteryInfo};
use crate::wallet::{Address, Wallet};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// Every call made against a [`FakeLedger`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LedgerCall {
    TokenDecimals,
    NativeBalance(Address),
    TokenBalance(Address),
    SendNative(Address, u128),
    SendToken(Address, u128),
    Wait(TxHash),
    LotteryInfo(u64),
    DecimalsOf(Address),
    /// owner, token, amount
    Approve(Address, Address, u128),
    /// participant, lottery id
    Enter(Address, u64),
    Create(CreateLotteryParams),
    Draw(u64),
    Cancel(u64),
    ActiveLotteries,
    DrawnLotteries,
    Confirm(TxHash),
}

enum Credit {
    Native(Address, u128),
    Token(Address, u128),
    None,
}

/// A ledger that confirms everything unless told otherwise.
///
/// Transfers credit the recipient once their confirmation succeeds. Failures
/// are injected by ordinal (1-based) so tests need not know generated
/// addresses in advance.
pub(crate) struct FakeLedger {
    decimals: u8,
    lottery_address: Address,
    lottery: RefCell<Option<LotteryInfo>>,
    /// active ids, drawn ids
    lottery_lists: RefCell<(Vec<u64>, Vec<u64>)>,
    calls: RefCell<Vec<LedgerCall>>,
    balances: RefCell<HashMap<Address, (u128, u128)>>,
    pending: RefCell<HashMap<TxHash, Credit>>,
    next_tx: Cell<u64>,
    native_sends: Cell<usize>,
    confirmations: Cell<usize>,
    entries: Cell<usize>,
    fail_native: RefCell<HashMap<usize, String>>,
    fail_confirm: RefCell<HashMap<usize, String>>,
    fail_enter: RefCell<HashMap<usize, String>>,
    fail_balances: RefCell<Option<String>>,
    fail_admin: RefCell<Option<String>>,
}

impl FakeLedger {
    pub(crate) fn new(decimals: u8) -> Self {
        Self {
            decimals,
            lottery_address: Address::from_bytes([0x5a; 20]),
            lottery: RefCell::new(None),
            lottery_lists: RefCell::new((Vec::new(), Vec::new())),
            calls: RefCell::new(Vec::new()),
            balances: RefCell::new(HashMap::new()),
            pending: RefCell::new(HashMap::new()),
            next_tx: Cell::new(0),
            native_sends: Cell::new(0),
            confirmations: Cell::new(0),
            entries: Cell::new(0),
            fail_native: RefCell::new(HashMap::new()),
            fail_confirm: RefCell::new(HashMap::new()),
            fail_enter: RefCell::new(HashMap::new()),
            fail_balances: RefCell::new(None),
            fail_admin: RefCell::new(None),
        }
    }

    pub(crate) fn calls(&self) -> Vec<LedgerCall> {
        self.calls.borrow().clone()
    }

    pub(crate) fn set_balances(&self, address: &Address, native: u128, token: u128) {
        self.balances.borrow_mut().insert(*address, (native, token));
    }

    pub(crate) fn set_lottery(&self, info: LotteryInfo) {
        *self.lottery.borrow_mut() = Some(info);
    }

    pub(crate) fn set_lottery_lists(&self, active: &[u64], drawn: &[u64]) {
        *self.lottery_lists.borrow_mut() = (active.to_vec(), drawn.to_vec());
    }

    /// Make every admin draw/cancel submission revert with `message`.
    pub(crate) fn fail_admin_calls(&self, message: &str) {
        *self.fail_admin.borrow_mut() = Some(message.to_string());
    }

    pub(crate) fn fail_native_transfer(&self, nth: usize, message: &str) {
        self.fail_native.borrow_mut().insert(nth, message.to_string());
    }

    pub(crate) fn fail_confirmation(&self, nth: usize, message: &str) {
        self.fail_confirm.borrow_mut().insert(nth, message.to_string());
    }

    pub(crate) fn fail_entry(&self, nth: usize, message: &str) {
        self.fail_enter.borrow_mut().insert(nth, message.to_string());
    }

    pub(crate) fn fail_balance_queries(&self, message: &str) {
        *self.fail_balances.borrow_mut() = Some(message.to_string());
    }

    fn record(&self, call: LedgerCall) {
        self.calls.borrow_mut().push(call);
    }

    fn submit(&self, credit: Credit) -> TxHash {
        let n = self.next_tx.get() + 1;
        self.next_tx.set(n);
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        let hash = TxHash(bytes);
        self.pending.borrow_mut().insert(hash, credit);
        hash
    }

    fn settle(&self, tx: &TxHash) -> Result<()> {
        let n = self.confirmations.get() + 1;
        self.confirmations.set(n);
        let credit = self.pending.borrow_mut().remove(tx);
        if let Some(message) = self.fail_confirm.borrow().get(&n) {
            return Err(AgentError::LedgerError(message.clone()));
        }
        let mut balances = self.balances.borrow_mut();
        match credit {
            Some(Credit::Native(to, amount)) => balances.entry(to).or_default().0 += amount,
            Some(Credit::Token(to, amount)) => balances.entry(to).or_default().1 += amount,
            Some(Credit::None) => {}
            None => {
                return Err(AgentError::LedgerError(format!(
                    "unknown transaction {}",
                    tx
                )));
            }
        }
        Ok(())
    }

    fn admin_submit(&self) -> Result<TxHash> {
        match self.fail_admin.borrow().as_ref() {
            Some(message) => Err(AgentError::LedgerError(message.clone())),
            None => Ok(self.submit(Credit::None)),
        }
    }

    fn balance_guard(&self) -> Result<()> {
        match self.fail_balances.borrow().as_ref() {
            Some(message) => Err(AgentError::LedgerError(message.clone())),
            None => Ok(()),
        }
    }
}

impl Ledger for FakeLedger {
    fn token_decimals(&self) -> Result<u8> {
        self.record(LedgerCall::TokenDecimals);
        Ok(self.decimals)
    }

    fn native_balance(&self, address: &Address) -> Result<u128> {
        self.record(LedgerCall::NativeBalance(*address));
        self.balance_guard()?;
        Ok(self.balances.borrow().get(address).map_or(0, |b| b.0))
    }

    fn token_balance(&self, address: &Address) -> Result<u128> {
        self.record(LedgerCall::TokenBalance(*address));
        self.balance_guard()?;
        Ok(self.balances.borrow().get(address).map_or(0, |b| b.1))
    }

    fn send_native(&self, to: &Address, amount: u128) -> Result<TxHash> {
        self.record(LedgerCall::SendNative(*to, amount));
        let n = self.native_sends.get() + 1;
        self.native_sends.set(n);
        if let Some(message) = self.fail_native.borrow().get(&n) {
            return Err(AgentError::LedgerError(message.clone()));
        }
        Ok(self.submit(Credit::Native(*to, amount)))
    }

    fn send_token(&self, to: &Address, amount: u128) -> Result<TxHash> {
        self.record(LedgerCall::SendToken(*to, amount));
        Ok(self.submit(Credit::Token(*to, amount)))
    }

    fn wait_for_confirmation(&self, tx: &TxHash) -> Result<()> {
        self.record(LedgerCall::Wait(*tx));
        self.settle(tx)
    }
}

impl LotteryGateway for FakeLedger {
    fn lottery_address(&self) -> Result<Address> {
        Ok(self.lottery_address)
    }

    fn lottery_info(&self, lottery_id: u64) -> Result<LotteryInfo> {
        self.record(LedgerCall::LotteryInfo(lottery_id));
        self.lottery.borrow().clone().ok_or_else(|| {
            AgentError::LedgerError(format!("execution reverted: lottery {} not found", lottery_id))
        })
    }

    fn decimals_of(&self, token: &Address) -> Result<u8> {
        self.record(LedgerCall::DecimalsOf(*token));
        Ok(self.decimals)
    }

    fn approve_lottery(&self, owner: &Wallet, token: &Address, amount: u128) -> Result<TxHash> {
        self.record(LedgerCall::Approve(owner.address(), *token, amount));
        Ok(self.submit(Credit::None))
    }

    fn enter_lottery(&self, participant: &Wallet, lottery_id: u64) -> Result<TxHash> {
        self.record(LedgerCall::Enter(participant.address(), lottery_id));
        let n = self.entries.get() + 1;
        self.entries.set(n);
        if let Some(message) = self.fail_enter.borrow().get(&n) {
            return Err(AgentError::LedgerError(message.clone()));
        }
        Ok(self.submit(Credit::None))
    }

    fn create_lottery(&self, params: &CreateLotteryParams) -> Result<TxHash> {
        self.record(LedgerCall::Create(params.clone()));
        Ok(self.submit(Credit::None))
    }

    fn draw_winner(&self, lottery_id: u64) -> Result<TxHash> {
        self.record(LedgerCall::Draw(lottery_id));
        self.admin_submit()
    }

    fn cancel_lottery(&self, lottery_id: u64) -> Result<TxHash> {
        self.record(LedgerCall::Cancel(lottery_id));
        self.admin_submit()
    }

    fn active_lotteries(&self) -> Result<Vec<u64>> {
        self.record(LedgerCall::ActiveLotteries);
        Ok(self.lottery_lists.borrow().0.clone())
    }

    fn drawn_lotteries(&self) -> Result<Vec<u64>> {
        self.record(LedgerCall::DrawnLotteries);
        Ok(self.lottery_lists.borrow().1.clone())
    }

    fn confirm(&self, tx: &TxHash) -> Result<()> {
        self.record(LedgerCall::Confirm(*tx));
        self.settle(tx)
    }
}

/// A lottery open for entries, priced in a token at `token`.
pub(crate) fn sample_lottery(token: Address, fee: u128) -> LotteryInfo {
    LotteryInfo {
        token_address: token,
        participation_fee: fee,
        refundable_amount: fee / 2,
        max_participants: 10,
        draw_time: 4_102_444_800,
        prize_amount: fee * 10,
        fee_to_investment: 30,
        fee_to_profit: 20,
        is_active: true,
        is_drawn: false,
        is_cancelled: false,
        winner: Address::ZERO,
        vote_count: 0,
        participants: Vec::new(),
    }
}
