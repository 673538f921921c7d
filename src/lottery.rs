//! Lottery manager contract surface: view types, call encoding and the
//! client-side checks performed before submitting owner transactions.
//!
//! All lottery rules live in the contract itself. The checks here only catch
//! obviously bad input before it costs gas.

use crate::error::{AgentError, Result};
use crate::ledger::abi::{AbiDecoder, Token, decode_uint_list, encode_call, word_offset};
use crate::wallet::Address;

pub const GET_LOTTERY_INFO: &str = "getLotteryInfo(uint256)";
pub const ENTER_LOTTERY: &str = "enterLottery(uint256)";
pub const DRAW_WINNER: &str = "drawWinner(uint256)";
pub const CANCEL_LOTTERY: &str = "cancelLottery(uint256)";
pub const GET_ACTIVE_LOTTERIES: &str = "getActiveLotteries()";
pub const GET_DRAWN_LOTTERIES: &str = "getDrawnLotteries()";
pub const CREATE_LOTTERY: &str =
    "createLottery(address,uint256,uint256,uint256,uint256,uint256,uint256,uint256)";

/// Number of head words in the `LotteryInfo` tuple.
const INFO_HEAD_WORDS: usize = 14;

/// Decoded `getLotteryInfo` tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotteryInfo {
    pub token_address: Address,
    pub participation_fee: u128,
    pub refundable_amount: u128,
    pub max_participants: u128,
    pub draw_time: u128,
    pub prize_amount: u128,
    pub fee_to_investment: u128,
    pub fee_to_profit: u128,
    pub is_active: bool,
    pub is_drawn: bool,
    pub is_cancelled: bool,
    pub winner: Address,
    pub vote_count: u128,
    pub participants: Vec<Address>,
}

impl LotteryInfo {
    /// Decode the return data of `getLotteryInfo`.
    ///
    /// The single return value is a dynamic tuple, so the data starts with an
    /// offset to the tuple; the trailing `address[]` is addressed relative to
    /// the tuple start.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let decoder = AbiDecoder::new(data);
        let base = decoder.usize_at(0)?;
        let field = |i: usize| word_offset(base, i);

        let participants_offset = decoder.usize_at(field(INFO_HEAD_WORDS - 1)?)?;
        let participants_at = base.checked_add(participants_offset).ok_or_else(|| {
            AgentError::LedgerError("lottery info participants offset overflows".to_string())
        })?;

        Ok(Self {
            token_address: decoder.address_at(field(0)?)?,
            participation_fee: decoder.uint_at(field(1)?)?,
            refundable_amount: decoder.uint_at(field(2)?)?,
            max_participants: decoder.uint_at(field(3)?)?,
            draw_time: decoder.uint_at(field(4)?)?,
            prize_amount: decoder.uint_at(field(5)?)?,
            fee_to_investment: decoder.uint_at(field(6)?)?,
            fee_to_profit: decoder.uint_at(field(7)?)?,
            is_active: decoder.bool_at(field(8)?)?,
            is_drawn: decoder.bool_at(field(9)?)?,
            is_cancelled: decoder.bool_at(field(10)?)?,
            winner: decoder.address_at(field(11)?)?,
            vote_count: decoder.uint_at(field(12)?)?,
            participants: decoder.address_array_at(participants_at)?,
        })
    }

    /// Short lifecycle label for display.
    pub fn status(&self) -> &'static str {
        if self.is_cancelled {
            "cancelled"
        } else if self.is_drawn {
            "drawn"
        } else if self.is_active {
            "active"
        } else {
            "inactive"
        }
    }
}

/// Arguments to `createLottery`, in token base units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLotteryParams {
    pub token_address: Address,
    pub participation_fee: u128,
    pub refundable_amount: u128,
    pub max_participants: u128,
    /// Unix seconds.
    pub draw_time: u64,
    pub prize_amount: u128,
    pub fee_to_investment: u128,
    pub fee_to_profit: u128,
}

impl CreateLotteryParams {
    /// Reject parameters the contract would refuse anyway.
    ///
    /// Rules:
    /// - token address must not be the zero address
    /// - every amount must be greater than zero
    /// - participation fee must be at least the refundable amount
    /// - draw time must be strictly after `now` (unix seconds)
    pub fn validate(&self, now: u64) -> Result<()> {
        if self.token_address.is_zero() {
            return Err(AgentError::InvalidInput("Invalid token address".to_string()));
        }

        let amounts = [
            self.participation_fee,
            self.refundable_amount,
            self.max_participants,
            self.prize_amount,
            self.fee_to_investment,
            self.fee_to_profit,
        ];
        if amounts.contains(&0) {
            return Err(AgentError::InvalidInput(
                "All amounts must be greater than 0".to_string(),
            ));
        }

        if self.participation_fee < self.refundable_amount {
            return Err(AgentError::InvalidInput(
                "Participation fee must be >= refundable amount".to_string(),
            ));
        }

        if self.draw_time <= now {
            return Err(AgentError::InvalidInput(
                "Draw time must be in the future".to_string(),
            ));
        }

        Ok(())
    }

    pub fn calldata(&self) -> Vec<u8> {
        encode_call(
            CREATE_LOTTERY,
            &[
                Token::Address(self.token_address),
                Token::Uint(self.participation_fee),
                Token::Uint(self.refundable_amount),
                Token::Uint(self.max_participants),
                Token::Uint(self.draw_time as u128),
                Token::Uint(self.prize_amount),
                Token::Uint(self.fee_to_investment),
                Token::Uint(self.fee_to_profit),
            ],
        )
    }
}

/// Parse a lottery id typed by the operator; ids start at 1.
pub fn parse_lottery_id(input: &str) -> Result<u64> {
    match input.trim().parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AgentError::InvalidInput(format!(
            "Invalid lottery ID: '{}'",
            input.trim()
        ))),
    }
}

/// Decode a `uint256[]` of lottery ids.
pub fn decode_lottery_ids(data: &[u8]) -> Result<Vec<u64>> {
    decode_uint_list(data)?
        .into_iter()
        .map(|id| {
            u64::try_from(id)
                .map_err(|_| AgentError::LedgerError(format!("lottery id {} out of range", id)))
        })
        .collect()
}
