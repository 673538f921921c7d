//! Minimal Solidity ABI encoding for the calls this tool makes.
//!
//! Only static argument types are encoded (`address`, `uint256`).
//! Decoding works on 32-byte words and follows offsets for the dynamic
//! values we read back (`address[]` inside a tuple, `uint256[]`). Offsets
//! come from the node, so all offset arithmetic is checked.

use crate::error::{AgentError, Result};
use crate::wallet::{Address, keccak256};

const WORD: usize = 32;

/// A static ABI argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(u128),
}

impl Token {
    fn encode_into(&self, out: &mut Vec<u8>) {
        let mut word = [0u8; WORD];
        match self {
            Token::Address(address) => word[12..].copy_from_slice(address.as_bytes()),
            Token::Uint(value) => word[16..].copy_from_slice(&value.to_be_bytes()),
        }
        out.extend_from_slice(&word);
    }
}

/// First four bytes of the Keccak-256 hash of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `signature` applied to `args`.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + args.len() * WORD);
    out.extend_from_slice(&selector(signature));
    for arg in args {
        arg.encode_into(&mut out);
    }
    out
}

/// Word-oriented reader over ABI-encoded return data.
pub struct AbiDecoder<'a> {
    data: &'a [u8],
}

impl<'a> AbiDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn word_at(&self, offset: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(WORD)
            .and_then(|end| self.data.get(offset..end))
            .ok_or_else(|| {
                AgentError::LedgerError(format!(
                    "return data too short: need word at byte {}, have {} bytes",
                    offset,
                    self.data.len()
                ))
            })
    }

    /// `uint256` at byte `offset`; values above `u128::MAX` are rejected.
    pub fn uint_at(&self, offset: usize) -> Result<u128> {
        let word = self.word_at(offset)?;
        if word[..16].iter().any(|&b| b != 0) {
            return Err(AgentError::LedgerError(format!(
                "uint256 at byte {} exceeds supported range",
                offset
            )));
        }
        let mut buf = [0u8; 16];
        buf.copy_from_slice(&word[16..]);
        Ok(u128::from_be_bytes(buf))
    }

    pub fn usize_at(&self, offset: usize) -> Result<usize> {
        let value = self.uint_at(offset)?;
        usize::try_from(value).map_err(|_| {
            AgentError::LedgerError(format!("offset at byte {} is out of range", offset))
        })
    }

    pub fn address_at(&self, offset: usize) -> Result<Address> {
        let word = self.word_at(offset)?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Ok(Address::from_bytes(bytes))
    }

    pub fn bool_at(&self, offset: usize) -> Result<bool> {
        match self.uint_at(offset)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(AgentError::LedgerError(format!(
                "invalid bool value {} at byte {}",
                other, offset
            ))),
        }
    }

    /// `address[]` whose length word sits at byte `offset`.
    pub fn address_array_at(&self, offset: usize) -> Result<Vec<Address>> {
        let len = self.usize_at(offset)?;
        (0..len)
            .map(|i| self.address_at(element_offset(offset, i)?))
            .collect()
    }

    /// `uint256[]` whose length word sits at byte `offset`.
    pub fn uint_array_at(&self, offset: usize) -> Result<Vec<u128>> {
        let len = self.usize_at(offset)?;
        (0..len)
            .map(|i| self.uint_at(element_offset(offset, i)?))
            .collect()
    }
}

/// Byte position `words` words past `base`.
pub fn word_offset(base: usize, words: usize) -> Result<usize> {
    words
        .checked_mul(WORD)
        .and_then(|delta| base.checked_add(delta))
        .ok_or_else(|| {
            AgentError::LedgerError(format!(
                "return data offset overflows: {} + {} words",
                base, words
            ))
        })
}

/// Element `i` of an array whose length word sits at `offset`.
fn element_offset(offset: usize, i: usize) -> Result<usize> {
    let words = i.checked_add(1).ok_or_else(|| {
        AgentError::LedgerError("array index overflows".to_string())
    })?;
    word_offset(offset, words)
}

/// Decode the return data of a function returning a single `uint256[]`.
pub fn decode_uint_list(data: &[u8]) -> Result<Vec<u128>> {
    let decoder = AbiDecoder::new(data);
    let offset = decoder.usize_at(0)?;
    decoder.uint_array_at(offset)
}
