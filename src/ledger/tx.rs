//! Legacy (type 0) transactions with EIP-155 replay protection.
//!
//! The signing payload is `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`;
//! the signed form replaces the last three items with `v, r, s` where
//! `v = recovery_id + chainId * 2 + 35`.

use super::TxHash;
use crate::error::Result;
use crate::wallet::{Address, Wallet, keccak256};

/// RLP encoding of a byte string.
pub fn rlp_bytes(bytes: &[u8]) -> Vec<u8> {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        return bytes.to_vec();
    }
    let mut out = rlp_length_prefix(bytes.len(), 0x80);
    out.extend_from_slice(bytes);
    out
}

/// RLP encoding of an unsigned integer (big-endian, no leading zeros).
pub fn rlp_uint(value: u128) -> Vec<u8> {
    rlp_bytes(trim_leading_zeros(&value.to_be_bytes()))
}

/// RLP encoding of a big-endian integer given as raw bytes.
fn rlp_uint_bytes(bytes: &[u8]) -> Vec<u8> {
    rlp_bytes(trim_leading_zeros(bytes))
}

/// RLP encoding of a list whose items are already encoded.
pub fn rlp_list(items: &[Vec<u8>]) -> Vec<u8> {
    let payload_len: usize = items.iter().map(Vec::len).sum();
    let mut out = rlp_length_prefix(payload_len, 0xc0);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

fn rlp_length_prefix(len: usize, offset: u8) -> Vec<u8> {
    if len <= 55 {
        return vec![offset + len as u8];
    }
    let len_bytes = trim_leading_zeros(&len.to_be_bytes()).to_vec();
    let mut out = Vec::with_capacity(1 + len_bytes.len() + len);
    out.push(offset + 55 + len_bytes.len() as u8);
    out.extend_from_slice(&len_bytes);
    out
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// An unsigned legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: TxHash,
}

impl SignedTransaction {
    /// `0x`-prefixed hex of the raw encoding.
    pub fn raw_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

impl LegacyTransaction {
    fn base_fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp_uint(self.nonce as u128),
            rlp_uint(self.gas_price),
            rlp_uint(self.gas_limit as u128),
            rlp_bytes(self.to.as_bytes()),
            rlp_uint(self.value),
            rlp_bytes(&self.data),
        ]
    }

    /// EIP-155 signing payload.
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = self.base_fields();
        fields.push(rlp_uint(self.chain_id as u128));
        fields.push(rlp_uint(0));
        fields.push(rlp_uint(0));
        rlp_list(&fields)
    }

    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.signing_payload())
    }

    /// Sign with `wallet` and produce the raw transaction and its hash.
    pub fn sign(&self, wallet: &Wallet) -> Result<SignedTransaction> {
        let signature = wallet.sign_hash(&self.signing_hash())?;
        let v = signature.recovery_id as u128 + self.chain_id as u128 * 2 + 35;

        let mut fields = self.base_fields();
        fields.push(rlp_uint(v));
        fields.push(rlp_uint_bytes(&signature.r));
        fields.push(rlp_uint_bytes(&signature.s));
        let raw = rlp_list(&fields);
        let hash = TxHash(keccak256(&raw));

        Ok(SignedTransaction { raw, hash })
    }
}
