//! The agent batch CSV.
//!
//! Format: a header row `index,address,privateKey,nativeBalance,tokenBalance`
//! followed by one row per agent. Columns are located by header name, so a
//! reordered file still parses; extra columns are ignored. Balances are
//! written as decimal strings with the full precision of each asset.
//!
//! This file is the contract other tooling relies on (the join workflow reads
//! address/key pairs from it), so the header and column order written here
//! must stay stable.

use super::AgentRecord;
use crate::error::{AgentError, Result};
use crate::fs::atomic_write_file;
use crate::units::{NATIVE_DECIMALS, format_units};
use crate::wallet::{Address, Wallet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Column names, in the order they are written.
pub const BATCH_HEADER: [&str; 5] = [
    "index",
    "address",
    "privateKey",
    "nativeBalance",
    "tokenBalance",
];

/// One row of the batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRow {
    pub index: u32,
    pub address: Address,
    pub private_key: String,
    pub native_balance: String,
    pub token_balance: String,
}

impl AgentRow {
    /// Snapshot a record, formatting balances for humans.
    pub fn from_record(record: &AgentRecord, token_decimals: u8) -> Self {
        Self {
            index: record.index,
            address: record.address(),
            private_key: record.wallet.private_key_hex(),
            native_balance: format_units(record.native_balance, NATIVE_DECIMALS),
            token_balance: format_units(record.token_balance, token_decimals),
        }
    }

    /// Rebuild the record's identity. Balances start at zero until refreshed.
    ///
    /// Fails when the stored address does not belong to the stored key.
    pub fn into_record(self) -> Result<AgentRecord> {
        let wallet = Wallet::from_private_key(&self.private_key).map_err(|e| {
            AgentError::PersistenceError(format!("agent {}: {}", self.index, e))
        })?;
        if wallet.address() != self.address {
            return Err(AgentError::PersistenceError(format!(
                "agent {}: address {} does not match its private key",
                self.index, self.address
            )));
        }
        Ok(AgentRecord {
            index: self.index,
            wallet,
            native_balance: 0,
            token_balance: 0,
        })
    }

    /// Render as a CSV line (no trailing newline) in header order.
    pub fn to_line(&self) -> String {
        [
            self.index.to_string(),
            self.address.to_string(),
            self.private_key.clone(),
            self.native_balance.clone(),
            self.token_balance.clone(),
        ]
        .join(",")
    }
}

/// Position of each known column within a parsed header.
struct ColumnMap {
    positions: [usize; 5],
    width: usize,
}

impl ColumnMap {
    fn from_header(line: &str) -> Result<Self> {
        let names: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut positions = [0usize; 5];
        for (slot, column) in positions.iter_mut().zip(BATCH_HEADER) {
            *slot = names.iter().position(|n| *n == column).ok_or_else(|| {
                AgentError::PersistenceError(format!(
                    "batch file header is missing column '{}'",
                    column
                ))
            })?;
        }
        Ok(Self {
            positions,
            width: names.len(),
        })
    }

    fn parse_row(&self, line_no: usize, line: &str) -> Result<AgentRow> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != self.width {
            return Err(AgentError::PersistenceError(format!(
                "batch file line {}: expected {} fields, found {}",
                line_no,
                self.width,
                fields.len()
            )));
        }
        let field = |column: usize| fields[self.positions[column]];
        let bad = |what: &str, value: &str| {
            AgentError::PersistenceError(format!(
                "batch file line {}: invalid {} '{}'",
                line_no, what, value
            ))
        };

        let index = field(0)
            .parse::<u32>()
            .ok()
            .filter(|i| *i > 0)
            .ok_or_else(|| bad("index", field(0)))?;
        let address = Address::from_str(field(1)).map_err(|_| bad("address", field(1)))?;
        let private_key = field(2);
        if private_key.is_empty() {
            return Err(bad("privateKey", private_key));
        }

        Ok(AgentRow {
            index,
            address,
            private_key: private_key.to_string(),
            native_balance: field(3).to_string(),
            token_balance: field(4).to_string(),
        })
    }
}

/// Render a complete batch file.
pub fn render(rows: &[AgentRow]) -> String {
    let mut out = BATCH_HEADER.join(",");
    out.push('\n');
    for row in rows {
        out.push_str(&row.to_line());
        out.push('\n');
    }
    out
}

/// Parse a complete batch file. Blank lines are skipped.
pub fn parse(content: &str) -> Result<Vec<AgentRow>> {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty());

    let Some((_, header)) = lines.next() else {
        return Err(AgentError::PersistenceError(
            "batch file is empty".to_string(),
        ));
    };
    let columns = ColumnMap::from_header(header)?;

    let rows = lines
        .map(|(line_no, line)| columns.parse_row(line_no, line))
        .collect::<Result<Vec<_>>>()?;

    let mut seen = std::collections::HashSet::new();
    for row in &rows {
        if !seen.insert(row.index) {
            return Err(AgentError::PersistenceError(format!(
                "batch file contains agent index {} more than once",
                row.index
            )));
        }
    }

    Ok(rows)
}

/// Handle on the batch file location.
#[derive(Debug, Clone)]
pub struct BatchFile {
    path: PathBuf,
}

impl BatchFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a batch has been persisted. This alone decides whether a
    /// provisioning run reuses agents or creates new ones.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<Vec<AgentRow>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            AgentError::PersistenceError(format!(
                "failed to read batch file '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        parse(&content)
    }

    /// Overwrite the file with `records`.
    pub fn save(&self, records: &[AgentRecord], token_decimals: u8) -> Result<()> {
        let rows: Vec<AgentRow> = records
            .iter()
            .map(|r| AgentRow::from_record(r, token_decimals))
            .collect();
        atomic_write_file(&self.path, &render(&rows))
    }
}
