//! Implementation of the `join` command.

use super::prompt;
use crate::agents::BatchFile;
use crate::cli::JoinArgs;
use crate::config::Config;
use crate::error::Result;
use crate::events::EventLog;
use crate::join::Joiner;
use crate::ledger::EvmLedger;
use crate::lottery::parse_lottery_id;
use std::io;
use std::path::Path;

/// Execute the `join` command.
pub fn cmd_join(config_path: Option<&Path>, args: JoinArgs) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let settings = config.evm_settings(true)?;

    let raw_id = match args.lottery_id {
        Some(id) => id,
        None => prompt("Enter Lottery ID to join:")?,
    };
    let lottery_id = parse_lottery_id(&raw_id)?;

    let ledger = EvmLedger::new(settings)?;
    let batch = BatchFile::new(&config.agents_file);
    let events = EventLog::new(&config.events_file);

    let report = Joiner::new(&ledger, &batch, &events).join(lottery_id, &mut io::stdout().lock())?;

    println!();
    println!(
        "🎉 {}/{} agents joined lottery #{}",
        report.joined, report.total, report.lottery_id
    );

    Ok(())
}
