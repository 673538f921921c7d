//! Implementation of the `provision` command.

use super::prompt;
use crate::agents::BatchFile;
use crate::cli::ProvisionArgs;
use crate::config::Config;
use crate::error::Result;
use crate::events::EventLog;
use crate::ledger::EvmLedger;
use crate::provision::{FundingAmounts, Provisioner};
use std::io;
use std::path::Path;

/// Execute the `provision` command.
///
/// Settings are validated before anything else; the agent count is asked for
/// only when no batch file exists yet.
pub fn cmd_provision(config_path: Option<&Path>, args: ProvisionArgs) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let settings = config.evm_settings(false)?;

    let ledger = EvmLedger::new(settings)?;
    let batch = BatchFile::new(&config.agents_file);
    let events = EventLog::new(&config.events_file);
    let funding = FundingAmounts {
        native_amount: config.native_amount.clone(),
        token_amount: config.token_amount.clone(),
    };

    println!("🔑 Funding from {}", ledger.admin_address());

    let provisioner = Provisioner::new(&ledger, &batch, &events, funding);
    let report = provisioner.provision(
        || match args.count {
            Some(count) => Ok(count),
            None => prompt("How many agents do you want to create?"),
        },
        &mut io::stdout().lock(),
    )?;

    println!();
    println!("🎉 Setup Complete. Total Agents: {}", report.addresses.len());
    if !report.reused_batch {
        println!("   Funded: {}", report.funded);
        if !report.failures.is_empty() {
            println!("   Failed: {}", report.failures.len());
            for failure in &report.failures {
                println!("     Agent {} ({})", failure.index, failure.address);
            }
        }
    }

    Ok(())
}
