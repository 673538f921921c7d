//! Agent provisioning: create or load a batch, fund it, refresh balances,
//! persist.
//!
//! # Ordering
//!
//! Funding is strictly sequential. For each agent the native transfer is
//! submitted and confirmed, then the token transfer is submitted and
//! confirmed, before the next agent starts. All transfers come from the same
//! admin account, and its nonce is taken from the pending pool on every
//! submission, so two in-flight transfers would collide.
//!
//! # Re-entry
//!
//! The existence of the batch file is the only guard: when it exists, no keys
//! are generated and nothing is sent, even if an earlier run stopped halfway
//! through funding. Balances are still refreshed and the file rewritten.

use crate::agents::{AgentRecord, BatchFile, generate_batch};
use crate::error::{AgentError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::ledger::Ledger;
use crate::units::{NATIVE_DECIMALS, format_units, parse_units};
use crate::wallet::Address;
use serde_json::json;
use std::io::Write;

/// How much each new agent receives, as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingAmounts {
    pub native_amount: String,
    pub token_amount: String,
}

/// A transfer that failed for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingFailure {
    pub index: u32,
    pub address: Address,
    pub message: String,
}

/// Outcome of a provisioning run.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    /// Agent addresses in index order.
    pub addresses: Vec<Address>,
    /// True when an existing batch file was reused.
    pub reused_batch: bool,
    /// Agents whose transfers all confirmed in this run.
    pub funded: usize,
    pub failures: Vec<FundingFailure>,
    pub token_decimals: u8,
}

/// Parse the operator's answer to "how many agents".
pub fn parse_agent_count(input: &str) -> Result<u32> {
    match input.trim().parse::<i64>() {
        Ok(n) if n > 0 => u32::try_from(n).map_err(|_| {
            AgentError::InvalidInput(format!("Agent count {} is too large.", n))
        }),
        _ => Err(AgentError::InvalidInput(
            "Please enter a valid number of agents.".to_string(),
        )),
    }
}

pub struct Provisioner<'a, L: Ledger> {
    ledger: &'a L,
    batch: &'a BatchFile,
    events: &'a EventLog,
    funding: FundingAmounts,
}

impl<'a, L: Ledger> Provisioner<'a, L> {
    pub fn new(
        ledger: &'a L,
        batch: &'a BatchFile,
        events: &'a EventLog,
        funding: FundingAmounts,
    ) -> Self {
        Self {
            ledger,
            batch,
            events,
            funding,
        }
    }

    /// Run the workflow.
    ///
    /// `read_count` is only consulted when no batch file exists, and its
    /// answer is validated before the ledger is touched.
    pub fn provision<F, W>(&self, read_count: F, out: &mut W) -> Result<ProvisionReport>
    where
        F: FnOnce() -> Result<String>,
        W: Write,
    {
        let (mut agents, reused_batch, failures, token_decimals) = if self.batch.exists() {
            let agents = self.load_existing(out)?;
            let decimals = self.ledger.token_decimals()?;
            (agents, true, Vec::new(), decimals)
        } else {
            let count = parse_agent_count(&read_count()?)?;
            let native_amount = parse_units(&self.funding.native_amount, NATIVE_DECIMALS)?;

            let agents = generate_batch(count);
            let decimals = self.ledger.token_decimals()?;
            let token_amount = parse_units(&self.funding.token_amount, decimals)?;

            let failures = self.fund_all(&agents, native_amount, token_amount, out)?;
            (agents, false, failures, decimals)
        };

        emit(out, format_args!("\n📊 Fetching updated balances...\n"))?;
        self.refresh_balances(&mut agents)?;
        for agent in &agents {
            emit(out, format_args!("Agent {} ({})", agent.index, agent.address()))?;
            emit(
                out,
                format_args!(
                    "   Native: {}",
                    format_units(agent.native_balance, NATIVE_DECIMALS)
                ),
            )?;
            emit(
                out,
                format_args!(
                    "   Token:  {}",
                    format_units(agent.token_balance, token_decimals)
                ),
            )?;
            emit(
                out,
                format_args!("-----------------------------------------------------"),
            )?;
        }

        self.batch.save(&agents, token_decimals)?;
        self.events.record(&Event::new(EventAction::BatchSaved).with_details(json!({
            "path": self.batch.path().display().to_string(),
            "agents": agents.len(),
            "reused": reused_batch,
        })));
        emit(
            out,
            format_args!("\n💾 Agent data saved to {}", self.batch.path().display()),
        )?;

        let funded = if reused_batch {
            0
        } else {
            agents.len() - failures.len()
        };

        Ok(ProvisionReport {
            addresses: agents.iter().map(AgentRecord::address).collect(),
            reused_batch,
            funded,
            failures,
            token_decimals,
        })
    }

    fn load_existing<W: Write>(&self, out: &mut W) -> Result<Vec<AgentRecord>> {
        emit(
            out,
            format_args!(
                "📁 Found existing {}, skipping agent creation.",
                self.batch.path().display()
            ),
        )?;
        let agents = self
            .batch
            .load()?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<Result<Vec<_>>>()?;

        self.events.record(&Event::new(EventAction::BatchLoaded).with_details(json!({
            "path": self.batch.path().display().to_string(),
            "agents": agents.len(),
        })));
        Ok(agents)
    }

    /// Fund every agent in order. Ledger errors are recorded per agent and do
    /// not stop the batch; any other error aborts.
    fn fund_all<W: Write>(
        &self,
        agents: &[AgentRecord],
        native_amount: u128,
        token_amount: u128,
        out: &mut W,
    ) -> Result<Vec<FundingFailure>> {
        self.events.record(&Event::new(EventAction::ProvisionStart).with_details(json!({
            "agents": agents.len(),
            "native_amount": self.funding.native_amount,
            "token_amount": self.funding.token_amount,
        })));
        emit(
            out,
            format_args!(
                "\n🔄 Sending {} tokens + {} native to each of {} agents...\n",
                self.funding.token_amount,
                self.funding.native_amount,
                agents.len()
            ),
        )?;

        let mut failures = Vec::new();
        for agent in agents {
            match self.fund_one(agent, native_amount, token_amount) {
                Ok(()) => {
                    emit(out, format_args!("✅ Agent {}: {}", agent.index, agent.address()))?;
                    self.events.record(
                        &Event::new(EventAction::AgentFunded)
                            .with_agent(agent.index)
                            .with_details(json!({ "address": agent.address().to_string() })),
                    );
                }
                Err(AgentError::LedgerError(message)) => {
                    emit(
                        out,
                        format_args!(
                            "❌ Failed to fund Agent {} ({}): {}",
                            agent.index,
                            agent.address(),
                            message
                        ),
                    )?;
                    self.events.record(
                        &Event::new(EventAction::FundingFailed)
                            .with_agent(agent.index)
                            .with_details(json!({
                                "address": agent.address().to_string(),
                                "error": message,
                            })),
                    );
                    failures.push(FundingFailure {
                        index: agent.index,
                        address: agent.address(),
                        message,
                    });
                }
                Err(other) => return Err(other),
            }
        }
        Ok(failures)
    }

    fn fund_one(&self, agent: &AgentRecord, native_amount: u128, token_amount: u128) -> Result<()> {
        let to = agent.address();

        let tx = self.ledger.send_native(&to, native_amount)?;
        self.ledger.wait_for_confirmation(&tx)?;

        let tx = self.ledger.send_token(&to, token_amount)?;
        self.ledger.wait_for_confirmation(&tx)?;

        Ok(())
    }

    fn refresh_balances(&self, agents: &mut [AgentRecord]) -> Result<()> {
        for agent in agents.iter_mut() {
            let address = agent.address();
            agent.native_balance = self.ledger.native_balance(&address)?;
            agent.token_balance = self.ledger.token_balance(&address)?;
        }
        Ok(())
    }
}

/// Write one line of operator output.
pub(crate) fn emit<W: Write>(out: &mut W, line: std::fmt::Arguments<'_>) -> Result<()> {
    writeln!(out, "{}", line)
        .map_err(|e| AgentError::PersistenceError(format!("failed to write output: {}", e)))
}
