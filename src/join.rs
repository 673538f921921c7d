//! Enter every persisted agent into one lottery.
//!
//! Each agent approves the lottery contract to pull the participation fee
//! from its own token balance, then calls `enterLottery`. Both transactions
//! are signed by the agent's key and confirmed before the next agent starts.

use crate::agents::{AgentRecord, BatchFile};
use crate::error::{AgentError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::ledger::LotteryGateway;
use crate::provision::emit;
use crate::units::format_units;
use crate::wallet::Address;
use serde_json::json;
use std::io::Write;

/// An agent that could not enter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinFailure {
    pub index: u32,
    pub address: Address,
    pub message: String,
}

/// Outcome of a join run.
#[derive(Debug, Clone)]
pub struct JoinReport {
    pub lottery_id: u64,
    pub total: usize,
    pub joined: usize,
    pub failures: Vec<JoinFailure>,
}

pub struct Joiner<'a, G: LotteryGateway> {
    gateway: &'a G,
    batch: &'a BatchFile,
    events: &'a EventLog,
}

impl<'a, G: LotteryGateway> Joiner<'a, G> {
    pub fn new(gateway: &'a G, batch: &'a BatchFile, events: &'a EventLog) -> Self {
        Self {
            gateway,
            batch,
            events,
        }
    }

    pub fn join<W: Write>(&self, lottery_id: u64, out: &mut W) -> Result<JoinReport> {
        if !self.batch.exists() {
            return Err(AgentError::InvalidInput(format!(
                "No agents found at {}. Run `lottery-agents provision` first.",
                self.batch.path().display()
            )));
        }
        let agents = self
            .batch
            .load()?
            .into_iter()
            .map(|row| row.into_record())
            .collect::<Result<Vec<_>>>()?;

        emit(
            out,
            format_args!(
                "🎟️  Joining lottery #{} with {} agents...\n",
                lottery_id,
                agents.len()
            ),
        )?;

        let mut failures = Vec::new();
        for agent in &agents {
            match self.join_one(agent, lottery_id, out) {
                Ok(()) => {
                    emit(
                        out,
                        format_args!(
                            "✅ Agent {} ({}) joined lottery #{}",
                            agent.index,
                            agent.address(),
                            lottery_id
                        ),
                    )?;
                    self.events.record(
                        &Event::new(EventAction::LotteryJoined)
                            .with_agent(agent.index)
                            .with_details(json!({
                                "address": agent.address().to_string(),
                                "lottery_id": lottery_id,
                            })),
                    );
                }
                Err(AgentError::LedgerError(message)) => {
                    emit(
                        out,
                        format_args!(
                            "❌ Agent {} ({}) failed: {}",
                            agent.index,
                            agent.address(),
                            message
                        ),
                    )?;
                    self.events.record(
                        &Event::new(EventAction::JoinFailed)
                            .with_agent(agent.index)
                            .with_details(json!({
                                "address": agent.address().to_string(),
                                "lottery_id": lottery_id,
                                "error": message,
                            })),
                    );
                    failures.push(JoinFailure {
                        index: agent.index,
                        address: agent.address(),
                        message,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        Ok(JoinReport {
            lottery_id,
            total: agents.len(),
            joined: agents.len() - failures.len(),
            failures,
        })
    }

    fn join_one<W: Write>(&self, agent: &AgentRecord, lottery_id: u64, out: &mut W) -> Result<()> {
        let info = self.gateway.lottery_info(lottery_id)?;
        let decimals = self.gateway.decimals_of(&info.token_address)?;
        emit(
            out,
            format_args!(
                "   Agent {}: approving {} for entry fee",
                agent.index,
                format_units(info.participation_fee, decimals)
            ),
        )?;

        let tx = self.gateway.approve_lottery(
            &agent.wallet,
            &info.token_address,
            info.participation_fee,
        )?;
        self.gateway.confirm(&tx)?;

        let tx = self.gateway.enter_lottery(&agent.wallet, lottery_id)?;
        self.gateway.confirm(&tx)
    }
}
