//! Event log for lottery-agents.
//!
//! Every run appends what it did to an NDJSON file (one JSON object per line)
//! so an operator can reconstruct which agents were funded, which transfers
//! failed and which agents entered which lottery.
//!
//! # Event Format
//!
//! Each event is a JSON object with the following fields:
//! - `ts`: RFC3339 timestamp
//! - `action`: what happened (`provision_start`, `agent_funded`, ...)
//! - `actor`: the operator string (e.g., `user@HOST`)
//! - `agent`: optional 1-based agent index
//! - `details`: freeform object with action-specific details
//!
//! Private keys are never written to the log.

use crate::error::{AgentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Actions that can be logged as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A new batch is about to be generated and funded
    ProvisionStart,
    /// An existing batch file was loaded instead
    BatchLoaded,
    /// Both transfers to one agent confirmed
    AgentFunded,
    /// A transfer to one agent failed
    FundingFailed,
    /// The batch file was written
    BatchSaved,
    /// An agent entered a lottery
    LotteryJoined,
    /// An agent failed to enter a lottery
    JoinFailed,
    /// A lottery was created from the admin account
    LotteryCreated,
    /// The admin account drew a lottery's winner
    WinnerDrawn,
    /// The admin account cancelled a lottery
    LotteryCancelled,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::ProvisionStart => write!(f, "provision_start"),
            EventAction::BatchLoaded => write!(f, "batch_loaded"),
            EventAction::AgentFunded => write!(f, "agent_funded"),
            EventAction::FundingFailed => write!(f, "funding_failed"),
            EventAction::BatchSaved => write!(f, "batch_saved"),
            EventAction::LotteryJoined => write!(f, "lottery_joined"),
            EventAction::JoinFailed => write!(f, "join_failed"),
            EventAction::LotteryCreated => write!(f, "lottery_created"),
            EventAction::WinnerDrawn => write!(f, "winner_drawn"),
            EventAction::LotteryCancelled => write!(f, "lottery_cancelled"),
        }
    }
}

/// An event record for the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The action that was performed.
    pub action: EventAction,

    /// The operator who ran the command (e.g., `user@HOST`).
    pub actor: String,

    /// Optional agent index for per-agent events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<u32>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action, timestamped now.
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: get_actor_string(),
            agent: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the agent index for this event.
    pub fn with_agent(mut self, index: u32) -> Self {
        self.agent = Some(index);
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            AgentError::PersistenceError(format!("failed to serialize event to JSON: {}", e))
        })
    }
}

/// Get the actor string for event metadata.
fn get_actor_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

/// Append-only NDJSON event file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a JSON line, creating the file and its directory
    /// if needed. The write is synced before returning.
    pub fn append(&self, event: &Event) -> Result<()> {
        let json_line = event.to_ndjson_line()?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir).map_err(|e| {
                AgentError::PersistenceError(format!(
                    "failed to create events directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                AgentError::PersistenceError(format!(
                    "failed to open events file '{}': {}",
                    self.path.display(),
                    e
                ))
            })?;

        writeln!(file, "{}", json_line).map_err(|e| {
            AgentError::PersistenceError(format!(
                "failed to write event to '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        file.sync_all().map_err(|e| {
            AgentError::PersistenceError(format!(
                "failed to sync events file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Append an event, downgrading a failure to a warning on stderr.
    ///
    /// Used once a workflow has made changes on the ledger, where aborting
    /// over the log would lose the batch file.
    pub fn record(&self, event: &Event) {
        if let Err(e) = self.append(event) {
            eprintln!("Warning: failed to log {} event: {}", event.action, e);
        }
    }

    /// Read every event back, oldest first.
    #[cfg(test)]
    pub fn read_all(&self) -> Result<Vec<Event>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| {
            AgentError::PersistenceError(format!(
                "failed to read events file '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    AgentError::PersistenceError(format!("malformed event line: {}", e))
                })
            })
            .collect()
    }
}
