//! Command implementations for lottery-agents.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations. Every command resolves and validates its configuration
//! before it talks to the ledger.

mod join;
mod lottery;
mod provision;

use crate::cli::{Command, LotteryAction};
use crate::error::{AgentError, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Dispatch a command to its implementation.
///
/// This is the main entry point for command execution. `config_path` is the
/// value of the global `--config` flag.
pub fn dispatch(config_path: Option<&Path>, command: Command) -> Result<()> {
    match command {
        Command::Provision(args) => provision::cmd_provision(config_path, args),
        Command::Join(args) => join::cmd_join(config_path, args),
        Command::Lottery(lottery_cmd) => match lottery_cmd.action {
            LotteryAction::Info(args) => lottery::cmd_lottery_info(config_path, args),
            LotteryAction::List => lottery::cmd_lottery_list(config_path),
            LotteryAction::Create(args) => lottery::cmd_lottery_create(config_path, args),
            LotteryAction::Draw(args) => lottery::cmd_lottery_draw(config_path, args),
            LotteryAction::Cancel(args) => lottery::cmd_lottery_cancel(config_path, args),
        },
    }
}

/// Ask the operator a question on stdout and read one line from stdin.
pub(crate) fn prompt(question: &str) -> Result<String> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "{} ", question)
        .and_then(|()| stdout.flush())
        .map_err(|e| AgentError::InvalidInput(format!("failed to write prompt: {}", e)))?;

    read_answer(&mut io::stdin().lock())
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|e| AgentError::InvalidInput(format!("failed to read input: {}", e)))?;
    if read == 0 {
        return Err(AgentError::InvalidInput(
            "no input received (stdin closed)".to_string(),
        ));
    }
    Ok(line.trim().to_string())
}
