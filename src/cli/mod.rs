//! CLI argument parsing for lottery-agents.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Lottery-agents: provision funded test accounts and drive a lottery contract.
///
/// Agents are generated keypairs persisted to a CSV batch file:
/// - `provision` creates and funds a batch, or refreshes an existing one
/// - `join` enters every agent in the batch into a lottery
/// - `lottery` inspects, lists, creates, draws or cancels lotteries
#[derive(Parser, Debug)]
#[command(name = "lottery-agents")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the YAML configuration file (default: lottery-agents.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for lottery-agents.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create and fund a batch of agents.
    ///
    /// When the batch file already exists, no agents are created and nothing
    /// is sent; balances are refreshed and the file rewritten.
    Provision(ProvisionArgs),

    /// Enter every agent in the batch into a lottery.
    ///
    /// Each agent approves the participation fee and then enters, signing
    /// with its own key.
    Join(JoinArgs),

    /// Inspect and administer lotteries.
    Lottery(LotteryCommand),
}

/// Arguments for the `provision` command.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Number of agents to create (prompted for when omitted).
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    pub count: Option<String>,
}

/// Arguments for the `join` command.
#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Lottery to enter (prompted for when omitted).
    pub lottery_id: Option<String>,
}

/// Lottery subcommands.
#[derive(Args, Debug)]
pub struct LotteryCommand {
    #[command(subcommand)]
    pub action: LotteryAction,
}

#[derive(Subcommand, Debug)]
pub enum LotteryAction {
    /// Print a lottery's state.
    Info(LotteryIdArgs),

    /// Print the ids of active and drawn lotteries.
    List,

    /// Create a lottery signed by the admin account.
    Create(CreateArgs),

    /// Draw a lottery's winner, signed by the admin account.
    Draw(LotteryIdArgs),

    /// Cancel a lottery, signed by the admin account.
    Cancel(LotteryIdArgs),
}

/// Arguments for the lottery subcommands that act on one lottery.
#[derive(Args, Debug)]
pub struct LotteryIdArgs {
    /// Lottery ID (starts at 1).
    pub lottery_id: String,
}

/// Arguments for `lottery create`.
///
/// Amounts are decimal strings in token units (e.g. `10.5`).
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Participation fee paid by each entrant.
    #[arg(long)]
    pub fee: String,

    /// Part of the fee refunded to non-winners.
    #[arg(long)]
    pub refundable: String,

    /// Maximum number of entrants.
    #[arg(long)]
    pub max_participants: u64,

    /// Draw time as unix seconds.
    #[arg(long)]
    pub draw_time: u64,

    /// Prize paid to the winner.
    #[arg(long)]
    pub prize: String,

    /// Fee share routed to investment.
    #[arg(long)]
    pub fee_to_investment: String,

    /// Fee share routed to profit.
    #[arg(long)]
    pub fee_to_profit: String,

    /// Token the lottery is priced in (default: the funding token).
    #[arg(long)]
    pub token: Option<String>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_provision_without_count() {
        let cli = Cli::try_parse_from(["lottery-agents", "provision"]).unwrap();
        assert!(cli.config.is_none());
        match cli.command {
            Command::Provision(args) => assert!(args.count.is_none()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_provision_with_count_and_config() {
        let cli = Cli::try_parse_from([
            "lottery-agents",
            "provision",
            "--count",
            "5",
            "--config",
            "custom.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Command::Provision(args) => assert_eq!(args.count.as_deref(), Some("5")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn count_is_kept_as_text_for_validation() {
        let cli = Cli::try_parse_from(["lottery-agents", "provision", "-n", "-3"]).unwrap();
        match cli.command {
            Command::Provision(args) => assert_eq!(args.count.as_deref(), Some("-3")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_join() {
        let cli = Cli::try_parse_from(["lottery-agents", "join", "7"]).unwrap();
        match cli.command {
            Command::Join(args) => assert_eq!(args.lottery_id.as_deref(), Some("7")),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["lottery-agents", "join"]).unwrap();
        match cli.command {
            Command::Join(args) => assert!(args.lottery_id.is_none()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_lottery_info() {
        let cli = Cli::try_parse_from(["lottery-agents", "lottery", "info", "2"]).unwrap();
        match cli.command {
            Command::Lottery(LotteryCommand {
                action: LotteryAction::Info(args),
            }) => assert_eq!(args.lottery_id, "2"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_lottery_create() {
        let cli = Cli::try_parse_from([
            "lottery-agents",
            "lottery",
            "create",
            "--fee",
            "10",
            "--refundable",
            "8",
            "--max-participants",
            "20",
            "--draw-time",
            "4102444800",
            "--prize",
            "150",
            "--fee-to-investment",
            "1",
            "--fee-to-profit",
            "1",
        ])
        .unwrap();
        match cli.command {
            Command::Lottery(LotteryCommand {
                action: LotteryAction::Create(args),
            }) => {
                assert_eq!(args.fee, "10");
                assert_eq!(args.max_participants, 20);
                assert_eq!(args.draw_time, 4_102_444_800);
                assert!(args.token.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_lottery_admin_actions() {
        let cli = Cli::try_parse_from(["lottery-agents", "lottery", "draw", "3"]).unwrap();
        match cli.command {
            Command::Lottery(LotteryCommand {
                action: LotteryAction::Draw(args),
            }) => assert_eq!(args.lottery_id, "3"),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["lottery-agents", "lottery", "cancel", "4"]).unwrap();
        match cli.command {
            Command::Lottery(LotteryCommand {
                action: LotteryAction::Cancel(args),
            }) => assert_eq!(args.lottery_id, "4"),
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["lottery-agents", "lottery", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Lottery(LotteryCommand {
                action: LotteryAction::List,
            })
        ));
    }

    #[test]
    fn lottery_draw_requires_id() {
        assert!(Cli::try_parse_from(["lottery-agents", "lottery", "draw"]).is_err());
    }

    #[test]
    fn lottery_create_requires_amounts() {
        let result = Cli::try_parse_from(["lottery-agents", "lottery", "create", "--fee", "10"]);
        assert!(result.is_err());
    }
}
