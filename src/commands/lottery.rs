//! Implementation of the `lottery` subcommands.

use crate::cli::{CreateArgs, LotteryIdArgs};
use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::events::{Event, EventAction, EventLog};
use crate::ledger::{EvmLedger, LotteryGateway};
use crate::lottery::{CreateLotteryParams, parse_lottery_id};
use crate::provision::emit;
use crate::units::{format_units, parse_units};
use crate::wallet::Address;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

/// Execute `lottery info <id>`.
pub fn cmd_lottery_info(config_path: Option<&Path>, args: LotteryIdArgs) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let settings = config.evm_settings(true)?;
    let lottery_id = parse_lottery_id(&args.lottery_id)?;

    let ledger = EvmLedger::new(settings)?;
    show_lottery(&ledger, lottery_id, &mut io::stdout().lock())
}

/// Execute `lottery list`.
pub fn cmd_lottery_list(config_path: Option<&Path>) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let settings = config.evm_settings(true)?;

    let ledger = EvmLedger::new(settings)?;
    list_lotteries(&ledger, &mut io::stdout().lock())
}

/// Execute `lottery draw <id>`.
pub fn cmd_lottery_draw(config_path: Option<&Path>, args: LotteryIdArgs) -> Result<()> {
    run_admin_action(config_path, &args, AdminAction::Draw)
}

/// Execute `lottery cancel <id>`.
pub fn cmd_lottery_cancel(config_path: Option<&Path>, args: LotteryIdArgs) -> Result<()> {
    run_admin_action(config_path, &args, AdminAction::Cancel)
}

fn run_admin_action(
    config_path: Option<&Path>,
    args: &LotteryIdArgs,
    action: AdminAction,
) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let settings = config.evm_settings(true)?;
    let lottery_id = parse_lottery_id(&args.lottery_id)?;

    let ledger = EvmLedger::new(settings)?;
    let events = EventLog::new(&config.events_file);
    administer(&ledger, &events, action, lottery_id, &mut io::stdout().lock())
}

/// Execute `lottery create`.
pub fn cmd_lottery_create(config_path: Option<&Path>, args: CreateArgs) -> Result<()> {
    let config = Config::resolve(config_path)?;
    let settings = config.evm_settings(true)?;
    let default_token = settings.token;

    let ledger = EvmLedger::new(settings)?;
    let events = EventLog::new(&config.events_file);
    let now = Utc::now().timestamp().max(0) as u64;

    create_lottery(
        &ledger,
        &events,
        &args,
        default_token,
        now,
        &mut io::stdout().lock(),
    )
}

/// Print every field of a lottery, amounts in its own token's units.
pub(crate) fn show_lottery<G, W>(gateway: &G, lottery_id: u64, out: &mut W) -> Result<()>
where
    G: LotteryGateway,
    W: Write,
{
    let info = gateway.lottery_info(lottery_id)?;
    let decimals = gateway.decimals_of(&info.token_address)?;
    let amount = |value: u128| format_units(value, decimals);

    let draw_time = i64::try_from(info.draw_time)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| info.draw_time.to_string());

    emit(out, format_args!("Lottery #{} [{}]", lottery_id, info.status()))?;
    emit(out, format_args!("  Token:             {}", info.token_address))?;
    emit(out, format_args!("  Participation fee: {}", amount(info.participation_fee)))?;
    emit(out, format_args!("  Refundable:        {}", amount(info.refundable_amount)))?;
    emit(out, format_args!("  Prize:             {}", amount(info.prize_amount)))?;
    emit(out, format_args!("  Fee to investment: {}", amount(info.fee_to_investment)))?;
    emit(out, format_args!("  Fee to profit:     {}", amount(info.fee_to_profit)))?;
    emit(
        out,
        format_args!(
            "  Participants:      {}/{}",
            info.participants.len(),
            info.max_participants
        ),
    )?;
    emit(out, format_args!("  Draw time:         {}", draw_time))?;
    emit(out, format_args!("  Votes:             {}", info.vote_count))?;
    if !info.winner.is_zero() {
        emit(out, format_args!("  Winner:            {}", info.winner))?;
    }
    for (i, participant) in info.participants.iter().enumerate() {
        emit(out, format_args!("    {:>3}. {}", i + 1, participant))?;
    }
    Ok(())
}

/// Print the active and drawn lottery ids.
pub(crate) fn list_lotteries<G, W>(gateway: &G, out: &mut W) -> Result<()>
where
    G: LotteryGateway,
    W: Write,
{
    let active = gateway.active_lotteries()?;
    let drawn = gateway.drawn_lotteries()?;
    emit(out, format_args!("Active lotteries: {}", render_ids(&active)))?;
    emit(out, format_args!("Drawn lotteries:  {}", render_ids(&drawn)))
}

fn render_ids(ids: &[u64]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter()
        .map(|id| format!("#{}", id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// An admin-signed transaction against one lottery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AdminAction {
    Draw,
    Cancel,
}

impl AdminAction {
    fn method(self) -> &'static str {
        match self {
            AdminAction::Draw => "drawWinner",
            AdminAction::Cancel => "cancelLottery",
        }
    }

    fn event(self) -> EventAction {
        match self {
            AdminAction::Draw => EventAction::WinnerDrawn,
            AdminAction::Cancel => EventAction::LotteryCancelled,
        }
    }
}

/// Submit a draw or cancel for `lottery_id` from the admin account and wait
/// for it. A revert is returned as a ledger error and nothing is logged.
pub(crate) fn administer<G, W>(
    gateway: &G,
    events: &EventLog,
    action: AdminAction,
    lottery_id: u64,
    out: &mut W,
) -> Result<()>
where
    G: LotteryGateway,
    W: Write,
{
    let tx = match action {
        AdminAction::Draw => gateway.draw_winner(lottery_id)?,
        AdminAction::Cancel => gateway.cancel_lottery(lottery_id)?,
    };
    emit(out, format_args!("⏳ {} submitted: {}", action.method(), tx))?;
    gateway.confirm(&tx)?;

    events.record(&Event::new(action.event()).with_details(json!({
        "tx": tx.to_string(),
        "lottery_id": lottery_id,
    })));
    match action {
        AdminAction::Draw => emit(
            out,
            format_args!("✅ Winner drawn for lottery #{} (tx {})", lottery_id, tx),
        ),
        AdminAction::Cancel => emit(
            out,
            format_args!("✅ Lottery #{} cancelled (tx {})", lottery_id, tx),
        ),
    }
}

/// Validate the arguments, then submit `createLottery` from the admin account
/// and wait for it.
///
/// Everything that can be checked locally is checked before the gateway is
/// asked for the token's decimals.
pub(crate) fn create_lottery<G, W>(
    gateway: &G,
    events: &EventLog,
    args: &CreateArgs,
    default_token: Address,
    now: u64,
    out: &mut W,
) -> Result<()>
where
    G: LotteryGateway,
    W: Write,
{
    let token = match &args.token {
        Some(raw) => Address::from_str(raw)
            .map_err(|_| AgentError::InvalidInput("Invalid token address".to_string()))?,
        None => default_token,
    };
    if token.is_zero() {
        return Err(AgentError::InvalidInput("Invalid token address".to_string()));
    }
    if args.draw_time <= now {
        return Err(AgentError::InvalidInput(
            "Draw time must be in the future".to_string(),
        ));
    }

    let decimals = gateway.decimals_of(&token)?;
    let units = |value: &str| parse_units(value, decimals);
    let params = CreateLotteryParams {
        token_address: token,
        participation_fee: units(&args.fee)?,
        refundable_amount: units(&args.refundable)?,
        max_participants: u128::from(args.max_participants),
        draw_time: args.draw_time,
        prize_amount: units(&args.prize)?,
        fee_to_investment: units(&args.fee_to_investment)?,
        fee_to_profit: units(&args.fee_to_profit)?,
    };
    params.validate(now)?;

    let tx = gateway.create_lottery(&params)?;
    emit(out, format_args!("⏳ createLottery submitted: {}", tx))?;
    gateway.confirm(&tx)?;

    events.record(&Event::new(EventAction::LotteryCreated).with_details(json!({
        "tx": tx.to_string(),
        "token": token.to_string(),
        "participation_fee": args.fee,
        "max_participants": args.max_participants,
        "draw_time": args.draw_time,
    })));
    emit(out, format_args!("✅ Lottery created (tx {})", tx))
}
