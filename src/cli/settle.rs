//! Balance and settlement CLI commands

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::settlement::{format_balances, format_plan};
use crate::error::TallyResult;
use crate::services::{GroupService, SettlementService};
use crate::storage::Storage;

use super::expense::parse_amount;

/// Settlement subcommands
#[derive(Subcommand)]
pub enum SettleCommands {
    /// Suggest transfers that settle every balance
    Plan {
        /// Group name or ID
        group: String,
        /// Search for the fewest possible transfers (small groups only)
        #[arg(long)]
        exact: bool,
    },
    /// Record a payment from one member to another
    Record {
        /// Group name or ID
        group: String,
        /// Member who paid
        from: String,
        /// Member who received the money
        to: String,
        /// Amount (e.g., "30.00")
        amount: String,
    },
}

/// Show net balances of a group
pub fn handle_balance_command(storage: &Storage, group: &str) -> TallyResult<()> {
    let group = GroupService::new(storage).require(group)?;
    let balances = SettlementService::new(storage).balances(group.id)?;

    println!("{}", format_balances(&group, &balances));
    Ok(())
}

/// Handle a settle command
pub fn handle_settle_command(
    storage: &Storage,
    settings: &Settings,
    cmd: SettleCommands,
) -> TallyResult<()> {
    let groups = GroupService::new(storage);
    let service = SettlementService::new(storage);

    match cmd {
        SettleCommands::Plan { group, exact } => {
            let group = groups.require(&group)?;
            let plan = service.plan(group.id, settings.planner(exact))?;
            print!("{}", format_plan(&plan.group, &plan.transfers));
            if plan.transfers.is_empty() {
                println!();
            }
        }

        SettleCommands::Record {
            group,
            from,
            to,
            amount,
        } => {
            let group = groups.require(&group)?;
            let amount = parse_amount(&amount)?;
            let expense = service.record(group.id, &from, &to, amount)?;
            println!(
                "Recorded settlement: {} ({}, {})",
                expense.description,
                expense.amount.format_with_code(&group.currency),
                expense.id
            );
        }
    }

    Ok(())
}
