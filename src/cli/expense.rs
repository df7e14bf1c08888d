//! Expense CLI commands
//!
//! Amounts are entered as decimal text and converted to minor units here,
//! before anything reaches the service layer.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::expense::{format_expense_details, format_expense_list};
use crate::engine::SplitShares;
use crate::error::{TallyError, TallyResult};
use crate::models::{Group, MemberId, Money, Percentage, SplitMethod};
use crate::services::{AddExpenseInput, ExpenseService, GroupService};
use crate::storage::Storage;

use super::group::parse_split_method;

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record a new expense
    Add {
        /// Group name or ID
        group: String,
        /// Amount (e.g., "12.50")
        amount: String,
        /// Member who paid
        #[arg(short, long)]
        payer: String,
        /// Description
        #[arg(short, long, default_value = "")]
        desc: String,
        /// Split method (defaults to the group's)
        #[arg(short, long)]
        split: Option<String>,
        /// Share per member as member=value, a percentage or an amount
        /// depending on the split method (repeatable)
        #[arg(long = "share", value_name = "MEMBER=VALUE")]
        shares: Vec<String>,
        /// Restrict an equal split to these members (repeatable)
        #[arg(short, long = "with", value_name = "MEMBER")]
        with: Vec<String>,
    },
    /// List expenses of a group, newest first
    List {
        /// Group name or ID
        group: String,
        /// Number of expenses to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show expense details
    Show {
        /// Expense ID
        expense: String,
    },
    /// Delete an expense
    Delete {
        /// Expense ID
        expense: String,
        /// Delete even if repayments were recorded
        #[arg(long)]
        force: bool,
    },
    /// Record a repayment of a member's share
    Pay {
        /// Expense ID
        expense: String,
        /// Member name or ID
        member: String,
        /// Amount repaid (defaults to the whole outstanding share)
        amount: Option<String>,
    },
}

/// Handle an expense command
pub fn handle_expense_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ExpenseCommands,
) -> TallyResult<()> {
    let service = ExpenseService::new(storage);
    let groups = GroupService::new(storage);

    match cmd {
        ExpenseCommands::Add {
            group,
            amount,
            payer,
            desc,
            split,
            shares,
            with,
        } => {
            let group = groups.require(&group)?;
            let amount = parse_amount(&amount)?;
            let payer = resolve_member(&group, &payer)?;
            let method = match split {
                Some(s) => parse_split_method(&s)?,
                None => group.default_split,
            };
            let shares = build_shares(&group, method, &shares, &with)?;

            let expense = service.add(AddExpenseInput {
                group_id: group.id,
                payer,
                amount,
                description: desc,
                shares,
            })?;

            println!(
                "Recorded {} paid by {} ({})",
                expense.amount.format_with_code(&group.currency),
                group.member_name(expense.payer),
                expense.id
            );
            for split in &expense.splits {
                println!(
                    "  {:<16} {}",
                    group.member_name(split.member_id),
                    split.amount
                );
            }
        }

        ExpenseCommands::List { group, limit } => {
            let group = groups.require(&group)?;
            let expenses = service.list(group.id, limit)?;
            println!(
                "{}",
                format_expense_list(&group, &expenses, &settings.date_format)
            );
        }

        ExpenseCommands::Show { expense } => {
            let expense = service.require(&expense)?;
            let group = groups
                .get(expense.group_id)?
                .ok_or_else(|| TallyError::group_not_found(expense.group_id.to_string()))?;
            print!(
                "{}",
                format_expense_details(&group, &expense, &settings.date_format)
            );
        }

        ExpenseCommands::Delete { expense, force } => {
            let deleted = service.delete(&expense, force)?;
            println!("Deleted {}: {} ({})", deleted.kind, deleted.description, deleted.amount);
        }

        ExpenseCommands::Pay {
            expense,
            member,
            amount,
        } => {
            let amount = amount.as_deref().map(parse_amount).transpose()?;
            let found = service.require(&expense)?;
            let group = groups
                .get(found.group_id)?
                .ok_or_else(|| TallyError::group_not_found(found.group_id.to_string()))?;
            let member_id = resolve_member(&group, &member)?;

            let updated = service.pay(&expense, &member, amount)?;
            if let Some(split) = updated.split_for(member_id) {
                if split.is_paid {
                    println!(
                        "{} repaid their share of {}",
                        group.member_name(member_id),
                        split.amount
                    );
                } else {
                    println!(
                        "{} repaid {} of {}; {} outstanding",
                        group.member_name(member_id),
                        split.repaid(),
                        split.amount,
                        split.outstanding()
                    );
                }
            }
        }
    }

    Ok(())
}

/// Parse a decimal amount into minor units
pub(crate) fn parse_amount(value: &str) -> TallyResult<Money> {
    Money::parse(value).map_err(|e| {
        TallyError::Validation(format!(
            "Invalid amount '{}'. Use a format like '12.50'. Error: {}",
            value, e
        ))
    })
}

/// Resolve a member name or ID within a group
fn resolve_member(group: &Group, identifier: &str) -> TallyResult<MemberId> {
    group
        .find_member(identifier)
        .map(|m| m.id)
        .ok_or_else(|| TallyError::member_not_found(identifier))
}

/// Split `member=value` at the last '='
fn parse_share(raw: &str) -> TallyResult<(&str, &str)> {
    raw.rsplit_once('=')
        .map(|(member, value)| (member.trim(), value.trim()))
        .filter(|(member, value)| !member.is_empty() && !value.is_empty())
        .ok_or_else(|| {
            TallyError::Validation(format!(
                "Invalid share '{}'. Use member=value, e.g. Ann=40",
                raw
            ))
        })
}

/// Turn `--share` and `--with` arguments into split shares for `method`
fn build_shares(
    group: &Group,
    method: SplitMethod,
    shares: &[String],
    with: &[String],
) -> TallyResult<SplitShares> {
    match method {
        SplitMethod::Equal => {
            if !shares.is_empty() {
                return Err(TallyError::Validation(
                    "--share needs a percentage or fixed split; use --with to pick members".into(),
                ));
            }
            let members = with
                .iter()
                .map(|m| resolve_member(group, m))
                .collect::<TallyResult<Vec<_>>>()?;
            Ok(SplitShares::Equal(members))
        }
        SplitMethod::Percentage => {
            reject_with(with)?;
            let parsed = shares
                .iter()
                .map(|raw| {
                    let (member, value) = parse_share(raw)?;
                    let pct = Percentage::parse(value)
                        .map_err(|e| TallyError::Validation(e.to_string()))?;
                    Ok((resolve_member(group, member)?, pct))
                })
                .collect::<TallyResult<Vec<_>>>()?;
            Ok(SplitShares::Percentage(parsed))
        }
        SplitMethod::Fixed => {
            reject_with(with)?;
            let parsed = shares
                .iter()
                .map(|raw| {
                    let (member, value) = parse_share(raw)?;
                    Ok((resolve_member(group, member)?, parse_amount(value)?))
                })
                .collect::<TallyResult<Vec<_>>>()?;
            Ok(SplitShares::Fixed(parsed))
        }
    }
}

fn reject_with(with: &[String]) -> TallyResult<()> {
    if with.is_empty() {
        Ok(())
    } else {
        Err(TallyError::Validation(
            "--with only applies to equal splits; list every member with --share".into(),
        ))
    }
}
