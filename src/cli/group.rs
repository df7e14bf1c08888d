//! Group CLI commands
//!
//! Implements CLI commands for group and membership management.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::group::{format_group_details, format_group_list};
use crate::error::{TallyError, TallyResult};
use crate::models::SplitMethod;
use crate::services::GroupService;
use crate::storage::Storage;

/// Group subcommands
#[derive(Subcommand)]
pub enum GroupCommands {
    /// Create a new group
    Create {
        /// Group name
        name: String,
        /// Three-letter currency code (defaults to the configured currency)
        #[arg(short, long)]
        currency: Option<String>,
        /// Default split method (equal, percentage, fixed)
        #[arg(short, long)]
        split: Option<String>,
    },
    /// List all groups
    List,
    /// Show group details and members
    Show {
        /// Group name or ID
        group: String,
    },
    /// Add a member to a group
    AddMember {
        /// Group name or ID
        group: String,
        /// Member name
        name: String,
    },
    /// Mark a member as having left a group
    RemoveMember {
        /// Group name or ID
        group: String,
        /// Member name or ID
        member: String,
        /// Remove even if the member still has a balance
        #[arg(long)]
        force: bool,
    },
    /// Delete a group
    Delete {
        /// Group name or ID
        group: String,
        /// Also delete the group's expenses
        #[arg(long)]
        force: bool,
    },
}

/// Parse a split method name from the command line
pub(crate) fn parse_split_method(value: &str) -> TallyResult<SplitMethod> {
    value.parse().map_err(TallyError::Validation)
}

/// Handle a group command
pub fn handle_group_command(
    storage: &Storage,
    settings: &Settings,
    cmd: GroupCommands,
) -> TallyResult<()> {
    let service = GroupService::new(storage);

    match cmd {
        GroupCommands::Create {
            name,
            currency,
            split,
        } => {
            let currency = currency.unwrap_or_else(|| settings.default_currency.clone());
            let split = match split {
                Some(s) => parse_split_method(&s)?,
                None => settings.default_split,
            };

            let group = service.create(&name, &currency, split)?;

            println!("Created group: {}", group.name);
            println!("  Currency:      {}", group.currency);
            println!("  Default split: {}", group.default_split);
            println!("  ID:            {}", group.id);
        }

        GroupCommands::List => {
            let groups = service.list()?;
            println!("{}", format_group_list(&groups));
        }

        GroupCommands::Show { group } => {
            let found = service.require(&group)?;
            let expense_count = storage.expenses.count_by_group(found.id)?;
            print!("{}", format_group_details(&found, expense_count));
        }

        GroupCommands::AddMember { group, name } => {
            let (group, member) = service.add_member(&group, &name)?;
            println!("Added {} to '{}' ({})", member.name, group.name, member.id);
        }

        GroupCommands::RemoveMember {
            group,
            member,
            force,
        } => {
            let removed = service.remove_member(&group, &member, force)?;
            println!("{} has left the group", removed.name);
        }

        GroupCommands::Delete { group, force } => {
            let (group, expenses) = service.delete(&group, force)?;
            if expenses > 0 {
                println!(
                    "Deleted group '{}' and {} expense(s)",
                    group.name, expenses
                );
            } else {
                println!("Deleted group '{}'", group.name);
            }
        }
    }

    Ok(())
}
