//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod expense;
pub mod export;
pub mod group;
pub mod settle;

pub use expense::{handle_expense_command, ExpenseCommands};
pub use export::{handle_export_command, ExportArgs, ExportFormat};
pub use group::{handle_group_command, GroupCommands};
pub use settle::{handle_balance_command, handle_settle_command, SettleCommands};
