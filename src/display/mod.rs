//! Display formatting for terminal output
//!
//! List views are rendered with `tabled`; detail views are laid out by hand.

pub mod expense;
pub mod group;
pub mod settlement;

pub use expense::{format_expense_details, format_expense_list};
pub use group::{format_group_details, format_group_list};
pub use settlement::{format_balances, format_plan};
