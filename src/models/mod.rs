//! Core data models for Tally
//!
//! This module contains the data structures that represent the shared
//! expense domain: groups, members, expenses and their splits.

pub mod expense;
pub mod group;
pub mod ids;
pub mod money;
pub mod percentage;

pub use expense::{Expense, ExpenseKind, ExpenseValidationError, Split, SplitMethod};
pub use group::{validate_currency_code, Group, GroupValidationError, Member};
pub use ids::{ExpenseId, GroupId, MemberId};
pub use money::{Money, MoneyParseError};
pub use percentage::{Percentage, PercentageParseError};
