//! Service layer for Tally
//!
//! Business logic on top of the storage layer: validation, engine calls,
//! persistence and audit logging.

pub mod expense;
pub mod group;
pub mod settlement;

pub use expense::{AddExpenseInput, ExpenseService};
pub use group::GroupService;
pub use settlement::{GroupSnapshot, SettlementPlan, SettlementService};
