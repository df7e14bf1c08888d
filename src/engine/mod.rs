//! Balance and settlement engine
//!
//! Pure functions over in-memory data; nothing here touches storage.
//!
//! - [`split`] validates raw shares and produces exact splits
//! - [`balance`] folds expenses into per-member net balances
//! - [`settlement`] turns net balances into transfers

pub mod balance;
pub mod error;
pub mod settlement;
pub mod split;

pub use balance::{compute_balances, NetBalances};
pub use error::{EngineError, InvalidSplitReason};
pub use settlement::{plan, SettlementPlanner, SettlementTransfer, MAX_EXACT_MEMBERS};
pub use split::{normalize, SplitShares, PERCENTAGE_EPSILON_BP};
