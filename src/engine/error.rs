//! Errors raised by the balance and settlement engine.
//!
//! - [`InvalidSplit`] rejects user input before anything is persisted.
//! - [`BalanceInconsistency`] means stored expense data is corrupt.
//! - [`UnsettleableInput`] means the planner was handed balances that do not
//!   sum to zero.
//!
//! None of them is retried: recomputing the same input cannot succeed.
//!
//! [`InvalidSplit`]: EngineError::InvalidSplit
//! [`BalanceInconsistency`]: EngineError::BalanceInconsistency
//! [`UnsettleableInput`]: EngineError::UnsettleableInput

use thiserror::Error;

use crate::models::{MemberId, Money, Percentage};

/// Engine errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid split: {0}")]
    InvalidSplit(InvalidSplitReason),
    #[error("Balance inconsistency: {0}")]
    BalanceInconsistency(String),
    #[error("Unsettleable input: {0}")]
    UnsettleableInput(String),
}

/// Why a proposed split was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidSplitReason {
    #[error("non-positive expense amount {0}")]
    NonPositiveAmount(Money),
    #[error("amount mismatch: shares total {shares_total}, expense amount is {expense_amount}")]
    AmountMismatch {
        expense_amount: Money,
        shares_total: Money,
    },
    #[error("percentages sum to {0}, expected 100.00%")]
    PercentageSum(Percentage),
    #[error("unknown member {0}")]
    UnknownMember(MemberId),
    #[error("member {0} listed more than once")]
    DuplicateMember(MemberId),
    #[error("negative share for member {0}")]
    NegativeShare(MemberId),
    #[error("no participants")]
    NoParticipants,
    #[error("rounding drift of {0} minor units cannot be absorbed")]
    UnabsorbableDrift(i64),
    #[error("amount overflow")]
    Overflow,
}

impl From<InvalidSplitReason> for EngineError {
    fn from(reason: InvalidSplitReason) -> Self {
        Self::InvalidSplit(reason)
    }
}

/// Log and build a [`EngineError::BalanceInconsistency`]
pub(crate) fn inconsistency(message: String) -> EngineError {
    tracing::error!(%message, "balance inconsistency");
    EngineError::BalanceInconsistency(message)
}

/// Log and build a [`EngineError::UnsettleableInput`]
pub(crate) fn unsettleable(message: String) -> EngineError {
    tracing::error!(%message, "unsettleable balances");
    EngineError::UnsettleableInput(message)
}
