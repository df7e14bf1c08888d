//! Expense model
//!
//! An expense is money one member fronted for the group, divided into splits
//! owed by the participants. Splits track partial repayments so that balances
//! shrink as members pay the payer back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::ids::{ExpenseId, GroupId, MemberId};
use super::money::Money;
use super::percentage::Percentage;

/// How an expense amount is divided among participants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    #[default]
    Equal,
    Percentage,
    Fixed,
}

impl fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "equal"),
            Self::Percentage => write!(f, "percentage"),
            Self::Fixed => write!(f, "fixed"),
        }
    }
}

impl FromStr for SplitMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" | "even" => Ok(Self::Equal),
            "percentage" | "percent" | "pct" => Ok(Self::Percentage),
            "fixed" | "exact" | "amount" => Ok(Self::Fixed),
            other => Err(format!(
                "Invalid split method: '{}'. Use equal, percentage, or fixed",
                other
            )),
        }
    }
}

/// Whether an expense is a real purchase or a recorded repayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseKind {
    #[default]
    Expense,
    /// A direct payment between two members, stored as an expense paid by
    /// the debtor and owed entirely by the creditor
    Settlement,
}

impl fmt::Display for ExpenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expense => write!(f, "Expense"),
            Self::Settlement => write!(f, "Settlement"),
        }
    }
}

/// One member's allocated share of an expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub member_id: MemberId,

    /// Allocated amount in minor units
    pub amount: Money,

    /// Raw percentage this share was derived from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Percentage>,

    /// Amount repaid to the payer so far
    #[serde(default)]
    pub paid: Money,

    #[serde(default)]
    pub is_paid: bool,
}

impl Split {
    pub fn new(member_id: MemberId, amount: Money) -> Self {
        Self {
            member_id,
            amount,
            percentage: None,
            paid: Money::zero(),
            is_paid: false,
        }
    }

    pub fn with_percentage(member_id: MemberId, amount: Money, percentage: Percentage) -> Self {
        Self {
            percentage: Some(percentage),
            ..Self::new(member_id, amount)
        }
    }

    /// What the member still owes on this split
    pub fn outstanding(&self) -> Money {
        if self.is_paid {
            Money::zero()
        } else {
            self.amount - self.paid
        }
    }

    /// What the member has already repaid on this split
    pub fn repaid(&self) -> Money {
        self.amount - self.outstanding()
    }

    /// Record a (partial) repayment
    pub fn record_payment(&mut self, amount: Money) -> Result<(), ExpenseValidationError> {
        if !amount.is_positive() {
            return Err(ExpenseValidationError::NonPositivePayment(amount));
        }
        let outstanding = self.outstanding();
        if amount > outstanding {
            return Err(ExpenseValidationError::Overpayment {
                outstanding,
                attempted: amount,
            });
        }

        self.paid += amount;
        if self.paid == self.amount {
            self.is_paid = true;
        }
        Ok(())
    }

    /// Mark the whole split as repaid
    pub fn mark_paid(&mut self) {
        self.paid = self.amount;
        self.is_paid = true;
    }

    fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.amount.is_negative() {
            return Err(ExpenseValidationError::NegativeSplit(self.member_id.to_string()));
        }
        if self.paid.is_negative() || self.paid > self.amount {
            return Err(ExpenseValidationError::PaidOutOfRange {
                member: self.member_id.to_string(),
                paid: self.paid,
                amount: self.amount,
            });
        }
        Ok(())
    }
}

/// An expense recorded in a group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub group_id: GroupId,

    #[serde(default)]
    pub description: String,

    /// Total amount in minor units (always positive)
    pub amount: Money,

    /// Member who fronted the money
    pub payer: MemberId,

    #[serde(default)]
    pub kind: ExpenseKind,

    /// Split method the splits were produced with
    #[serde(default)]
    pub method: SplitMethod,

    /// Splits in group membership order
    #[serde(default)]
    pub splits: Vec<Split>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        group_id: GroupId,
        payer: MemberId,
        amount: Money,
        description: impl Into<String>,
        method: SplitMethod,
        splits: Vec<Split>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpenseId::new(),
            group_id,
            description: description.into(),
            amount,
            payer,
            kind: ExpenseKind::Expense,
            method,
            splits,
            created_at: now,
            updated_at: now,
        }
    }

    /// A repayment from `from` to `to`
    pub fn settlement(group_id: GroupId, from: MemberId, to: MemberId, amount: Money) -> Self {
        let mut expense = Self::new(
            group_id,
            from,
            amount,
            "Settlement",
            SplitMethod::Fixed,
            vec![Split::new(to, amount)],
        );
        expense.kind = ExpenseKind::Settlement;
        expense
    }

    pub fn is_settlement(&self) -> bool {
        self.kind == ExpenseKind::Settlement
    }

    pub fn splits_total(&self) -> Money {
        self.splits.iter().map(|s| s.amount).sum()
    }

    /// Sum of split amounts, `None` if it overflows
    pub fn checked_splits_total(&self) -> Option<Money> {
        self.splits
            .iter()
            .try_fold(Money::zero(), |total, s| total.checked_add(s.amount))
    }

    pub fn outstanding_total(&self) -> Money {
        self.splits.iter().map(|s| s.outstanding()).sum()
    }

    pub fn split_for(&self, member: MemberId) -> Option<&Split> {
        self.splits.iter().find(|s| s.member_id == member)
    }

    pub fn split_for_mut(&mut self, member: MemberId) -> Option<&mut Split> {
        self.splits.iter_mut().find(|s| s.member_id == member)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate the stored shape of the expense
    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if !self.amount.is_positive() {
            return Err(ExpenseValidationError::NonPositiveAmount(self.amount));
        }
        if self.splits.is_empty() {
            return Err(ExpenseValidationError::NoSplits);
        }
        for split in &self.splits {
            split.validate()?;
        }
        let splits_total = self
            .checked_splits_total()
            .ok_or(ExpenseValidationError::Overflow)?;
        if splits_total != self.amount {
            return Err(ExpenseValidationError::SplitsMismatch {
                expense_amount: self.amount,
                splits_total,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.created_at.format("%Y-%m-%d"),
            self.description,
            self.amount
        )
    }
}

/// Validation errors for expenses and split payments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpenseValidationError {
    #[error("Expense amount must be positive, got {0}")]
    NonPositiveAmount(Money),
    #[error("Expense has no splits")]
    NoSplits,
    #[error("Split totals ({splits_total}) do not match expense amount ({expense_amount})")]
    SplitsMismatch {
        expense_amount: Money,
        splits_total: Money,
    },
    #[error("Split totals overflow")]
    Overflow,
    #[error("Split for {0} is negative")]
    NegativeSplit(String),
    #[error("Split for {member} has paid {paid} outside 0..={amount}")]
    PaidOutOfRange {
        member: String,
        paid: Money,
        amount: Money,
    },
    #[error("Payment must be positive, got {0}")]
    NonPositivePayment(Money),
    #[error("Payment of {attempted} exceeds outstanding {outstanding}")]
    Overpayment { outstanding: Money, attempted: Money },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_expense() -> (Expense, MemberId, MemberId) {
        let a = MemberId::new();
        let b = MemberId::new();
        let expense = Expense::new(
            GroupId::new(),
            a,
            Money::from_cents(1000),
            "Dinner",
            SplitMethod::Equal,
            vec![
                Split::new(a, Money::from_cents(500)),
                Split::new(b, Money::from_cents(500)),
            ],
        );
        (expense, a, b)
    }

    #[test]
    fn test_split_method_parse() {
        assert_eq!("Equal".parse::<SplitMethod>().unwrap(), SplitMethod::Equal);
        assert_eq!("pct".parse::<SplitMethod>().unwrap(), SplitMethod::Percentage);
        assert_eq!("exact".parse::<SplitMethod>().unwrap(), SplitMethod::Fixed);
        assert!("shares".parse::<SplitMethod>().is_err());
    }

    #[test]
    fn test_partial_then_full_payment() {
        let (mut expense, _a, b) = test_expense();
        let split = expense.split_for_mut(b).unwrap();

        split.record_payment(Money::from_cents(200)).unwrap();
        assert_eq!(split.outstanding(), Money::from_cents(300));
        assert_eq!(split.repaid(), Money::from_cents(200));
        assert!(!split.is_paid);

        split.record_payment(Money::from_cents(300)).unwrap();
        assert!(split.is_paid);
        assert_eq!(split.outstanding(), Money::zero());
    }

    #[test]
    fn test_overpayment_rejected() {
        let (mut expense, _a, b) = test_expense();
        let split = expense.split_for_mut(b).unwrap();

        assert!(matches!(
            split.record_payment(Money::from_cents(501)),
            Err(ExpenseValidationError::Overpayment { .. })
        ));
        assert!(split.record_payment(Money::zero()).is_err());
        assert_eq!(split.paid, Money::zero());
    }

    #[test]
    fn test_paid_flag_zeroes_outstanding() {
        let (mut expense, _a, b) = test_expense();
        let split = expense.split_for_mut(b).unwrap();
        split.mark_paid();
        assert_eq!(split.outstanding(), Money::zero());
        assert_eq!(expense.outstanding_total(), Money::from_cents(500));
    }

    #[test]
    fn test_validate() {
        let (mut expense, _a, b) = test_expense();
        assert!(expense.validate().is_ok());

        expense.split_for_mut(b).unwrap().amount = Money::from_cents(400);
        assert!(matches!(
            expense.validate(),
            Err(ExpenseValidationError::SplitsMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_overflowing_splits() {
        let a = MemberId::new();
        let b = MemberId::new();
        let expense = Expense::new(
            GroupId::new(),
            a,
            Money::from_cents(1),
            "overflow",
            SplitMethod::Fixed,
            vec![
                Split::new(a, Money::from_cents(i64::MAX)),
                Split::new(b, Money::from_cents(i64::MAX)),
            ],
        );

        assert_eq!(expense.checked_splits_total(), None);
        assert_eq!(expense.validate(), Err(ExpenseValidationError::Overflow));
    }

    #[test]
    fn test_settlement_shape() {
        let from = MemberId::new();
        let to = MemberId::new();
        let expense = Expense::settlement(GroupId::new(), from, to, Money::from_cents(3000));

        assert!(expense.is_settlement());
        assert_eq!(expense.payer, from);
        assert_eq!(expense.splits.len(), 1);
        assert_eq!(expense.splits[0].member_id, to);
        assert!(expense.validate().is_ok());
    }

    #[test]
    fn test_serialization_defaults() {
        let (expense, _, _) = test_expense();
        let json = serde_json::to_string(&expense).unwrap();
        assert!(json.contains("\"kind\":\"expense\""));
        let back: Expense = serde_json::from_str(&json).unwrap();
        assert_eq!(back.splits, expense.splits);
    }
}
