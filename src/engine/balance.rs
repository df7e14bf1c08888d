//! Balance aggregation
//!
//! Folds a group's expenses into one signed net balance per member.
//! Positive means the group owes the member, negative means the member owes
//! the group. Balances of a consistent group always sum to zero.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{Expense, MemberId, Money};

use super::error::{inconsistency, EngineError};
use super::settlement::SettlementTransfer;

/// Net balance per member, ordered by member id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NetBalances(BTreeMap<MemberId, Money>);

impl NetBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance for a member, zero if the member has none
    pub fn get(&self, member: MemberId) -> Money {
        self.0.get(&member).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MemberId, Money)> + '_ {
        self.0.iter().map(|(m, b)| (*m, *b))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all balances; zero for any consistent group
    pub fn total(&self) -> Money {
        self.0.values().sum()
    }

    /// Whether every balance is zero
    pub fn is_settled(&self) -> bool {
        self.0.values().all(|b| b.is_zero())
    }

    /// Members with a non-zero balance
    pub fn nonzero(&self) -> impl Iterator<Item = (MemberId, Money)> + '_ {
        self.iter().filter(|(_, b)| !b.is_zero())
    }

    /// Apply a transfer as if it had been paid: the debtor's balance rises
    /// and the creditor's falls by the same amount
    pub fn apply(&mut self, transfer: &SettlementTransfer) {
        *self.0.entry(transfer.from).or_default() += transfer.amount;
        *self.0.entry(transfer.to).or_default() -= transfer.amount;
    }
}

impl FromIterator<(MemberId, Money)> for NetBalances {
    fn from_iter<T: IntoIterator<Item = (MemberId, Money)>>(iter: T) -> Self {
        let mut balances = BTreeMap::new();
        for (member, amount) in iter {
            *balances.entry(member).or_insert_with(Money::zero) += amount;
        }
        Self(balances)
    }
}

/// Compute net balances for `members` from `expenses`.
///
/// Every expense credits its payer with the outstanding part of the expense
/// and debits each split holder by what they still owe. Repaid parts of a
/// split cancel out on both sides.
///
/// Every member gets an entry, including those with a zero balance. The
/// result does not depend on the order the expenses are given in.
pub fn compute_balances<'a, I>(members: &[MemberId], expenses: I) -> Result<NetBalances, EngineError>
where
    I: IntoIterator<Item = &'a Expense>,
{
    let mut balances: BTreeMap<MemberId, i64> = members.iter().map(|m| (*m, 0)).collect();
    let mut count = 0usize;

    for expense in expenses {
        check_expense(expense)?;

        let outstanding = expense.outstanding_total();
        credit(&mut balances, expense, expense.payer, outstanding.cents())?;
        for split in &expense.splits {
            let owed = split.outstanding().cents();
            credit(&mut balances, expense, split.member_id, -owed)?;
        }
        count += 1;
    }

    let mut total: i64 = 0;
    for balance in balances.values() {
        total = total
            .checked_add(*balance)
            .ok_or_else(|| inconsistency("balance total overflows".to_string()))?;
    }
    if total != 0 {
        return Err(inconsistency(format!(
            "balances sum to {} instead of zero",
            Money::from_cents(total)
        )));
    }

    tracing::debug!(members = balances.len(), expenses = count, "computed balances");
    Ok(NetBalances(
        balances
            .into_iter()
            .map(|(m, b)| (m, Money::from_cents(b)))
            .collect(),
    ))
}

fn check_expense(expense: &Expense) -> Result<(), EngineError> {
    expense
        .validate()
        .map_err(|e| inconsistency(format!("expense {}: {}", expense.id, e)))
}

fn credit(
    balances: &mut BTreeMap<MemberId, i64>,
    expense: &Expense,
    member: MemberId,
    delta: i64,
) -> Result<(), EngineError> {
    let balance = balances.get_mut(&member).ok_or_else(|| {
        inconsistency(format!(
            "expense {} references member {} outside the group",
            expense.id, member
        ))
    })?;
    *balance = balance
        .checked_add(delta)
        .ok_or_else(|| inconsistency(format!("balance overflow for member {}", member)))?;
    Ok(())
}
