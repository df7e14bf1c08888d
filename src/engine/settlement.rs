//! Settlement planning
//!
//! Turns net balances into a list of transfers that brings every member to
//! zero. The default planner is greedy: repeatedly match the largest
//! creditor with the largest debtor. It needs at most `n - 1` transfers for
//! `n` members with a non-zero balance.
//!
//! For small groups the planner can instead search for the partition of
//! members into the most zero-sum subsets, which gives the minimum number of
//! transfers, and run the greedy match inside each subset.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::models::{MemberId, Money};

use super::balance::NetBalances;
use super::error::{unsettleable, EngineError};

/// Upper bound for the exact search, which is exponential in member count
pub const MAX_EXACT_MEMBERS: usize = 20;

/// A payment of `amount` from debtor `from` to creditor `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTransfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

/// Settlement planner configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementPlanner {
    exact_search_limit: usize,
}

impl SettlementPlanner {
    /// Planner that always uses the greedy match
    pub fn greedy() -> Self {
        Self::default()
    }

    /// Planner that minimizes the number of transfers when at most `limit`
    /// members have a non-zero balance. The limit is capped at
    /// [`MAX_EXACT_MEMBERS`].
    pub fn with_exact_search_limit(limit: usize) -> Self {
        Self {
            exact_search_limit: limit.min(MAX_EXACT_MEMBERS),
        }
    }

    pub fn exact_search_limit(&self) -> usize {
        self.exact_search_limit
    }

    /// Whether `parties` non-zero balances go through the exact search
    pub fn uses_exact_search(&self, parties: usize) -> bool {
        parties > 1 && parties <= self.exact_search_limit
    }

    /// Plan transfers that settle `balances`
    pub fn plan(&self, balances: &NetBalances) -> Result<Vec<SettlementTransfer>, EngineError> {
        let total: i128 = balances.iter().map(|(_, b)| i128::from(b.cents())).sum();
        if total != 0 {
            return Err(unsettleable(format!(
                "balances sum to {} minor units instead of zero",
                total
            )));
        }

        let parties: Vec<(MemberId, Money)> = balances.nonzero().collect();
        let exact = self.uses_exact_search(parties.len());
        let transfers = if exact {
            exact_transfers(&parties)?
        } else {
            greedy_transfers(&parties)?
        };

        tracing::debug!(
            parties = parties.len(),
            transfers = transfers.len(),
            exact,
            "planned settlement"
        );
        Ok(transfers)
    }
}

/// Plan transfers with the greedy match
pub fn plan(balances: &NetBalances) -> Result<Vec<SettlementTransfer>, EngineError> {
    SettlementPlanner::greedy().plan(balances)
}

/// One side of the match. The heap pops the largest amount first and breaks
/// ties by the smaller member id.
#[derive(Debug, PartialEq, Eq)]
struct Party {
    amount: u64,
    member: MemberId,
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount
            .cmp(&other.amount)
            .then_with(|| other.member.cmp(&self.member))
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn greedy_transfers(parties: &[(MemberId, Money)]) -> Result<Vec<SettlementTransfer>, EngineError> {
    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    for &(member, balance) in parties {
        let party = Party {
            amount: balance.cents().unsigned_abs(),
            member,
        };
        match balance.cents().cmp(&0) {
            Ordering::Greater => creditors.push(party),
            Ordering::Less => debtors.push(party),
            Ordering::Equal => {}
        }
    }

    let mut transfers = Vec::with_capacity(parties.len().saturating_sub(1));
    while creditors.peek().is_some() && debtors.peek().is_some() {
        let (Some(mut creditor), Some(mut debtor)) = (creditors.pop(), debtors.pop()) else {
            break;
        };

        let amount = creditor.amount.min(debtor.amount);
        let cents = i64::try_from(amount)
            .map_err(|_| unsettleable(format!("transfer of {} minor units overflows", amount)))?;
        transfers.push(SettlementTransfer {
            from: debtor.member,
            to: creditor.member,
            amount: Money::from_cents(cents),
        });

        creditor.amount -= amount;
        debtor.amount -= amount;
        if creditor.amount > 0 {
            creditors.push(creditor);
        }
        if debtor.amount > 0 {
            debtors.push(debtor);
        }
    }

    if let Some(left) = creditors.peek().or_else(|| debtors.peek()) {
        return Err(unsettleable(format!(
            "member {} left with {} minor units after matching",
            left.member, left.amount
        )));
    }
    Ok(transfers)
}

/// Split `parties` into as many zero-sum subsets as possible, then settle
/// each subset greedily
fn exact_transfers(parties: &[(MemberId, Money)]) -> Result<Vec<SettlementTransfer>, EngineError> {
    let n = parties.len();
    let full = (1usize << n) - 1;

    // sums[mask]: subset total; best[mask]: most zero-sum prefixes over any
    // removal order of the subset
    let mut sums = vec![0i128; full + 1];
    let mut best = vec![0u8; full + 1];
    for mask in 1..=full {
        let low = mask.trailing_zeros() as usize;
        sums[mask] = sums[mask & (mask - 1)] + i128::from(parties[low].1.cents());

        let mut max = 0;
        let mut bits = mask;
        while bits != 0 {
            let bit = bits & bits.wrapping_neg();
            max = max.max(best[mask ^ bit]);
            bits ^= bit;
        }
        best[mask] = max + u8::from(sums[mask] == 0);
    }

    let mut subsets = Vec::with_capacity(usize::from(best[full]));
    let mut mask = full;
    let mut boundary = full;
    while mask != 0 {
        let target = best[mask] - u8::from(sums[mask] == 0);
        let mut bits = mask;
        let mut next = None;
        while bits != 0 {
            let bit = bits & bits.wrapping_neg();
            if best[mask ^ bit] == target {
                next = Some(mask ^ bit);
                break;
            }
            bits ^= bit;
        }
        mask = next.ok_or_else(|| unsettleable("zero-sum partition search failed".to_string()))?;

        if sums[mask] == 0 {
            subsets.push(boundary ^ mask);
            boundary = mask;
        }
    }

    let mut transfers = Vec::with_capacity(n - subsets.len());
    for subset in subsets {
        let members: Vec<(MemberId, Money)> = parties
            .iter()
            .enumerate()
            .filter(|(i, _)| subset & (1usize << *i) != 0)
            .map(|(_, party)| *party)
            .collect();
        transfers.extend(greedy_transfers(&members)?);
    }
    Ok(transfers)
}
