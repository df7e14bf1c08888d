//! Split validation and normalization
//!
//! Turns a raw split request (method plus per-member shares) into concrete
//! [`Split`] records whose amounts add up to the expense amount exactly.
//!
//! Leftover minor units are handed out one at a time in group membership
//! order, so the same request always yields the same splits.

use std::collections::{HashMap, HashSet};

use crate::models::{MemberId, Money, Percentage, Split, SplitMethod};

use super::error::{EngineError, InvalidSplitReason};

/// Tolerance on the percentage total, in basis points (0.01%)
pub const PERCENTAGE_EPSILON_BP: u32 = 1;

/// Raw shares for one expense, tagged by split method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitShares {
    /// Divide evenly among the listed members; an empty list means everyone
    /// on the roster
    Equal(Vec<MemberId>),
    /// Percentages per member, summing to 100.00%
    Percentage(Vec<(MemberId, Percentage)>),
    /// Absolute amounts per member, summing to the expense amount
    Fixed(Vec<(MemberId, Money)>),
}

impl SplitShares {
    /// Equal split among the whole roster
    pub fn equal_all() -> Self {
        Self::Equal(Vec::new())
    }

    pub fn method(&self) -> SplitMethod {
        match self {
            Self::Equal(_) => SplitMethod::Equal,
            Self::Percentage(_) => SplitMethod::Percentage,
            Self::Fixed(_) => SplitMethod::Fixed,
        }
    }
}

/// Validate `shares` against the roster and produce splits for `amount`.
///
/// `members` is the group roster at the time the expense is created, in
/// membership order. Splits come back in that order regardless of the order
/// the shares were given in.
pub fn normalize(
    amount: Money,
    members: &[MemberId],
    shares: &SplitShares,
) -> Result<Vec<Split>, EngineError> {
    if !amount.is_positive() {
        return Err(InvalidSplitReason::NonPositiveAmount(amount).into());
    }

    let splits = match shares {
        SplitShares::Equal(listed) => {
            let listed: Vec<(MemberId, ())> = if listed.is_empty() {
                members.iter().map(|m| (*m, ())).collect()
            } else {
                listed.iter().map(|m| (*m, ())).collect()
            };
            let participants = order_by_roster(members, &listed)?;
            split_equal(amount, &participants)?
        }
        SplitShares::Percentage(listed) => {
            let participants = order_by_roster(members, listed)?;
            split_percentage(amount, &participants)?
        }
        SplitShares::Fixed(listed) => {
            let participants = order_by_roster(members, listed)?;
            split_fixed(amount, &participants)?
        }
    };

    tracing::debug!(
        method = %shares.method(),
        amount = amount.cents(),
        participants = splits.len(),
        "normalized split"
    );
    Ok(splits)
}

/// Check membership and uniqueness, then sort entries into roster order
fn order_by_roster<T: Copy>(
    members: &[MemberId],
    listed: &[(MemberId, T)],
) -> Result<Vec<(MemberId, T)>, EngineError> {
    let position: HashMap<MemberId, usize> = members
        .iter()
        .enumerate()
        .map(|(i, m)| (*m, i))
        .collect();

    let mut seen = HashSet::with_capacity(listed.len());
    let mut ordered = Vec::with_capacity(listed.len());
    for &(member, share) in listed {
        let index = *position
            .get(&member)
            .ok_or(InvalidSplitReason::UnknownMember(member))?;
        if !seen.insert(member) {
            return Err(InvalidSplitReason::DuplicateMember(member).into());
        }
        ordered.push((index, member, share));
    }

    if ordered.is_empty() {
        return Err(InvalidSplitReason::NoParticipants.into());
    }

    ordered.sort_by_key(|(index, _, _)| *index);
    Ok(ordered.into_iter().map(|(_, m, s)| (m, s)).collect())
}

fn split_equal(amount: Money, participants: &[(MemberId, ())]) -> Result<Vec<Split>, EngineError> {
    let count = participants.len() as i64;
    let base = amount.cents() / count;
    let mut amounts = vec![base; participants.len()];
    let eligible = vec![true; participants.len()];

    absorb_drift(&mut amounts, &eligible, amount.cents() % count)?;

    Ok(participants
        .iter()
        .zip(amounts)
        .map(|((member, _), cents)| Split::new(*member, Money::from_cents(cents)))
        .collect())
}

fn split_percentage(
    amount: Money,
    participants: &[(MemberId, Percentage)],
) -> Result<Vec<Split>, EngineError> {
    let total_bp: u64 = participants
        .iter()
        .map(|(_, pct)| u64::from(pct.basis_points()))
        .sum();
    let full = u64::from(Percentage::FULL.basis_points());
    if total_bp.abs_diff(full) > u64::from(PERCENTAGE_EPSILON_BP) {
        let total = u32::try_from(total_bp).unwrap_or(u32::MAX);
        return Err(InvalidSplitReason::PercentageSum(Percentage::from_basis_points(total)).into());
    }

    let mut amounts = Vec::with_capacity(participants.len());
    for (_, pct) in participants {
        amounts.push(percent_of(amount, *pct)?);
    }
    let rounded_total: i64 = amounts.iter().sum();
    let eligible: Vec<bool> = participants
        .iter()
        .map(|(_, pct)| pct.basis_points() > 0)
        .collect();

    absorb_drift(&mut amounts, &eligible, amount.cents() - rounded_total)?;

    Ok(participants
        .iter()
        .zip(amounts)
        .map(|((member, pct), cents)| Split::with_percentage(*member, Money::from_cents(cents), *pct))
        .collect())
}

fn split_fixed(amount: Money, participants: &[(MemberId, Money)]) -> Result<Vec<Split>, EngineError> {
    let mut total = Money::zero();
    for (member, share) in participants {
        if share.is_negative() {
            return Err(InvalidSplitReason::NegativeShare(*member).into());
        }
        total = total
            .checked_add(*share)
            .ok_or(InvalidSplitReason::Overflow)?;
    }

    if total != amount {
        return Err(InvalidSplitReason::AmountMismatch {
            expense_amount: amount,
            shares_total: total,
        }
        .into());
    }

    Ok(participants
        .iter()
        .map(|(member, share)| Split::new(*member, *share))
        .collect())
}

/// `round_half_up(amount * pct / 100)` in minor units
fn percent_of(amount: Money, pct: Percentage) -> Result<i64, EngineError> {
    let full = i128::from(Percentage::FULL.basis_points());
    let scaled = i128::from(amount.cents()) * i128::from(pct.basis_points());
    let rounded = (scaled + full / 2) / full;
    i64::try_from(rounded).map_err(|_| InvalidSplitReason::Overflow.into())
}

/// Spread `drift` minor units over the eligible entries in order.
///
/// Positive drift adds to eligible entries; negative drift removes from
/// eligible entries that are still above zero. Whole rounds are applied in
/// bulk, the final partial round goes to the first entries.
fn absorb_drift(amounts: &mut [i64], eligible: &[bool], drift: i64) -> Result<(), EngineError> {
    let mut remaining = drift;

    while remaining != 0 {
        let targets: Vec<usize> = (0..amounts.len())
            .filter(|&i| eligible[i] && (remaining > 0 || amounts[i] > 0))
            .collect();
        if targets.is_empty() {
            return Err(InvalidSplitReason::UnabsorbableDrift(remaining).into());
        }

        let sign = remaining.signum();
        let count = targets.len() as i64;
        let mut rounds = remaining.abs() / count;
        if sign < 0 {
            let smallest = targets.iter().map(|&i| amounts[i]).min().unwrap_or(0);
            rounds = rounds.min(smallest);
        }

        if rounds > 0 {
            for &i in &targets {
                amounts[i] += sign * rounds;
            }
            remaining -= sign * rounds * count;
        } else {
            let partial = remaining.unsigned_abs() as usize;
            for &i in targets.iter().take(partial) {
                amounts[i] += sign;
            }
            remaining = 0;
        }
    }

    Ok(())
}
