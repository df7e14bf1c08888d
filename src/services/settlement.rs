//! Settlement service
//!
//! Read side of the engine: balances and suggested transfers for a group,
//! computed from an owned copy of the group and its expenses. Also records actual repayments
//! between members as settlement expenses.

use chrono::Utc;

use crate::audit::EntityType;
use crate::engine::{compute_balances, normalize, NetBalances, SettlementPlanner, SettlementTransfer, SplitShares};
use crate::error::{TallyError, TallyResult};
use crate::models::{Expense, Group, GroupId, Money};
use crate::storage::Storage;

/// Owned copies of a group and its expenses.
///
/// The group and the expense list are read one after the other, each under
/// its own repository lock, so a write landing between the two reads can
/// show up in one but not the other.
#[derive(Debug, Clone)]
pub struct GroupSnapshot {
    pub group: Group,
    pub expenses: Vec<Expense>,
}

/// Balances and the transfers that settle them
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    pub group: Group,
    pub balances: NetBalances,
    pub transfers: Vec<SettlementTransfer>,
}

/// Service for balances and settlements
pub struct SettlementService<'a> {
    storage: &'a Storage,
}

impl<'a> SettlementService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Read the group, then clone its expenses under one read lock of the
    /// expense index
    pub fn snapshot(&self, group_id: GroupId) -> TallyResult<GroupSnapshot> {
        let group = self
            .storage
            .groups
            .get(group_id)?
            .ok_or_else(|| TallyError::group_not_found(group_id.to_string()))?;
        let expenses = self.storage.expenses.get_by_group(group_id)?;
        Ok(GroupSnapshot { group, expenses })
    }

    /// Net balance of every member who ever belonged to the group
    pub fn balances(&self, group_id: GroupId) -> TallyResult<NetBalances> {
        let snapshot = self.snapshot(group_id)?;
        Ok(compute_balances(&snapshot.group.member_ids(), &snapshot.expenses)?)
    }

    /// Suggested transfers that bring every balance to zero
    pub fn plan(&self, group_id: GroupId, planner: SettlementPlanner) -> TallyResult<SettlementPlan> {
        let snapshot = self.snapshot(group_id)?;
        let balances = compute_balances(&snapshot.group.member_ids(), &snapshot.expenses)?;
        let transfers = planner.plan(&balances)?;

        Ok(SettlementPlan {
            group: snapshot.group,
            balances,
            transfers,
        })
    }

    /// Record that `from` paid `to` directly.
    ///
    /// Stored as an expense of kind settlement paid by `from` and owed
    /// entirely by `to`, so balances stay a plain fold over expenses.
    pub fn record(
        &self,
        group_id: GroupId,
        from_identifier: &str,
        to_identifier: &str,
        amount: Money,
    ) -> TallyResult<Expense> {
        let group = self.snapshot(group_id)?.group;
        let from = group
            .find_member(from_identifier)
            .ok_or_else(|| TallyError::member_not_found(from_identifier))?;
        let to = group
            .find_member(to_identifier)
            .ok_or_else(|| TallyError::member_not_found(to_identifier))?;

        if from.id == to.id {
            return Err(TallyError::Validation(
                "A settlement needs two different members".into(),
            ));
        }

        let now = Utc::now();
        let roster = group.roster_at(now);
        for member in [from, to] {
            if !roster.contains(&member.id) {
                return Err(TallyError::Validation(format!(
                    "{} is not an active member of '{}'",
                    member.name, group.name
                )));
            }
        }

        // Same checks as any other expense: positive amount, known member
        normalize(amount, &roster, &SplitShares::Fixed(vec![(to.id, amount)]))?;

        let mut expense = Expense::settlement(group.id, from.id, to.id, amount);
        expense.description = format!("{} paid {}", from.name, to.name);
        expense.created_at = now;
        expense.updated_at = now;

        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;

        self.storage.log_create(
            EntityType::Settlement,
            expense.id.to_string(),
            Some(expense.description.clone()),
            group.id.to_string(),
            &expense,
        )?;

        tracing::info!(
            group = %group.id,
            from = %from.id,
            to = %to.id,
            amount = amount.cents(),
            "recorded settlement"
        );
        Ok(expense)
    }
}
