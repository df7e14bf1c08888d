//! Expense service
//!
//! Records expenses through the split validator, lists and deletes them, and
//! records repayments against individual splits.

use chrono::Utc;

use crate::audit::EntityType;
use crate::engine::{normalize, SplitShares};
use crate::error::{TallyError, TallyResult};
use crate::models::{Expense, ExpenseId, Group, GroupId, MemberId, Money};
use crate::storage::Storage;

/// Service for expense management
pub struct ExpenseService<'a> {
    storage: &'a Storage,
}

/// Input for recording a new expense
#[derive(Debug, Clone)]
pub struct AddExpenseInput {
    pub group_id: GroupId,
    pub payer: MemberId,
    pub amount: Money,
    pub description: String,
    pub shares: SplitShares,
}

impl<'a> ExpenseService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a new expense.
    ///
    /// Splits are computed against the members active right now; the payer
    /// must be one of them.
    pub fn add(&self, input: AddExpenseInput) -> TallyResult<Expense> {
        let group = self.group(input.group_id)?;

        let now = Utc::now();
        let roster = group.roster_at(now);
        if !roster.contains(&input.payer) {
            return Err(TallyError::Validation(format!(
                "Payer {} is not an active member of '{}'",
                group.member_name(input.payer),
                group.name
            )));
        }

        let splits = normalize(input.amount, &roster, &input.shares)?;

        let mut expense = Expense::new(
            group.id,
            input.payer,
            input.amount,
            input.description.trim(),
            input.shares.method(),
            splits,
        );
        expense.created_at = now;
        expense.updated_at = now;

        expense
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;

        self.storage.log_create(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense.description.clone()),
            group.id.to_string(),
            &expense,
        )?;

        tracing::info!(
            group = %group.id,
            expense = %expense.id,
            amount = expense.amount.cents(),
            method = %expense.method,
            "recorded expense"
        );
        Ok(expense)
    }

    pub fn get(&self, id: ExpenseId) -> TallyResult<Option<Expense>> {
        self.storage.expenses.get(id)
    }

    /// Find an expense by full or short ID
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Expense>> {
        self.storage.expenses.find(identifier)
    }

    /// Find an expense or fail with "not found"
    pub fn require(&self, identifier: &str) -> TallyResult<Expense> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::expense_not_found(identifier))
    }

    /// Expenses of a group, newest first
    pub fn list(&self, group_id: GroupId, limit: Option<usize>) -> TallyResult<Vec<Expense>> {
        let mut expenses = self.storage.expenses.get_by_group(group_id)?;
        expenses.reverse();
        if let Some(limit) = limit {
            expenses.truncate(limit);
        }
        Ok(expenses)
    }

    /// Delete an expense.
    ///
    /// An expense with recorded repayments is only deleted with `force`.
    pub fn delete(&self, identifier: &str, force: bool) -> TallyResult<Expense> {
        let expense = self.require(identifier)?;

        let repaid: Money = expense.splits.iter().map(|s| s.repaid()).sum();
        if repaid.is_positive() && !force {
            return Err(TallyError::Validation(format!(
                "Expense {} has {} in recorded repayments. Use --force to delete it anyway.",
                expense.id, repaid
            )));
        }

        self.storage.expenses.delete(expense.id)?;
        self.storage.expenses.save()?;

        let entity_type = if expense.is_settlement() {
            EntityType::Settlement
        } else {
            EntityType::Expense
        };
        self.storage.log_delete(
            entity_type,
            expense.id.to_string(),
            Some(expense.description.clone()),
            expense.group_id.to_string(),
            &expense,
        )?;

        tracing::info!(expense = %expense.id, "deleted expense");
        Ok(expense)
    }

    /// Record that `member` repaid part of their split.
    ///
    /// Without an amount the whole outstanding share is paid.
    pub fn pay(
        &self,
        expense_identifier: &str,
        member_identifier: &str,
        amount: Option<Money>,
    ) -> TallyResult<Expense> {
        let mut expense = self.require(expense_identifier)?;
        if expense.is_settlement() {
            return Err(TallyError::Validation(
                "Settlements are already payments; record a new settlement instead".into(),
            ));
        }

        let group = self.group(expense.group_id)?;
        let member = group
            .find_member(member_identifier)
            .ok_or_else(|| TallyError::member_not_found(member_identifier))?;
        if member.id == expense.payer {
            return Err(TallyError::Validation(format!(
                "{} paid this expense; their own share needs no repayment",
                member.name
            )));
        }

        let before = expense.clone();
        let split = expense.split_for_mut(member.id).ok_or_else(|| {
            TallyError::Validation(format!("{} has no share in this expense", member.name))
        })?;

        match amount {
            Some(amount) => split
                .record_payment(amount)
                .map_err(|e| TallyError::Validation(e.to_string()))?,
            None if split.outstanding().is_zero() => {
                return Err(TallyError::Validation(format!(
                    "{} has already repaid this share",
                    member.name
                )))
            }
            None => split.mark_paid(),
        }
        expense.touch();

        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;

        self.storage.log_update(
            EntityType::Expense,
            expense.id.to_string(),
            Some(expense.description.clone()),
            group.id.to_string(),
            &before,
            &expense,
        )?;

        tracing::info!(expense = %expense.id, member = %member.id, "recorded repayment");
        Ok(expense)
    }

    fn group(&self, id: GroupId) -> TallyResult<Group> {
        self.storage
            .groups
            .get(id)?
            .ok_or_else(|| TallyError::group_not_found(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::engine::{EngineError, InvalidSplitReason};
    use crate::models::{Percentage, SplitMethod};
    use crate::services::group::GroupService;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn setup_group(storage: &Storage) -> (Group, Vec<MemberId>) {
        let groups = GroupService::new(storage);
        groups.create("Flat", "EUR", SplitMethod::Equal).unwrap();
        for name in ["Ann", "Bob", "Cat"] {
            groups.add_member("Flat", name).unwrap();
        }
        let group = groups.require("Flat").unwrap();
        let ids = group.member_ids();
        (group, ids)
    }

    fn input(group: &Group, payer: MemberId, cents: i64, shares: SplitShares) -> AddExpenseInput {
        AddExpenseInput {
            group_id: group.id,
            payer,
            amount: Money::from_cents(cents),
            description: "Groceries".into(),
            shares,
        }
    }

    #[test]
    fn test_add_equal_expense() {
        let (_temp_dir, storage) = create_test_storage();
        let (group, m) = setup_group(&storage);
        let service = ExpenseService::new(&storage);

        let expense = service
            .add(input(&group, m[0], 100, SplitShares::equal_all()))
            .unwrap();

        let amounts: Vec<_> = expense.splits.iter().map(|s| s.amount.cents()).collect();
        assert_eq!(amounts, vec![34, 33, 33]);
        assert_eq!(expense.method, SplitMethod::Equal);
        assert_eq!(service.list(group.id, None).unwrap().len(), 1);
    }

    #[test]
    fn test_add_percentage_expense() {
        let (_temp_dir, storage) = create_test_storage();
        let (group, m) = setup_group(&storage);
        let service = ExpenseService::new(&storage);

        let shares = SplitShares::Percentage(vec![
            (m[0], Percentage::from_basis_points(5000)),
            (m[1], Percentage::from_basis_points(2500)),
            (m[2], Percentage::from_basis_points(2500)),
        ]);
        let expense = service.add(input(&group, m[1], 999, shares)).unwrap();
        assert_eq!(expense.splits_total(), Money::from_cents(999));
    }

    #[test]
    fn test_invalid_split_is_not_stored() {
        let (_temp_dir, storage) = create_test_storage();
        let (group, m) = setup_group(&storage);
        let service = ExpenseService::new(&storage);

        let shares = SplitShares::Fixed(vec![(m[0], Money::from_cents(40)), (m[1], Money::from_cents(50))]);
        let err = service.add(input(&group, m[0], 100, shares)).unwrap_err();

        assert!(matches!(
            err,
            TallyError::Engine(EngineError::InvalidSplit(InvalidSplitReason::AmountMismatch { .. }))
        ));
        assert!(service.list(group.id, None).unwrap().is_empty());
    }

    #[test]
    fn test_departed_member_cannot_pay_or_share() {
        let (_temp_dir, storage) = create_test_storage();
        let (group, m) = setup_group(&storage);
        GroupService::new(&storage).remove_member("Flat", "Cat", false).unwrap();
        let service = ExpenseService::new(&storage);

        assert!(service
            .add(input(&group, m[2], 100, SplitShares::equal_all()))
            .unwrap_err()
            .is_validation());

        let err = service
            .add(input(&group, m[0], 100, SplitShares::Equal(vec![m[0], m[2]])))
            .unwrap_err();
        assert!(matches!(
            err,
            TallyError::Engine(EngineError::InvalidSplit(InvalidSplitReason::UnknownMember(_)))
        ));

        let expense = service
            .add(input(&group, m[0], 100, SplitShares::equal_all()))
            .unwrap();
        assert_eq!(expense.splits.len(), 2);
    }

    #[test]
    fn test_partial_and_full_payment() {
        let (_temp_dir, storage) = create_test_storage();
        let (group, m) = setup_group(&storage);
        let service = ExpenseService::new(&storage);
        let expense = service
            .add(input(&group, m[0], 300, SplitShares::equal_all()))
            .unwrap();
        let id = expense.id.to_string();

        let paid = service.pay(&id, "Bob", Some(Money::from_cents(40))).unwrap();
        assert_eq!(paid.split_for(m[1]).unwrap().outstanding(), Money::from_cents(60));

        assert!(service
            .pay(&id, "Bob", Some(Money::from_cents(61)))
            .unwrap_err()
            .is_validation());

        let paid = service.pay(&id, "Bob", None).unwrap();
        assert!(paid.split_for(m[1]).unwrap().is_paid);
        assert!(service.pay(&id, "Bob", None).unwrap_err().is_validation());
        assert!(service.pay(&id, "Ann", None).unwrap_err().is_validation());
    }

    #[test]
    fn test_delete_with_payments_needs_force() {
        let (_temp_dir, storage) = create_test_storage();
        let (group, m) = setup_group(&storage);
        let service = ExpenseService::new(&storage);
        let expense = service
            .add(input(&group, m[0], 300, SplitShares::equal_all()))
            .unwrap();
        let id = expense.id.to_string();

        service.pay(&id, "Cat", None).unwrap();
        assert!(service.delete(&id, false).unwrap_err().is_validation());
        service.delete(&id, true).unwrap();
        assert!(service.find(&id).unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first_with_limit() {
        let (_temp_dir, storage) = create_test_storage();
        let (group, m) = setup_group(&storage);
        let service = ExpenseService::new(&storage);

        for cents in [100, 200, 300] {
            service
                .add(input(&group, m[0], cents, SplitShares::equal_all()))
                .unwrap();
        }

        let listed = service.list(group.id, Some(2)).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);
    }
}
