//! Group service
//!
//! Group lifecycle and membership. Members are never deleted: removing a
//! member stamps `left_at` so past expenses keep resolving.

use crate::audit::{AuditEntry, EntityType};
use crate::error::{TallyError, TallyResult};
use crate::models::{validate_currency_code, Group, GroupId, Member, SplitMethod};
use crate::storage::Storage;

use super::settlement::SettlementService;

/// Service for group management
pub struct GroupService<'a> {
    storage: &'a Storage,
}

impl<'a> GroupService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new, empty group
    pub fn create(&self, name: &str, currency: &str, default_split: SplitMethod) -> TallyResult<Group> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::Validation("Group name cannot be empty".into()));
        }

        if self.storage.groups.get_by_name(name)?.is_some() {
            return Err(TallyError::Duplicate {
                entity_type: "Group",
                identifier: name.to_string(),
            });
        }

        let currency =
            validate_currency_code(currency).map_err(|e| TallyError::Validation(e.to_string()))?;
        let group = Group::new(name, currency, default_split);

        self.storage.groups.upsert(group.clone())?;
        self.storage.groups.save()?;

        self.storage.log_create(
            EntityType::Group,
            group.id.to_string(),
            Some(group.name.clone()),
            group.id.to_string(),
            &group,
        )?;

        tracing::info!(group = %group.id, name = %group.name, "created group");
        Ok(group)
    }

    pub fn get(&self, id: GroupId) -> TallyResult<Option<Group>> {
        self.storage.groups.get(id)
    }

    /// Find a group by name or ID string
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Group>> {
        self.storage.groups.find(identifier)
    }

    /// Find a group or fail with "not found"
    pub fn require(&self, identifier: &str) -> TallyResult<Group> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::group_not_found(identifier))
    }

    pub fn list(&self) -> TallyResult<Vec<Group>> {
        self.storage.groups.get_all()
    }

    /// Add a member at the end of the membership order
    pub fn add_member(&self, group_identifier: &str, name: &str) -> TallyResult<(Group, Member)> {
        let mut group = self.require(group_identifier)?;
        let before = group.clone();

        let member = group.add_member(name).map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.groups.upsert(group.clone())?;
        self.storage.groups.save()?;

        self.storage.log_create(
            EntityType::Member,
            member.id.to_string(),
            Some(member.name.clone()),
            group.id.to_string(),
            &member,
        )?;
        self.storage.log_update(
            EntityType::Group,
            group.id.to_string(),
            Some(group.name.clone()),
            group.id.to_string(),
            &before,
            &group,
        )?;

        tracing::info!(group = %group.id, member = %member.id, "added member");
        Ok((group, member))
    }

    /// Mark a member as having left.
    ///
    /// A member with a non-zero balance can only leave with `force`; otherwise
    /// their debt could no longer be settled through new expenses.
    pub fn remove_member(
        &self,
        group_identifier: &str,
        member_identifier: &str,
        force: bool,
    ) -> TallyResult<Member> {
        let mut group = self.require(group_identifier)?;
        let member_id = group
            .find_member(member_identifier)
            .map(|m| m.id)
            .ok_or_else(|| TallyError::member_not_found(member_identifier))?;

        if !force {
            let balance = SettlementService::new(self.storage)
                .balances(group.id)?
                .get(member_id);
            if !balance.is_zero() {
                return Err(TallyError::Validation(format!(
                    "{} still has a balance of {}; settle up first or use --force",
                    group.member_name(member_id),
                    balance.format_with_code(&group.currency)
                )));
            }
        }

        let before = group.clone();
        let removed = group
            .remove_member(member_id)
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.groups.upsert(group.clone())?;
        self.storage.groups.save()?;

        self.storage.log_update(
            EntityType::Member,
            removed.id.to_string(),
            Some(removed.name.clone()),
            group.id.to_string(),
            &before.member(member_id),
            &group.member(member_id),
        )?;

        tracing::info!(group = %group.id, member = %removed.id, "member left group");
        Ok(removed)
    }

    /// Delete a group.
    ///
    /// Refuses while the group has expenses unless `force` is set, in which
    /// case the expenses are deleted too. Returns the number of expenses
    /// removed.
    pub fn delete(&self, identifier: &str, force: bool) -> TallyResult<(Group, usize)> {
        let group = self.require(identifier)?;

        let expense_count = self.storage.expenses.count_by_group(group.id)?;
        if expense_count > 0 && !force {
            return Err(TallyError::Validation(format!(
                "Group '{}' has {} expense(s). Use --force to delete it anyway.",
                group.name, expense_count
            )));
        }

        let removed = self.storage.expenses.delete_by_group(group.id)?;
        self.storage.groups.delete(group.id)?;
        self.storage.save_all()?;

        let group_tag = group.id.to_string();
        let mut entries: Vec<AuditEntry> = removed
            .iter()
            .map(|e| {
                AuditEntry::delete(EntityType::Expense, e.id.to_string(), Some(e.description.clone()), e)
                    .in_group(group_tag.clone())
            })
            .collect();
        entries.push(
            AuditEntry::delete(EntityType::Group, group_tag.clone(), Some(group.name.clone()), &group)
                .in_group(group_tag),
        );
        self.storage.log_deletes(entries)?;

        tracing::info!(group = %group.id, expenses = removed.len(), "deleted group");
        Ok((group, removed.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::engine::SplitShares;
    use crate::models::Money;
    use crate::services::expense::{AddExpenseInput, ExpenseService};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_group() {
        let (_temp_dir, storage) = create_test_storage();
        let service = GroupService::new(&storage);

        let group = service.create("Flatmates", "eur", SplitMethod::Equal).unwrap();
        assert_eq!(group.currency, "EUR");
        assert!(group.members.is_empty());
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_create_validation() {
        let (_temp_dir, storage) = create_test_storage();
        let service = GroupService::new(&storage);

        service.create("Flatmates", "EUR", SplitMethod::Equal).unwrap();
        assert!(matches!(
            service.create("flatmates", "EUR", SplitMethod::Equal),
            Err(TallyError::Duplicate { .. })
        ));
        assert!(service.create("  ", "EUR", SplitMethod::Equal).unwrap_err().is_validation());
        assert!(service.create("Trip", "EURO", SplitMethod::Equal).unwrap_err().is_validation());
    }

    #[test]
    fn test_members() {
        let (_temp_dir, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        service.create("Trip", "EUR", SplitMethod::Equal).unwrap();

        service.add_member("Trip", "Ann").unwrap();
        let (group, bob) = service.add_member("trip", "Bob").unwrap();
        assert_eq!(group.members.len(), 2);

        assert!(service.add_member("Trip", "ann").unwrap_err().is_validation());

        let removed = service.remove_member("Trip", "Bob", false).unwrap();
        assert_eq!(removed.id, bob.id);
        assert!(removed.left_at.is_some());

        let group = service.require("Trip").unwrap();
        assert_eq!(group.active_members().count(), 1);
        assert_eq!(group.members.len(), 2);
    }

    #[test]
    fn test_remove_member_with_balance_needs_force() {
        let (_temp_dir, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let group = service.create("Trip", "EUR", SplitMethod::Equal).unwrap();
        let (_, ann) = service.add_member("Trip", "Ann").unwrap();
        service.add_member("Trip", "Bob").unwrap();

        ExpenseService::new(&storage)
            .add(AddExpenseInput {
                group_id: group.id,
                payer: ann.id,
                amount: Money::from_cents(1000),
                description: "Fuel".into(),
                shares: SplitShares::equal_all(),
            })
            .unwrap();

        let err = service.remove_member("Trip", "Bob", false).unwrap_err();
        assert!(err.is_validation());
        assert!(service.remove_member("Trip", "Bob", true).is_ok());
    }

    #[test]
    fn test_unknown_member() {
        let (_temp_dir, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        service.create("Trip", "EUR", SplitMethod::Equal).unwrap();

        let err = service.remove_member("Trip", "Zed", false).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_requires_force_with_expenses() {
        let (_temp_dir, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let group = service.create("Trip", "EUR", SplitMethod::Equal).unwrap();
        let (_, ann) = service.add_member("Trip", "Ann").unwrap();

        ExpenseService::new(&storage)
            .add(AddExpenseInput {
                group_id: group.id,
                payer: ann.id,
                amount: Money::from_cents(500),
                description: "Snacks".into(),
                shares: SplitShares::equal_all(),
            })
            .unwrap();

        assert!(service.delete("Trip", false).unwrap_err().is_validation());

        let (_, removed) = service.delete("Trip", true).unwrap();
        assert_eq!(removed, 1);
        assert!(service.find("Trip").unwrap().is_none());
        assert_eq!(storage.expenses.count().unwrap(), 0);
    }

    #[test]
    fn test_mutations_are_audited() {
        let (_temp_dir, storage) = create_test_storage();
        let service = GroupService::new(&storage);
        let group = service.create("Trip", "EUR", SplitMethod::Equal).unwrap();
        service.add_member("Trip", "Ann").unwrap();

        let entries = storage
            .audit()
            .read_recent(10, Some(&group.id.to_string()))
            .unwrap();
        let kinds: Vec<_> = entries.iter().map(|e| e.entity_type).collect();
        assert_eq!(
            kinds,
            vec![EntityType::Group, EntityType::Member, EntityType::Group]
        );
    }
}
