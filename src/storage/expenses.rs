//! Expense repository for JSON storage
//!
//! Manages loading and saving expenses to expenses.json, with an index from
//! group to expense IDs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Expense, ExpenseId, GroupId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ExpenseData {
    expenses: Vec<Expense>,
}

/// Expense map plus its group index, guarded by one lock so readers always
/// see both in step
#[derive(Default)]
struct ExpenseIndex {
    data: HashMap<ExpenseId, Expense>,
    by_group: HashMap<GroupId, Vec<ExpenseId>>,
}

impl ExpenseIndex {
    fn insert(&mut self, expense: Expense) {
        if let Some(old) = self.data.get(&expense.id) {
            if old.group_id != expense.group_id {
                let (old_group, id) = (old.group_id, old.id);
                self.unindex(old_group, id);
            }
        }
        let ids = self.by_group.entry(expense.group_id).or_default();
        if !ids.contains(&expense.id) {
            ids.push(expense.id);
        }
        self.data.insert(expense.id, expense);
    }

    fn unindex(&mut self, group_id: GroupId, id: ExpenseId) {
        if let Some(ids) = self.by_group.get_mut(&group_id) {
            ids.retain(|&eid| eid != id);
            if ids.is_empty() {
                self.by_group.remove(&group_id);
            }
        }
    }

    fn for_group(&self, group_id: GroupId) -> Vec<Expense> {
        let ids = self.by_group.get(&group_id).map(|v| v.as_slice()).unwrap_or(&[]);
        let mut expenses: Vec<_> = ids.iter().filter_map(|id| self.data.get(id).cloned()).collect();
        sort_chronologically(&mut expenses);
        expenses
    }
}

fn sort_chronologically(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
}

/// Repository for expense persistence with a by-group index
pub struct ExpenseRepository {
    path: PathBuf,
    index: RwLock<ExpenseIndex>,
}

impl ExpenseRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            index: RwLock::new(ExpenseIndex::default()),
        }
    }

    /// Load expenses from disk and rebuild the index
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: ExpenseData = read_json(&self.path)?;

        let mut index = self
            .index
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *index = ExpenseIndex::default();
        for expense in file_data.expenses {
            index.insert(expense);
        }

        Ok(())
    }

    /// Save expenses to disk in chronological order
    pub fn save(&self) -> Result<(), TallyError> {
        let file_data = ExpenseData {
            expenses: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: ExpenseId) -> Result<Option<Expense>, TallyError> {
        let index = self
            .index
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(index.data.get(&id).cloned())
    }

    /// Lookup by full ID or short ID prefix
    pub fn find(&self, identifier: &str) -> Result<Option<Expense>, TallyError> {
        if let Ok(id) = identifier.parse::<ExpenseId>() {
            return self.get(id);
        }

        let index = self
            .index
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        let mut matches = index.data.values().filter(|e| e.id.matches_short(identifier));
        match (matches.next(), matches.next()) {
            (Some(expense), None) => Ok(Some(expense.clone())),
            (Some(_), Some(_)) => Err(TallyError::Validation(format!(
                "Expense ID prefix '{}' is ambiguous",
                identifier
            ))),
            _ => Ok(None),
        }
    }

    /// All expenses, oldest first
    pub fn get_all(&self) -> Result<Vec<Expense>, TallyError> {
        let index = self
            .index
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut expenses: Vec<_> = index.data.values().cloned().collect();
        sort_chronologically(&mut expenses);
        Ok(expenses)
    }

    /// Expenses of one group, oldest first.
    ///
    /// Taken under a single read lock, so the result is a consistent
    /// snapshot even while other threads write.
    pub fn get_by_group(&self, group_id: GroupId) -> Result<Vec<Expense>, TallyError> {
        let index = self
            .index
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(index.for_group(group_id))
    }

    pub fn count_by_group(&self, group_id: GroupId) -> Result<usize, TallyError> {
        let index = self
            .index
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(index.by_group.get(&group_id).map_or(0, Vec::len))
    }

    /// Insert or update an expense
    pub fn upsert(&self, expense: Expense) -> Result<(), TallyError> {
        let mut index = self
            .index
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        index.insert(expense);
        Ok(())
    }

    /// Remove an expense, returning it if it existed
    pub fn delete(&self, id: ExpenseId) -> Result<Option<Expense>, TallyError> {
        let mut index = self
            .index
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let removed = index.data.remove(&id);
        if let Some(expense) = &removed {
            index.unindex(expense.group_id, id);
        }
        Ok(removed)
    }

    /// Remove every expense of a group, returning the removed expenses
    pub fn delete_by_group(&self, group_id: GroupId) -> Result<Vec<Expense>, TallyError> {
        let mut index = self
            .index
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let ids = index.by_group.remove(&group_id).unwrap_or_default();
        let mut removed: Vec<_> = ids.iter().filter_map(|id| index.data.remove(id)).collect();
        sort_chronologically(&mut removed);
        Ok(removed)
    }

    pub fn count(&self) -> Result<usize, TallyError> {
        let index = self
            .index
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(index.data.len())
    }
}
