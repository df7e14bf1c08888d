//! CSV Export functionality
//!
//! Exports expenses to CSV with one row per split, so spreadsheets can pivot
//! on member or expense.

use std::collections::HashMap;
use std::io::Write;

use serde::Serialize;

use crate::error::{TallyError, TallyResult};
use crate::models::{Group, GroupId};
use crate::storage::Storage;

#[derive(Serialize)]
struct SplitRecord<'a> {
    #[serde(rename = "Expense ID")]
    expense_id: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Group")]
    group: &'a str,
    #[serde(rename = "Currency")]
    currency: &'a str,
    #[serde(rename = "Kind")]
    kind: String,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Payer")]
    payer: String,
    #[serde(rename = "Total")]
    total: String,
    #[serde(rename = "Method")]
    method: String,
    #[serde(rename = "Member")]
    member: String,
    #[serde(rename = "Share")]
    share: String,
    #[serde(rename = "Percentage")]
    percentage: String,
    #[serde(rename = "Repaid")]
    repaid: String,
    #[serde(rename = "Outstanding")]
    outstanding: String,
}

/// Export expenses to CSV, optionally restricted to one group
pub fn export_expenses_csv<W: Write>(
    storage: &Storage,
    group: Option<GroupId>,
    writer: W,
) -> TallyResult<()> {
    let groups: HashMap<GroupId, Group> = storage
        .groups
        .get_all()?
        .into_iter()
        .filter(|g| group.map_or(true, |id| g.id == id))
        .map(|g| (g.id, g))
        .collect();

    let expenses = match group {
        Some(id) => {
            if !groups.contains_key(&id) {
                return Err(TallyError::group_not_found(id.to_string()));
            }
            storage.expenses.get_by_group(id)?
        }
        None => storage.expenses.get_all()?,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);

    for expense in &expenses {
        let Some(group) = groups.get(&expense.group_id) else {
            tracing::warn!(expense = %expense.id, "skipping expense of unknown group");
            continue;
        };

        for split in &expense.splits {
            let record = SplitRecord {
                expense_id: expense.id.to_string(),
                date: expense.created_at.to_rfc3339(),
                group: &group.name,
                currency: &group.currency,
                kind: expense.kind.to_string(),
                description: &expense.description,
                payer: group.member_name(expense.payer),
                total: expense.amount.to_string(),
                method: expense.method.to_string(),
                member: group.member_name(split.member_id),
                share: split.amount.to_string(),
                percentage: split.percentage.map(|p| p.to_string()).unwrap_or_default(),
                repaid: split.repaid().to_string(),
                outstanding: split.outstanding().to_string(),
            };
            csv_writer
                .serialize(record)
                .map_err(|e| TallyError::Export(e.to_string()))?;
        }
    }

    csv_writer
        .flush()
        .map_err(|e| TallyError::Export(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::engine::SplitShares;
    use crate::models::{Money, SplitMethod};
    use crate::services::{AddExpenseInput, ExpenseService, GroupService};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let mut storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_export_expenses_csv() {
        let (_temp_dir, storage) = create_test_storage();
        let groups = GroupService::new(&storage);
        let group = groups.create("Trip", "EUR", SplitMethod::Equal).unwrap();
        groups.add_member("Trip", "Ann").unwrap();
        let (group_after, _) = groups.add_member("Trip", "Bob").unwrap();

        ExpenseService::new(&storage)
            .add(AddExpenseInput {
                group_id: group.id,
                payer: group_after.member_ids()[0],
                amount: Money::from_cents(1001),
                description: "Taxi, airport".into(),
                shares: SplitShares::equal_all(),
            })
            .unwrap();

        let mut output = Vec::new();
        export_expenses_csv(&storage, Some(group.id), &mut output).unwrap();
        let csv_string = String::from_utf8(output).unwrap();

        let lines: Vec<&str> = csv_string.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Expense ID,Date,Group"));
        assert!(csv_string.contains("\"Taxi, airport\""));
        assert!(csv_string.contains("5.01"));
        assert!(csv_string.contains("5.00"));
    }

    #[test]
    fn test_export_unknown_group() {
        let (_temp_dir, storage) = create_test_storage();
        let mut output = Vec::new();
        let err = export_expenses_csv(&storage, Some(GroupId::new()), &mut output).unwrap_err();
        assert!(err.is_not_found());
    }
}
