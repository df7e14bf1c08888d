//! JSON Export functionality
//!
//! Exports groups and expenses to JSON format with schema versioning.

use std::collections::HashMap;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TallyError, TallyResult};
use crate::models::{Expense, Group, GroupId};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full database export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub groups: Vec<Group>,

    pub expenses: Vec<Expense>,

    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub group_count: usize,
    pub member_count: usize,
    pub expense_count: usize,
    pub settlement_count: usize,

    /// Timestamp of the earliest expense
    pub earliest_expense: Option<String>,

    /// Timestamp of the latest expense
    pub latest_expense: Option<String>,
}

impl FullExport {
    /// Build an export from storage, optionally restricted to one group
    pub fn from_storage(storage: &Storage, group: Option<GroupId>) -> TallyResult<Self> {
        let (groups, expenses) = match group {
            Some(id) => {
                let group = storage
                    .groups
                    .get(id)?
                    .ok_or_else(|| TallyError::group_not_found(id.to_string()))?;
                (vec![group], storage.expenses.get_by_group(id)?)
            }
            None => (storage.groups.get_all()?, storage.expenses.get_all()?),
        };

        let metadata = ExportMetadata {
            group_count: groups.len(),
            member_count: groups.iter().map(|g| g.members.len()).sum(),
            expense_count: expenses.iter().filter(|e| !e.is_settlement()).count(),
            settlement_count: expenses.iter().filter(|e| e.is_settlement()).count(),
            earliest_expense: expenses.iter().map(|e| e.created_at).min().map(|d| d.to_rfc3339()),
            latest_expense: expenses.iter().map(|e| e.created_at).max().map(|d| d.to_rfc3339()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            groups,
            expenses,
            metadata,
        })
    }

    /// Validate schema version and referential integrity
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let groups: HashMap<_, _> = self.groups.iter().map(|g| (g.id, g)).collect();

        for expense in &self.expenses {
            let group = groups.get(&expense.group_id).ok_or_else(|| {
                format!(
                    "Expense {} references unknown group {}",
                    expense.id, expense.group_id
                )
            })?;

            if group.member(expense.payer).is_none() {
                return Err(format!(
                    "Expense {} is paid by {} who is not in '{}'",
                    expense.id, expense.payer, group.name
                ));
            }
            for split in &expense.splits {
                if group.member(split.member_id).is_none() {
                    return Err(format!(
                        "Expense {} has a split for {} who is not in '{}'",
                        expense.id, split.member_id, group.name
                    ));
                }
            }

            expense
                .validate()
                .map_err(|e| format!("Expense {}: {}", expense.id, e))?;
        }

        Ok(())
    }
}

/// Export to JSON
pub fn export_full_json<W: Write>(
    storage: &Storage,
    group: Option<GroupId>,
    writer: &mut W,
    pretty: bool,
) -> TallyResult<()> {
    let export = FullExport::from_storage(storage, group)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| TallyError::Export(e.to_string()))?;

    Ok(())
}

/// Parse and validate a JSON export
pub fn import_from_json(json_str: &str) -> TallyResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| TallyError::Export(e.to_string()))?;

    export.validate().map_err(TallyError::Export)?;

    Ok(export)
}
