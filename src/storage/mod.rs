//! Storage layer for Tally
//!
//! JSON files with atomic writes, in-memory repositories guarded by
//! `RwLock`, and the audit log for every mutation.

pub mod expenses;
pub mod file_io;
pub mod groups;
pub mod init;

pub use expenses::ExpenseRepository;
pub use file_io::{read_json, write_json_atomic};
pub use groups::GroupRepository;
pub use init::initialize_storage;

use serde::Serialize;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::TallyPaths;
use crate::error::TallyError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: TallyPaths,
    pub groups: GroupRepository,
    pub expenses: ExpenseRepository,
    audit: AuditLogger,
}

impl Storage {
    pub fn new(paths: TallyPaths) -> Result<Self, TallyError> {
        paths.ensure_directories()?;

        Ok(Self {
            groups: GroupRepository::new(paths.groups_file()),
            expenses: ExpenseRepository::new(paths.expenses_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &TallyPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&mut self) -> Result<(), TallyError> {
        self.groups.load()?;
        self.expenses.load()?;
        tracing::debug!(
            groups = self.groups.count()?,
            expenses = self.expenses.count()?,
            "loaded data"
        );
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), TallyError> {
        self.groups.save()?;
        self.expenses.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.settings_file().exists()
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Record a create in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        group_id: impl Into<String>,
        entity: &T,
    ) -> Result<(), TallyError> {
        let entry = AuditEntry::create(entity_type, entity_id, entity_name, entity).in_group(group_id);
        self.audit.log(&entry)
    }

    /// Record an update in the audit log, with a diff of the two snapshots
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        group_id: impl Into<String>,
        before: &T,
        after: &T,
    ) -> Result<(), TallyError> {
        let mut entry = AuditEntry::update(entity_type, entity_id, entity_name, before, after, None)
            .in_group(group_id);
        if let (Some(before), Some(after)) = (&entry.before, &entry.after) {
            entry.diff_summary = generate_diff(before, after);
        }
        self.audit.log(&entry)
    }

    /// Record deletes in the audit log with one flush
    pub fn log_deletes(&self, entries: Vec<AuditEntry>) -> Result<(), TallyError> {
        self.audit.log_batch(&entries)
    }

    /// Record a delete in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        group_id: impl Into<String>,
        entity: &T,
    ) -> Result<(), TallyError> {
        let entry = AuditEntry::delete(entity_type, entity_id, entity_name, entity).in_group(group_id);
        self.audit.log(&entry)
    }
}
