//! Audit logging for Tally
//!
//! Records every create, update and delete of groups, members, expenses and
//! settlements with before/after snapshots in an append-only JSONL file.
//!
//! - `AuditEntry`: one operation on one entity
//! - `AuditLogger`: appends entries to the log and reads them back
//! - `generate_diff`: human-readable summary of what changed
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::audit::{AuditEntry, AuditLogger, EntityType};
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! let entry = AuditEntry::create(EntityType::Group, group.id.to_string(), Some(group.name.clone()), &group);
//! logger.log(&entry)?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::{changed_paths, generate_diff};
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
