//! Storage initialization
//!
//! First-run setup: directories, settings file and empty data files.

use crate::config::paths::TallyPaths;
use crate::config::settings::Settings;
use crate::error::TallyError;

use super::expenses::ExpenseRepository;
use super::groups::GroupRepository;

/// Initialize storage for a fresh installation.
///
/// Existing files are left alone, so running it twice is harmless. Returns
/// whether anything was created.
pub fn initialize_storage(paths: &TallyPaths) -> Result<bool, TallyError> {
    paths.ensure_directories()?;
    let mut created = false;

    if !paths.settings_file().exists() {
        Settings::default().save(paths)?;
        created = true;
    }

    if !paths.groups_file().exists() {
        GroupRepository::new(paths.groups_file()).save()?;
        created = true;
    }

    if !paths.expenses_file().exists() {
        ExpenseRepository::new(paths.expenses_file()).save()?;
        created = true;
    }

    if created {
        tracing::info!(base_dir = %paths.base_dir().display(), "initialized storage");
    }
    Ok(created)
}

/// Check if storage needs initialization
pub fn needs_initialization(paths: &TallyPaths) -> bool {
    !paths.settings_file().exists()
}
