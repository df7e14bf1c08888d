//! YAML Export functionality
//!
//! Same content as the JSON export, in a human-readable form.

use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::export::json::FullExport;
use crate::models::GroupId;
use crate::storage::Storage;

fn export_err(e: impl std::fmt::Display) -> TallyError {
    TallyError::Export(e.to_string())
}

/// Export to YAML, prefixed with a comment header
pub fn export_full_yaml<W: Write>(
    storage: &Storage,
    group: Option<GroupId>,
    writer: &mut W,
) -> TallyResult<()> {
    let export = FullExport::from_storage(storage, group)?;

    writeln!(writer, "# Tally export").map_err(export_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_err)?;
    writeln!(writer, "# App Version: {}", export.app_version).map_err(export_err)?;
    writeln!(writer).map_err(export_err)?;

    serde_yaml::to_writer(writer, &export).map_err(export_err)?;

    Ok(())
}

/// Parse and validate a YAML export
pub fn import_from_yaml(yaml_str: &str) -> TallyResult<FullExport> {
    let export: FullExport = serde_yaml::from_str(yaml_str).map_err(export_err)?;
    export.validate().map_err(TallyError::Export)?;
    Ok(export)
}
