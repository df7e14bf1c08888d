//! Export module for Tally
//!
//! - CSV: one row per expense split (spreadsheet-compatible)
//! - JSON: machine-readable export of groups and expenses
//! - YAML: human-readable export of groups and expenses

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_expenses_csv;
pub use self::json::{export_full_json, import_from_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use self::yaml::{export_full_yaml, import_from_yaml};
