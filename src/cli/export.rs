//! CLI command for data export

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::error::{TallyError, TallyResult};
use crate::export::{csv, json, yaml};
use crate::services::GroupService;
use crate::storage::Storage;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// CSV, one row per expense split
    Csv,
    /// JSON, groups and expenses
    Json,
    /// YAML, groups and expenses (human-readable)
    Yaml,
}

/// Export arguments
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Export format
    #[arg(value_enum)]
    pub format: ExportFormat,

    /// Only export this group (name or ID)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Compact JSON instead of pretty-printed
    #[arg(long)]
    pub compact: bool,
}

/// Handle the export command
pub fn handle_export_command(storage: &Storage, args: ExportArgs) -> TallyResult<()> {
    let group = match &args.group {
        Some(identifier) => Some(GroupService::new(storage).require(identifier)?.id),
        None => None,
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                TallyError::Export(format!("Failed to create file {}: {}", path.display(), e))
            })?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    match args.format {
        ExportFormat::Csv => csv::export_expenses_csv(storage, group, &mut writer)?,
        ExportFormat::Json => {
            json::export_full_json(storage, group, &mut writer, !args.compact)?;
            writeln!(writer).map_err(|e| TallyError::Export(e.to_string()))?;
        }
        ExportFormat::Yaml => yaml::export_full_yaml(storage, group, &mut writer)?,
    }
    writer
        .flush()
        .map_err(|e| TallyError::Export(e.to_string()))?;

    if let Some(path) = &args.output {
        eprintln!("Exported to: {}", path.display());
    }

    Ok(())
}
