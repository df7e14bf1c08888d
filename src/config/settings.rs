//! User settings for Tally
//!
//! Stored as `config.json` in the base directory. Fields missing from an
//! older file take their defaults.

use serde::{Deserialize, Serialize};

use super::paths::TallyPaths;
use crate::engine::{SettlementPlanner, MAX_EXACT_MEMBERS};
use crate::error::TallyError;
use crate::models::SplitMethod;

/// User settings for Tally
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency used by `group create` when none is given
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Split method for new groups
    #[serde(default)]
    pub default_split: SplitMethod,

    /// Largest number of non-zero balances `settle plan --exact` searches
    /// exhaustively; beyond it the greedy plan is used
    #[serde(default = "default_exact_search_limit")]
    pub exact_search_limit: usize,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Default log filter when `TALLY_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_exact_search_limit() -> usize {
    12
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            default_split: SplitMethod::default(),
            exact_search_limit: default_exact_search_limit(),
            date_format: default_date_format(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &TallyPaths) -> Result<Self, TallyError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| TallyError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                TallyError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TallyPaths) -> Result<(), TallyError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TallyError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| TallyError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Planner for `settle plan`; `exact` opts into the bounded exact search
    pub fn planner(&self, exact: bool) -> SettlementPlanner {
        if exact {
            SettlementPlanner::with_exact_search_limit(self.exact_search_limit.min(MAX_EXACT_MEMBERS))
        } else {
            SettlementPlanner::greedy()
        }
    }
}
