//! Configuration module for Tally
//!
//! This module provides configuration management including:
//! - Platform path resolution
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::TallyPaths;
pub use settings::Settings;
