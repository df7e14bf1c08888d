//! Percentage shares with two-decimal precision
//!
//! Stored as basis points (hundredths of a percent), so `33.33%` is `3333`
//! and `100%` is [`Percentage::FULL`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A non-negative percentage in basis points
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percentage(u32);

impl Percentage {
    /// 100.00%
    pub const FULL: Percentage = Percentage(10_000);

    /// Create a percentage from basis points (`2500` = 25.00%)
    pub const fn from_basis_points(bp: u32) -> Self {
        Self(bp)
    }

    pub const fn basis_points(&self) -> u32 {
        self.0
    }

    /// Parse `"33.33"`, `"33.33%"` or `"50"`
    pub fn parse(s: &str) -> Result<Self, PercentageParseError> {
        let invalid = || PercentageParseError::InvalidFormat(s.to_string());
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u32 = whole.parse().map_err(|_| invalid())?;
        let frac: u32 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u32>().map_err(|_| invalid())? * 10,
            2 => frac.parse::<u32>().map_err(|_| invalid())?,
            _ => return Err(PercentageParseError::TooManyDecimals(s.to_string())),
        };

        let bp = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(|| PercentageParseError::OutOfRange(s.to_string()))?;
        if bp > Self::FULL.0 {
            return Err(PercentageParseError::OutOfRange(s.to_string()));
        }
        Ok(Self(bp))
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentageParseError {
    #[error("Invalid percentage: {0}")]
    InvalidFormat(String),
    #[error("Too many decimals in percentage (max 2): {0}")]
    TooManyDecimals(String),
    #[error("Percentage must be between 0 and 100: {0}")]
    OutOfRange(String),
}
