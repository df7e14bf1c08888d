//! Group and member models
//!
//! A group is a set of people sharing expenses in a single currency. Members
//! are kept in membership order: that order decides who absorbs leftover
//! minor units when an amount does not divide evenly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::expense::SplitMethod;
use super::ids::{GroupId, MemberId};

/// A person taking part in a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub joined_at: DateTime<Utc>,
    /// Set when the member leaves; past expenses keep referencing them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MemberId::new(),
            name: name.into(),
            joined_at: Utc::now(),
            left_at: None,
        }
    }

    /// Whether the member belonged to the group at `at`
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.joined_at <= at && self.left_at.map_or(true, |left| at < left)
    }

    /// Whether the member is currently part of the group
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A group of members sharing expenses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,

    /// ISO 4217-like currency code, e.g. "EUR"
    pub currency: String,

    /// Split method used when an expense does not name one
    #[serde(default)]
    pub default_split: SplitMethod,

    /// Members in membership order (including members who left)
    #[serde(default)]
    pub members: Vec<Member>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    /// Create a new group with no members
    pub fn new(name: impl Into<String>, currency: impl Into<String>, default_split: SplitMethod) -> Self {
        let now = Utc::now();
        Self {
            id: GroupId::new(),
            name: name.into(),
            currency: currency.into(),
            default_split,
            members: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a member at the end of the membership order
    pub fn add_member(&mut self, name: &str) -> Result<Member, GroupValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupValidationError::EmptyMemberName);
        }
        if self.active_member_by_name(name).is_some() {
            return Err(GroupValidationError::DuplicateMember(name.to_string()));
        }

        let member = Member::new(name);
        self.members.push(member.clone());
        self.updated_at = Utc::now();
        Ok(member)
    }

    /// Mark a member as having left the group
    pub fn remove_member(&mut self, id: MemberId) -> Result<Member, GroupValidationError> {
        let member = self
            .members
            .iter_mut()
            .find(|m| m.id == id && m.is_active())
            .ok_or_else(|| GroupValidationError::NotActive(id.to_string()))?;

        let now = Utc::now();
        member.left_at = Some(now);
        let removed = member.clone();
        self.updated_at = now;
        Ok(removed)
    }

    pub fn member(&self, id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Case-insensitive lookup among current members
    pub fn active_member_by_name(&self, name: &str) -> Option<&Member> {
        let name = name.trim().to_lowercase();
        self.members
            .iter()
            .find(|m| m.is_active() && m.name.to_lowercase() == name)
    }

    /// Find a member by name (current members first) or by ID string
    pub fn find_member(&self, identifier: &str) -> Option<&Member> {
        if let Some(member) = self.active_member_by_name(identifier) {
            return Some(member);
        }
        let lowered = identifier.trim().to_lowercase();
        if let Some(member) = self.members.iter().find(|m| m.name.to_lowercase() == lowered) {
            return Some(member);
        }
        identifier
            .parse::<MemberId>()
            .ok()
            .and_then(|id| self.member(id))
    }

    /// Every member who ever belonged to the group
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.iter().map(|m| m.id).collect()
    }

    /// Members active at `at`, in membership order
    pub fn roster_at(&self, at: DateTime<Utc>) -> Vec<MemberId> {
        self.members
            .iter()
            .filter(|m| m.is_active_at(at))
            .map(|m| m.id)
            .collect()
    }

    pub fn active_members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(|m| m.is_active())
    }

    /// Display name for a member id, falling back to the short id
    pub fn member_name(&self, id: MemberId) -> String {
        self.member(id)
            .map(|m| m.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn validate(&self) -> Result<(), GroupValidationError> {
        if self.name.trim().is_empty() {
            return Err(GroupValidationError::EmptyName);
        }
        validate_currency_code(&self.currency)?;
        Ok(())
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.currency)
    }
}

/// Normalize and validate a three-letter currency code
pub fn validate_currency_code(code: &str) -> Result<String, GroupValidationError> {
    let code = code.trim().to_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(code)
    } else {
        Err(GroupValidationError::InvalidCurrency(code))
    }
}

/// Validation errors for groups and memberships
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupValidationError {
    #[error("Group name cannot be empty")]
    EmptyName,
    #[error("Member name cannot be empty")]
    EmptyMemberName,
    #[error("Member '{0}' is already in the group")]
    DuplicateMember(String),
    #[error("Member {0} is not an active member of the group")]
    NotActive(String),
    #[error("Invalid currency code '{0}' (expected three letters, e.g. EUR)")]
    InvalidCurrency(String),
}
