//! Group repository for JSON storage
//!
//! Groups embed their member list, so membership changes are group updates.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{Group, GroupId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct GroupData {
    groups: Vec<Group>,
}

/// Repository for group persistence
pub struct GroupRepository {
    path: PathBuf,
    data: RwLock<HashMap<GroupId, Group>>,
}

impl GroupRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load groups from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: GroupData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for group in file_data.groups {
            data.insert(group.id, group);
        }

        Ok(())
    }

    /// Save groups to disk, oldest first
    pub fn save(&self) -> Result<(), TallyError> {
        let file_data = GroupData {
            groups: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: GroupId) -> Result<Option<Group>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// All groups in creation order
    pub fn get_all(&self) -> Result<Vec<Group>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut groups: Vec<_> = data.values().cloned().collect();
        groups.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(groups)
    }

    /// Case-insensitive lookup by name
    pub fn get_by_name(&self, name: &str) -> Result<Option<Group>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let name = name.trim().to_lowercase();
        Ok(data.values().find(|g| g.name.to_lowercase() == name).cloned())
    }

    /// Lookup by name, full ID or short ID prefix
    pub fn find(&self, identifier: &str) -> Result<Option<Group>, TallyError> {
        if let Some(group) = self.get_by_name(identifier)? {
            return Ok(Some(group));
        }
        if let Ok(id) = identifier.parse::<GroupId>() {
            return self.get(id);
        }

        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        let mut matches = data.values().filter(|g| g.id.matches_short(identifier));
        match (matches.next(), matches.next()) {
            (Some(group), None) => Ok(Some(group.clone())),
            (Some(_), Some(_)) => Err(TallyError::Validation(format!(
                "Group ID prefix '{}' is ambiguous",
                identifier
            ))),
            _ => Ok(None),
        }
    }

    /// Insert or update a group
    pub fn upsert(&self, group: Group) -> Result<(), TallyError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.insert(group.id, group);
        Ok(())
    }

    pub fn delete(&self, id: GroupId) -> Result<bool, TallyError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(data.remove(&id).is_some())
    }

    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SplitMethod;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, GroupRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = GroupRepository::new(temp_dir.path().join("groups.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_upsert_and_find() {
        let (_temp_dir, repo) = create_test_repo();
        let group = Group::new("Ski Trip", "CHF", SplitMethod::Equal);
        let id = group.id;
        repo.upsert(group).unwrap();

        assert_eq!(repo.find("ski trip").unwrap().unwrap().id, id);
        assert_eq!(repo.find(&id.to_string()).unwrap().unwrap().id, id);
        assert_eq!(repo.find(&id.as_uuid().to_string()).unwrap().unwrap().id, id);
        assert!(repo.find("nothing").unwrap().is_none());
    }

    #[test]
    fn test_save_and_reload_keeps_members() {
        let (temp_dir, repo) = create_test_repo();
        let mut group = Group::new("Flat", "EUR", SplitMethod::Percentage);
        group.add_member("Ann").unwrap();
        group.add_member("Bob").unwrap();
        let id = group.id;
        let members = group.member_ids();

        repo.upsert(group).unwrap();
        repo.save().unwrap();

        let reloaded = GroupRepository::new(temp_dir.path().join("groups.json"));
        reloaded.load().unwrap();
        let group = reloaded.get(id).unwrap().unwrap();
        assert_eq!(group.member_ids(), members);
        assert_eq!(group.default_split, SplitMethod::Percentage);
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, repo) = create_test_repo();
        let group = Group::new("Flat", "EUR", SplitMethod::Equal);
        let id = group.id;
        repo.upsert(group).unwrap();

        assert!(repo.delete(id).unwrap());
        assert!(!repo.delete(id).unwrap());
        assert_eq!(repo.count().unwrap(), 0);
    }
}
