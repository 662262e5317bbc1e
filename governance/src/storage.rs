//! Persistence of the local vote list.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::GovernanceError;
use crate::my_vote::MyVoteList;

pub trait MyVoteStorage {
    /// Returns an empty list if nothing was stored yet.
    fn load(&self) -> Result<MyVoteList, GovernanceError>;
    fn save(&self, list: &MyVoteList) -> Result<(), GovernanceError>;
}

/// Pretty printed JSON in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MyVoteStorage for JsonFileStorage {
    fn load(&self) -> Result<MyVoteList, GovernanceError> {
        if !self.path.exists() {
            return Ok(MyVoteList::default());
        }
        let json = std::fs::read_to_string(&self.path).map_err(|e| {
            GovernanceError::Storage(format!("failed to read {}: {e}", self.path.display()))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| GovernanceError::Serialization(format!("invalid vote list JSON: {e}")))
    }

    fn save(&self, list: &MyVoteList) -> Result<(), GovernanceError> {
        let json = serde_json::to_string_pretty(list)
            .map_err(|e| GovernanceError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GovernanceError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, json).map_err(|e| {
            GovernanceError::Storage(format!("failed to write {}: {e}", self.path.display()))
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    list: Mutex<MyVoteList>,
}

impl MyVoteStorage for MemoryStorage {
    fn load(&self) -> Result<MyVoteList, GovernanceError> {
        Ok(self.list.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, list: &MyVoteList) -> Result<(), GovernanceError> {
        *self.list.lock().unwrap_or_else(PoisonError::into_inner) = list.clone();
        Ok(())
    }
}
