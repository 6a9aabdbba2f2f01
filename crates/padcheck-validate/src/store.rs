//! Reference persistence.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreIoError;
use crate::reference::{ReferenceKey, ReferenceRecord};

/// Storage of reference records by key.
pub trait ReferenceStore {
    fn get(&self, key: &ReferenceKey) -> Option<&ReferenceRecord>;

    /// Insert or replace; returns the previous record under the same key.
    fn insert(&mut self, record: ReferenceRecord) -> Option<ReferenceRecord>;

    fn remove(&mut self, key: &ReferenceKey) -> Option<ReferenceRecord>;

    fn keys(&self) -> Vec<ReferenceKey>;

    fn contains(&self, key: &ReferenceKey) -> bool {
        self.get(key).is_some()
    }
}

/// In-memory store, persisted as one JSON object keyed by reference key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceLibrary {
    records: BTreeMap<ReferenceKey, ReferenceRecord>,
}

impl ReferenceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Like [`Self::load_json`], but a missing file yields an empty library.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, StoreIoError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no reference library at {}", path.as_ref().display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), StoreIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl ReferenceStore for ReferenceLibrary {
    fn get(&self, key: &ReferenceKey) -> Option<&ReferenceRecord> {
        self.records.get(key)
    }

    fn insert(&mut self, record: ReferenceRecord) -> Option<ReferenceRecord> {
        self.records.insert(record.key.clone(), record)
    }

    fn remove(&mut self, key: &ReferenceKey) -> Option<ReferenceRecord> {
        self.records.remove(key)
    }

    fn keys(&self) -> Vec<ReferenceKey> {
        self.records.keys().cloned().collect()
    }
}
