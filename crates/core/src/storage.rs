//! Key-value persistence port.
//!
//! The cart ledger never touches a concrete backend. Every operation that
//! reads or writes persisted state takes a `&mut impl KeyValueStore`, which
//! models a flat, per-visitor text store (the shape of browser local storage).
//!
//! [`MemoryStore`] is the in-process implementation. It also records which
//! keys were written or removed so a caller holding an external backend can
//! hydrate it, run ledger operations, and commit only what changed.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Errors reported by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend refused the write (e.g. size limit).
    #[error("storage quota exceeded for key {0}")]
    QuotaExceeded(String),

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Flat key-value text storage.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the write.
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend rejects the delete.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// A pending write recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<'a> {
    /// The key now holds this value.
    Set(&'a str),
    /// The key was removed.
    Removed,
}

/// In-memory [`KeyValueStore`] with change tracking.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    dirty: BTreeSet<String>,
    max_value_len: Option<usize>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-loaded with values. Nothing is marked dirty.
    #[must_use]
    pub fn hydrate<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Reject values longer than `max` bytes with [`StorageError::QuotaExceeded`].
    #[must_use]
    pub const fn with_max_value_len(mut self, max: usize) -> Self {
        self.max_value_len = Some(max);
        self
    }

    /// Whether `key` currently holds a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys written or removed since hydration, with their final state.
    pub fn changes(&self) -> impl Iterator<Item = (&str, Change<'_>)> {
        self.dirty.iter().map(|key| {
            let change = self
                .values
                .get(key)
                .map_or(Change::Removed, |value| Change::Set(value));
            (key.as_str(), change)
        })
    }

    /// Whether anything was written or removed since hydration.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        if let Some(max) = self.max_value_len
            && value.len() > max
        {
            return Err(StorageError::QuotaExceeded(key.to_string()));
        }
        self.values.insert(key.to_string(), value);
        self.dirty.insert(key.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        self.dirty.insert(key.to_string());
        Ok(())
    }
}
