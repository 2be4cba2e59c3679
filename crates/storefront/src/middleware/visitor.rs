//! Per-visitor key-value storage extractor.
//!
//! The cart ledger persists through `medicart_core::KeyValueStore`. In the
//! storefront that store is a flat string map held in the visitor's session:
//! the extractor hydrates a `MemoryStore` from it, the handler runs its
//! ledger operation synchronously, and [`VisitorStorage::commit`] writes the
//! changed keys back.

use std::collections::BTreeMap;

use axum::{extract::FromRequestParts, http::request::Parts};
use medicart_core::{Change, MemoryStore};
use tower_sessions::Session;
use tracing::debug;

use crate::error::AppError;
use crate::models::session_keys;

/// Largest value accepted for a single storage key, in bytes.
pub const MAX_VALUE_LEN: usize = 64 * 1024;

/// Extractor giving a handler the visitor's key-value storage.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(mut storage: VisitorStorage) -> Result<impl IntoResponse> {
///     let ledger = Ledger::restore(storage.store())?;
///     ledger.save(storage.store_mut())?;
///     storage.commit().await?;
///     Ok(())
/// }
/// ```
pub struct VisitorStorage {
    session: Session,
    entries: BTreeMap<String, String>,
    store: MemoryStore,
}

impl VisitorStorage {
    /// Read the visitor's storage out of `session`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session backend cannot be read.
    pub async fn open(session: Session) -> Result<Self, AppError> {
        let entries: BTreeMap<String, String> = session
            .get(session_keys::LOCAL_STORAGE)
            .await?
            .unwrap_or_default();
        let store = MemoryStore::hydrate(entries.clone()).with_max_value_len(MAX_VALUE_LEN);

        Ok(Self {
            session,
            entries,
            store,
        })
    }

    /// The storage to read ledger state from.
    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// The storage to run ledger mutations against.
    pub const fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.store
    }

    /// The session this storage was read from.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Write changed keys back to the session. A no-op if nothing changed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the session cannot be modified.
    pub async fn commit(mut self) -> Result<(), AppError> {
        if !self.store.is_dirty() {
            return Ok(());
        }

        for (key, change) in self.store.changes() {
            match change {
                Change::Set(value) => {
                    self.entries.insert(key.to_string(), value.to_string());
                }
                Change::Removed => {
                    self.entries.remove(key);
                }
            }
        }

        debug!(keys = self.entries.len(), "Committing visitor storage");
        self.session
            .insert(session_keys::LOCAL_STORAGE, &self.entries)
            .await?;
        Ok(())
    }
}

impl<S> FromRequestParts<S> for VisitorStorage
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        Self::open(session).await
    }
}
