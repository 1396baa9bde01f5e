//! Core infrastructure shared by tree-of-thoughts operations.
//!
//! This module provides the [`ModeCore`] struct that owns the session store
//! and resolves session identifiers to lockable handles.

use crate::error::{AppResult, ToolError};
use crate::storage::{InMemoryStorage, SessionHandle, Storage};

/// Core infrastructure shared by the tree-of-thoughts mode.
///
/// Holds the session store. Handles returned by [`ModeCore::session`] carry
/// the per-session lock; the store's own index lock is released before the
/// handle is returned.
#[derive(Clone)]
pub struct ModeCore {
    /// Session store.
    storage: InMemoryStorage,
}

impl ModeCore {
    /// Create a new mode core around a session store.
    pub fn new(storage: InMemoryStorage) -> Self {
        Self { storage }
    }

    /// Get a reference to the session store.
    #[inline]
    pub fn storage(&self) -> &InMemoryStorage {
        &self.storage
    }

    /// Resolve a session identifier, failing with `NotFound` when unknown.
    pub async fn session(&self, session_id: &str) -> AppResult<SessionHandle> {
        self.storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| {
                ToolError::SessionNotFound {
                    session_id: session_id.to_string(),
                }
                .into()
            })
    }
}
