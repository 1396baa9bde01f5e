use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Session, SessionHandle, Storage};
use crate::error::{StorageError, StorageResult};

#[derive(Default)]
struct SessionIndex {
    by_id: HashMap<String, SessionHandle>,
    order: Vec<String>,
}

/// In-memory session store. Sessions live for the lifetime of the process.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    index: Arc<RwLock<SessionIndex>>,
}

impl InMemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_session(&self, session: Session) -> StorageResult<SessionHandle> {
        let mut index = self.index.write().await;
        if index.by_id.contains_key(&session.id) {
            return Err(StorageError::DuplicateSession {
                session_id: session.id,
            });
        }

        let id = session.id.clone();
        let handle = Arc::new(RwLock::new(session));
        index.by_id.insert(id.clone(), Arc::clone(&handle));
        index.order.push(id.clone());
        debug!(session_id = %id, total = index.order.len(), "Session registered");

        Ok(handle)
    }

    async fn get_session(&self, id: &str) -> StorageResult<Option<SessionHandle>> {
        let index = self.index.read().await;
        Ok(index.by_id.get(id).map(Arc::clone))
    }

    async fn list_sessions(&self) -> StorageResult<Vec<SessionHandle>> {
        let index = self.index.read().await;
        Ok(index
            .order
            .iter()
            .filter_map(|id| index.by_id.get(id).map(Arc::clone))
            .collect())
    }
}
