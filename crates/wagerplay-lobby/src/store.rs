//! Pluggable persistence for lobby records.
//!
//! The registry keeps every live lobby inside its own actor, but the
//! authoritative record is also written through to a [`LobbyStore`]
//! on every mutation. Swapping the backend (memory table, key-value
//! service, SQL table) does not change the registry contract because
//! per-lobby serialization happens in the actor, above the store.
//!
//! A store sees at most one writer per lobby id at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use wagerplay_protocol::LobbyId;

use crate::Lobby;

/// Errors a storage backend can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend itself failed (I/O, connection, serialization).
    #[error("backend error: {0}")]
    Backend(String),

    /// A write would move a ready lobby back to waiting.
    #[error("lobby {0} is ready and cannot return to waiting")]
    StatusRegression(LobbyId),
}

/// A keyed table of lobby records.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use std::sync::Mutex;
/// use wagerplay_lobby::{Lobby, LobbyStore, StoreError};
/// use wagerplay_protocol::LobbyId;
///
/// /// Keeps JSON blobs, the way a key-value service would.
/// #[derive(Default)]
/// struct JsonBlobStore {
///     blobs: Mutex<HashMap<LobbyId, String>>,
/// }
///
/// impl LobbyStore for JsonBlobStore {
///     async fn save(&self, lobby: &Lobby) -> Result<(), StoreError> {
///         let blob = serde_json::to_string(lobby)
///             .map_err(|e| StoreError::Backend(e.to_string()))?;
///         self.blobs.lock().unwrap().insert(lobby.id().clone(), blob);
///         Ok(())
///     }
///
///     async fn remove(&self, id: &LobbyId) -> Result<(), StoreError> {
///         self.blobs.lock().unwrap().remove(id);
///         Ok(())
///     }
///
///     async fn load_all(&self) -> Result<Vec<Lobby>, StoreError> {
///         let blobs: Vec<String> = self.blobs.lock().unwrap().values().cloned().collect();
///         blobs
///             .iter()
///             .map(|b| serde_json::from_str(b).map_err(|e| StoreError::Backend(e.to_string())))
///             .collect()
///     }
/// }
/// ```
pub trait LobbyStore: Send + Sync + 'static {
    /// Inserts or replaces the record for `lobby.id()`.
    fn save(&self, lobby: &Lobby) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes the record. Deleting a missing id is not an error.
    fn remove(&self, id: &LobbyId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every stored record, for restoring a registry after restart.
    fn load_all(&self) -> impl Future<Output = Result<Vec<Lobby>, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store backed by a `HashMap`.
///
/// Refuses writes that would regress a ready lobby to waiting, so the
/// monotonic readiness guarantee holds at the storage layer too.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<LobbyId, Lobby>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one record directly from the table.
    pub fn get(&self, id: &LobbyId) -> Option<Lobby> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<LobbyId, Lobby>> {
        // A poisoned table still holds consistent records: every write
        // is a single insert or remove.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LobbyStore for MemoryStore {
    async fn save(&self, lobby: &Lobby) -> Result<(), StoreError> {
        let mut records = self.lock();
        if let Some(existing) = records.get(lobby.id()) {
            if !existing.status().can_transition_to(lobby.status()) {
                return Err(StoreError::StatusRegression(lobby.id().clone()));
            }
        }
        records.insert(lobby.id().clone(), lobby.clone());
        Ok(())
    }

    async fn remove(&self, id: &LobbyId) -> Result<(), StoreError> {
        self.lock().remove(id);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Lobby>, StoreError> {
        Ok(self.lock().values().cloned().collect())
    }
}
