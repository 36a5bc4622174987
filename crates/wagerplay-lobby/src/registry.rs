//! Lobby registry: creates, tracks, and routes operations to lobbies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use wagerplay_protocol::{GameConfig, LobbyId, PlayerId};

use crate::actor::{LobbyHandle, spawn_lobby};
use crate::{Lobby, LobbyError, LobbyStore, RegistryConfig};

/// Symbols used in lobby ids: Crockford base32, which drops the
/// look-alikes I, L, O and U so ids survive being read aloud.
const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// The authoritative table of pending matches.
///
/// Each lobby lives in its own actor task, so operations on one lobby
/// are applied one at a time while unrelated lobbies proceed in
/// parallel. The map lock is held only to look up or swap a handle,
/// never across a call into an actor.
///
/// ```text
/// create ──→ [write lock: insert handle] ──→ actor: persist
/// join   ──→ [read lock: clone handle]   ──→ actor: check, save, commit
/// cancel ──→ [write lock: remove handle] ──→ actor: delete, stop
/// ```
pub struct LobbyRegistry<S: LobbyStore> {
    lobbies: RwLock<HashMap<LobbyId, LobbyHandle>>,
    store: Arc<S>,
    config: RegistryConfig,
}

impl<S: LobbyStore> LobbyRegistry<S> {
    /// Creates an empty registry writing through to `store`.
    pub fn new(store: S, config: RegistryConfig) -> Self {
        Self {
            lobbies: RwLock::new(HashMap::new()),
            store: Arc::new(store),
            config: config.validated(),
        }
    }

    /// Rebuilds a registry from every record in `store`.
    ///
    /// # Errors
    /// Returns [`LobbyError::Storage`] if the records cannot be loaded.
    pub async fn restore(store: S, config: RegistryConfig) -> Result<Self, LobbyError> {
        let registry = Self::new(store, config);
        let records = registry.store.load_all().await?;

        {
            let mut lobbies = registry.lobbies.write().await;
            for lobby in records {
                let id = lobby.id().clone();
                let handle = spawn_lobby(
                    lobby,
                    Arc::clone(&registry.store),
                    registry.config.command_buffer,
                );
                lobbies.insert(id, handle);
            }
            tracing::info!(lobbies = lobbies.len(), "lobby registry restored");
        }

        Ok(registry)
    }

    /// Opens a new lobby.
    ///
    /// The host, when given, is seated first. The returned lobby is
    /// already persisted.
    ///
    /// # Errors
    /// [`LobbyError::InvalidConfig`] if the capacity is outside
    /// `1..=max_capacity`, the host id is blank, or `game_config` fails
    /// validation. [`LobbyError::Storage`] if the store rejects the
    /// record, in which case no lobby is created.
    pub async fn create(
        &self,
        host: Option<PlayerId>,
        capacity: usize,
        game_config: GameConfig,
    ) -> Result<Lobby, LobbyError> {
        if capacity < 1 || capacity > self.config.max_capacity {
            return Err(LobbyError::InvalidConfig(format!(
                "capacity must be between 1 and {}",
                self.config.max_capacity
            )));
        }
        if host.as_ref().is_some_and(PlayerId::is_blank) {
            return Err(LobbyError::InvalidConfig(
                "hostIdentifier must not be blank".into(),
            ));
        }
        game_config.validate()?;

        let (lobby, handle, persisted) = {
            let mut lobbies = self.lobbies.write().await;
            let id = loop {
                let candidate = generate_lobby_id(self.config.id_length);
                if !lobbies.contains_key(&candidate) {
                    break candidate;
                }
            };
            let lobby = Lobby::new(id.clone(), host, capacity, game_config);
            let handle = spawn_lobby(
                lobby.clone(),
                Arc::clone(&self.store),
                self.config.command_buffer,
            );
            // Queued before the handle is visible, so the record is
            // stored before any join can reach the actor.
            let persisted = handle.queue_persist()?;
            lobbies.insert(id, handle.clone());
            (lobby, handle, persisted)
        };

        let result = persisted
            .await
            .unwrap_or_else(|_| Err(LobbyError::NotFound(lobby.id().clone())));
        if let Err(e) = result {
            self.forget(lobby.id(), &handle).await;
            tracing::warn!(lobby_id = %lobby.id(), error = %e, "lobby creation failed");
            return Err(e);
        }

        tracing::info!(
            lobby_id = %lobby.id(),
            host = ?lobby.host().map(PlayerId::as_str),
            capacity,
            game = %lobby.game_config().game_name,
            "lobby created"
        );
        Ok(lobby)
    }

    /// Current state of a lobby.
    pub async fn get(&self, id: &LobbyId) -> Result<Lobby, LobbyError> {
        let handle = self.handle(id).await?;
        let lobby = handle.get().await?;
        tracing::trace!(lobby_id = %id, status = %lobby.status(), "lobby fetched");
        Ok(lobby)
    }

    /// Seats `player` in the lobby.
    ///
    /// Joining twice is a no-op that returns the current state.
    ///
    /// # Errors
    /// [`LobbyError::NotFound`] for unknown, cancelled, or expired ids.
    /// [`LobbyError::Full`] when every seat is taken.
    /// [`LobbyError::InvalidConfig`] for a blank player id.
    pub async fn join(&self, id: &LobbyId, player: PlayerId) -> Result<Lobby, LobbyError> {
        if player.is_blank() {
            return Err(LobbyError::InvalidConfig(
                "playerIdentifier must not be blank".into(),
            ));
        }
        let handle = self.handle(id).await?;
        handle.join(player).await
    }

    /// Removes the lobby permanently and returns its last state.
    ///
    /// The id stops resolving before this returns.
    pub async fn cancel(&self, id: &LobbyId) -> Result<Lobby, LobbyError> {
        let handle = self
            .lobbies
            .write()
            .await
            .remove(id)
            .ok_or_else(|| LobbyError::NotFound(id.clone()))?;
        handle.cancel().await
    }

    /// Removes every waiting lobby untouched for at least `ttl` and
    /// returns the removed ids. Ready lobbies are kept.
    pub async fn expire_idle(&self, ttl: Duration) -> Vec<LobbyId> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        let handles: Vec<(LobbyId, LobbyHandle)> = self
            .lobbies
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.clone()))
            .collect();

        let mut expired = Vec::new();
        for (id, handle) in handles {
            if handle.expire_if_idle(ttl_ms).await {
                self.forget(&id, &handle).await;
                expired.push(id);
            }
        }

        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "expired idle lobbies");
        }
        expired
    }

    /// Runs [`expire_idle`](Self::expire_idle) with the configured TTL.
    pub async fn expire_stale(&self) -> Vec<LobbyId> {
        self.expire_idle(self.config.idle_ttl).await
    }

    /// Snapshot of every lobby still accepting players, oldest first.
    ///
    /// Lobbies that disappear while the snapshot is taken are skipped.
    pub async fn list_waiting(&self) -> Vec<Lobby> {
        let handles: Vec<LobbyHandle> = self.lobbies.read().await.values().cloned().collect();

        let mut waiting = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(lobby) = handle.get().await {
                if lobby.is_joinable() {
                    waiting.push(lobby);
                }
            }
        }
        waiting.sort_by_key(|lobby| (lobby.created_at(), lobby.id().clone()));
        waiting
    }

    /// Number of live lobbies.
    pub async fn len(&self) -> usize {
        self.lobbies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lobbies.read().await.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    async fn handle(&self, id: &LobbyId) -> Result<LobbyHandle, LobbyError> {
        self.lobbies
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| LobbyError::NotFound(id.clone()))
    }

    /// Drops the map entry for `id` if it still points at `handle`'s
    /// actor.
    async fn forget(&self, id: &LobbyId, handle: &LobbyHandle) {
        let mut lobbies = self.lobbies.write().await;
        if lobbies.get(id).is_some_and(|current| current.same_actor(handle)) {
            lobbies.remove(id);
        }
    }
}

/// A random id of `len` Crockford base32 symbols.
pub(crate) fn generate_lobby_id(len: usize) -> LobbyId {
    let mut rng = rand::rng();
    let id: String = (0..len)
        .map(|_| ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())] as char)
        .collect();
    LobbyId::new(id)
}
