//! `Coordinator` builder and the operations that tie the layers together.
//!
//! The coordinator owns one of each layer and hands ids and snapshots
//! between them:
//!
//! ```text
//! create/join/cancel ──→ LobbyRegistry (actor per lobby)
//! watch              ──→ poll loop until ready / abandoned
//! materialize        ──→ Materializer (one cached session per lobby)
//! start_turns        ──→ TurnEngine (owned by the caller)
//! settle / retry     ──→ Settler ──→ SettlementGateway
//! ```
//!
//! Cancelling a lobby releases everything kept for it: the cached
//! session and every completed settlement record.

use std::sync::Arc;

use wagerplay_lobby::{
    Lobby, LobbyRegistry, LobbyStore, RegistryConfig, WatchConfig, WatchHandle, watch_lobby,
};
use wagerplay_protocol::{GameConfig, JsonCodec, LobbyId, PlayerId};
use wagerplay_session::{GameSession, Materializer, QuestionBank};
use wagerplay_settlement::{Balance, SettlementGateway, SettlementRecord, Settler};
use wagerplay_turn::{TurnEngine, Verdict};

use crate::WagerError;

/// Settings for a [`Coordinator`].
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    pub registry: RegistryConfig,
    pub watch: WatchConfig,
    /// Give every turn engine a server-side deadline of the session's
    /// time limit, counted from when the session was materialized.
    pub enforce_deadline: bool,
}

/// Builder for configuring a [`Coordinator`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use wagerplay::prelude::*;
///
/// # struct Offline;
/// # impl SettlementGateway for Offline {
/// #     async fn settle(&self, _: &SettlementRequest) -> Result<SettlementReceipt, SettlementError> {
/// #         Err(SettlementError::TransferFailed("offline".into()))
/// #     }
/// # }
/// # fn bank() -> QuestionBank {
/// #     QuestionBank::new(vec![Question {
/// #         main_term: "OCEAN".into(),
/// #         prompt: "A vast body of saltwater.".into(),
/// #         forbidden_terms: vec!["SEA".into()],
/// #         topic: "Nature".into(),
/// #     }]).unwrap()
/// # }
/// let coordinator = CoordinatorBuilder::new()
///     .registry(RegistryConfig {
///         idle_ttl: Duration::from_secs(600),
///         ..RegistryConfig::default()
///     })
///     .enforce_deadline(true)
///     .build(MemoryStore::new(), Offline, bank());
/// assert!(coordinator.config().enforce_deadline);
/// ```
#[derive(Debug, Default)]
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lobby registry configuration.
    pub fn registry(mut self, config: RegistryConfig) -> Self {
        self.config.registry = config;
        self
    }

    /// Sets the lobby watcher configuration.
    pub fn watch(mut self, config: WatchConfig) -> Self {
        self.config.watch = config;
        self
    }

    /// Enables or disables the server-side turn deadline.
    pub fn enforce_deadline(mut self, enforce: bool) -> Self {
        self.config.enforce_deadline = enforce;
        self
    }

    /// Builds a coordinator with an empty registry.
    pub fn build<S, G>(self, store: S, gateway: G, bank: QuestionBank) -> Coordinator<S, G>
    where
        S: LobbyStore,
        G: SettlementGateway,
    {
        let registry = LobbyRegistry::new(store, self.config.registry.clone());
        Coordinator::assemble(registry, gateway, bank, self.config)
    }

    /// Builds a coordinator whose registry is reloaded from `store`.
    ///
    /// # Errors
    /// Returns a storage error if the store cannot be read.
    pub async fn restore<S, G>(
        self,
        store: S,
        gateway: G,
        bank: QuestionBank,
    ) -> Result<Coordinator<S, G>, WagerError>
    where
        S: LobbyStore,
        G: SettlementGateway,
    {
        let registry = LobbyRegistry::restore(store, self.config.registry.clone()).await?;
        Ok(Coordinator::assemble(registry, gateway, bank, self.config))
    }
}

/// The wagered match service.
///
/// Every method is safe to call concurrently through a shared reference;
/// wrap the coordinator in an `Arc` to share it across tasks.
pub struct Coordinator<S: LobbyStore, G: SettlementGateway> {
    registry: Arc<LobbyRegistry<S>>,
    materializer: Materializer,
    settler: Settler<G>,
    config: CoordinatorConfig,
    pub(crate) codec: JsonCodec,
}

impl<S: LobbyStore, G: SettlementGateway> Coordinator<S, G> {
    fn assemble(
        registry: LobbyRegistry<S>,
        gateway: G,
        bank: QuestionBank,
        config: CoordinatorConfig,
    ) -> Self {
        tracing::info!(
            questions = bank.len(),
            enforce_deadline = config.enforce_deadline,
            "coordinator ready"
        );
        Self {
            registry: Arc::new(registry),
            materializer: Materializer::new(bank),
            settler: Settler::new(gateway),
            config,
            codec: JsonCodec,
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<LobbyRegistry<S>> {
        &self.registry
    }

    pub fn materializer(&self) -> &Materializer {
        &self.materializer
    }

    pub fn settler(&self) -> &Settler<G> {
        &self.settler
    }

    // -- Lobbies ---------------------------------------------------------

    /// Opens a lobby with `host` already seated.
    pub async fn create_lobby(
        &self,
        host: PlayerId,
        capacity: usize,
        game_config: GameConfig,
    ) -> Result<Lobby, WagerError> {
        Ok(self.registry.create(Some(host), capacity, game_config).await?)
    }

    pub async fn get_lobby(&self, id: &LobbyId) -> Result<Lobby, WagerError> {
        Ok(self.registry.get(id).await?)
    }

    pub async fn join_lobby(&self, id: &LobbyId, player: PlayerId) -> Result<Lobby, WagerError> {
        Ok(self.registry.join(id, player).await?)
    }

    /// Removes a lobby and releases its cached session and settled
    /// records. Records still awaiting a transfer are kept.
    pub async fn cancel_lobby(&self, id: &LobbyId) -> Result<Lobby, WagerError> {
        let lobby = self.registry.cancel(id).await?;
        self.release(id);
        Ok(lobby)
    }

    /// Starts polling a lobby with the configured watch settings.
    pub fn watch(&self, id: LobbyId) -> WatchHandle {
        watch_lobby(Arc::clone(&self.registry), id, self.config.watch.clone())
    }

    /// Lists lobbies still accepting players, oldest first.
    pub async fn list_waiting(&self) -> Vec<Lobby> {
        self.registry.list_waiting().await
    }

    /// Sweeps waiting lobbies idle past the configured TTL.
    pub async fn expire_idle(&self) -> Vec<LobbyId> {
        let expired = self.registry.expire_stale().await;
        for id in &expired {
            self.release(id);
        }
        expired
    }

    fn release(&self, id: &LobbyId) {
        self.materializer.discard(id);
        self.settler.discard(id);
    }

    // -- Sessions --------------------------------------------------------

    /// Returns the shared session for a ready lobby.
    pub async fn materialize(&self, id: &LobbyId) -> Result<Arc<GameSession>, WagerError> {
        let lobby = self.registry.get(id).await?;
        let session = self.materializer.materialize(&lobby)?;
        Ok(session)
    }

    /// Draws a fresh question set for the same participants.
    pub async fn play_again(&self, id: &LobbyId) -> Result<Arc<GameSession>, WagerError> {
        let lobby = self.registry.get(id).await?;
        let session = self.materializer.play_again(&lobby)?;
        tracing::info!(lobby_id = %id, round = session.round(), "play again");
        Ok(session)
    }

    /// Materializes the lobby's session and starts a turn engine for
    /// `guesser`.
    ///
    /// The engine is owned by the caller; pass its verdict to
    /// [`settle`](Self::settle) once it reaches a terminal state.
    pub async fn start_turns(&self, id: &LobbyId, guesser: PlayerId) -> Result<TurnEngine, WagerError> {
        let session = self.materialize(id).await?;
        let engine = TurnEngine::new(session, guesser)?;
        if self.config.enforce_deadline {
            Ok(engine.enforce_time_limit())
        } else {
            Ok(engine)
        }
    }

    // -- Settlement ------------------------------------------------------

    /// Settles a terminal verdict at most once. A gateway failure shows
    /// up in the returned record's status.
    pub async fn settle(&self, verdict: &Verdict) -> SettlementRecord {
        self.settler.settle(verdict).await
    }

    pub async fn retry_settlement(
        &self,
        session_id: &LobbyId,
        round: u32,
    ) -> Result<SettlementRecord, WagerError> {
        Ok(self.settler.retry(session_id, round).await?)
    }

    /// Settlements whose transfer has not been confirmed.
    pub fn pending_settlements(&self) -> Vec<SettlementRecord> {
        self.settler.pending()
    }

    /// Running settlement totals for a wallet address.
    pub fn balance(&self, address: &str) -> Balance {
        self.settler.balance(address)
    }
}
