//! # Wagerplay
//!
//! Coordinator for wagered, head-to-head word-guessing matches.
//!
//! A host opens a lobby, a guest joins, both sides watch the lobby until
//! it is ready, and each plays the same drawn question set through a
//! turn engine. The terminal verdict is settled through an external
//! gateway exactly once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wagerplay::prelude::*;
//!
//! // wagerplay::init_tracing();
//! // let coordinator = CoordinatorBuilder::new()
//! //     .enforce_deadline(true)
//! //     .build(MemoryStore::new(), my_gateway, bank);
//! // let lobby = coordinator.create_lobby(host, 2, config).await?;
//! // let mut engine = coordinator.start_turns(lobby.id(), host).await?;
//! ```

mod api;
mod coordinator;
mod error;

pub use api::{ApiRequest, ApiResponse, LobbyAction};
pub use coordinator::{Coordinator, CoordinatorBuilder, CoordinatorConfig};
pub use error::WagerError;

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

pub mod prelude {
    pub use crate::{
        ApiRequest, ApiResponse, Coordinator, CoordinatorBuilder, CoordinatorConfig,
        LobbyAction, WagerError, init_tracing,
    };
    pub use wagerplay_lobby::{
        Lobby, LobbyStatus, LobbyStore, MemoryStore, RegistryConfig, StoreError, WatchConfig,
        WatchHandle, WatchOutcome,
    };
    pub use wagerplay_protocol::{
        Amount, Codec, GameConfig, JsonCodec, LobbyId, PlayerId, Question, QuestionMode,
    };
    pub use wagerplay_session::{
        GameSession, QuestionBank, Selection, SimulatedOutcome, SimulatedTurn,
    };
    pub use wagerplay_settlement::{
        Balance, SettlementError, SettlementGateway, SettlementReceipt, SettlementRecord,
        SettlementRequest, SettlementStatus,
    };
    pub use wagerplay_tick::{Countdown, CountdownTick};
    pub use wagerplay_turn::{
        EngineState, Party, SessionSummary, TurnEngine, TurnOutcome, TurnRecord, Verdict,
    };
}
