//! Unified error type for wagerplay.

use wagerplay_lobby::LobbyError;
use wagerplay_protocol::ProtocolError;
use wagerplay_session::MaterializeError;
use wagerplay_settlement::SettlementError;
use wagerplay_turn::TurnError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts layer errors automatically. Callers that
/// answer a client use [`code`](Self::code) and [`status`](Self::status)
/// instead of matching on the variants.
#[derive(Debug, thiserror::Error)]
pub enum WagerError {
    /// Malformed data: bad JSON, invalid amount, invalid config.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Lobby bookkeeping (not found, full, storage).
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// A lobby could not become a session.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// A turn was attempted against the wrong session state.
    #[error(transparent)]
    Turn(#[from] TurnError),

    /// A settlement lookup or retry failed.
    #[error(transparent)]
    Settlement(#[from] SettlementError),

    /// The request itself is incomplete.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl WagerError {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Protocol(ProtocolError::InvalidConfig(_) | ProtocolError::InvalidAmount(_)) => {
                "invalid_config"
            }
            Self::Protocol(ProtocolError::Decode(_)) => "bad_request",
            Self::Protocol(ProtocolError::Encode(_)) => "internal",

            Self::Lobby(LobbyError::NotFound(_)) => "not_found",
            Self::Lobby(LobbyError::InvalidConfig(_)) => "invalid_config",
            Self::Lobby(LobbyError::Full { .. }) => "lobby_full",
            Self::Lobby(LobbyError::Storage(_)) => "storage",

            Self::Materialize(MaterializeError::NotReady(_)) => "state_conflict",
            Self::Materialize(MaterializeError::EmptyBank | MaterializeError::InvalidBank(_)) => {
                "internal"
            }

            Self::Turn(TurnError::StateConflict { .. } | TurnError::EmptySession(_)) => {
                "state_conflict"
            }
            Self::Turn(TurnError::NotParticipant(_)) => "bad_request",

            Self::Settlement(SettlementError::TransferFailed(_)) => "transfer_failed",
            Self::Settlement(SettlementError::NotFound { .. }) => "not_found",
            Self::Settlement(SettlementError::NotRetryable { .. }) => "state_conflict",

            Self::BadRequest(_) => "bad_request",
        }
    }

    /// HTTP-style status for the reason.
    pub fn status(&self) -> u16 {
        match self.code() {
            "not_found" => 404,
            "invalid_config" | "bad_request" => 400,
            "lobby_full" | "state_conflict" => 409,
            "transfer_failed" => 502,
            _ => 500,
        }
    }
}
