//! Error types for the settlement layer.

use wagerplay_protocol::LobbyId;

use crate::SettlementStatus;

/// Errors that can occur while moving wagered value.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    /// The gateway was unreachable or refused the transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(String),

    /// No settlement has been recorded for this session round.
    #[error("no settlement for session {session_id} round {round}")]
    NotFound { session_id: LobbyId, round: u32 },

    /// Only failed settlements can be re-driven.
    #[error("settlement for session {session_id} round {round} is {status}, not failed_simulated")]
    NotRetryable {
        session_id: LobbyId,
        round: u32,
        status: SettlementStatus,
    },
}
