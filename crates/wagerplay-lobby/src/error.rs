//! Error types for the lobby layer.

use wagerplay_protocol::{LobbyId, ProtocolError};

use crate::StoreError;

/// Errors that can occur during lobby operations.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The lobby does not exist. Cancelled and expired lobbies report
    /// this too: a removed id is indistinguishable from one that was
    /// never created.
    #[error("lobby {0} not found")]
    NotFound(LobbyId),

    /// The creation or join payload was malformed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Every seat is taken; the joining player is not admitted.
    #[error("lobby {id} is full ({capacity} players)")]
    Full { id: LobbyId, capacity: usize },

    /// The storage backend rejected the write. The mutation was not
    /// applied.
    #[error("lobby storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl From<ProtocolError> for LobbyError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidConfig(msg) => Self::InvalidConfig(msg),
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}
