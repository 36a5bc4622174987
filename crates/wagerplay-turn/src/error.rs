//! Error types for the turn layer.

use wagerplay_protocol::{LobbyId, PlayerId};

use crate::EngineState;

/// Errors that can occur while playing a session.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The operation needs a `playing` session but the session already
    /// ended. Nothing was recorded.
    #[error("cannot {operation} in state {state}")]
    StateConflict {
        operation: &'static str,
        state: EngineState,
    },

    /// The guesser is not one of the session's participants.
    #[error("player {0} is not a participant")]
    NotParticipant(PlayerId),

    /// The session has no questions to play.
    #[error("session {0} has no questions")]
    EmptySession(LobbyId),
}
