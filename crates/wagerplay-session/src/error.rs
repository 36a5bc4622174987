//! Error types for the session layer.

use wagerplay_protocol::LobbyId;

/// Errors that can occur while turning a lobby into a game session.
#[derive(Debug, thiserror::Error)]
pub enum MaterializeError {
    /// The lobby has not gathered enough participants yet.
    #[error("lobby {0} is not ready")]
    NotReady(LobbyId),

    /// There are no questions to draw from.
    #[error("question bank is empty")]
    EmptyBank,

    /// A question record is unusable (missing term, malformed JSON).
    #[error("invalid question bank: {0}")]
    InvalidBank(String),
}
