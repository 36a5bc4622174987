//! Lobby readiness rule.
//!
//! There is no separate "I'm ready" handshake: joining *is* the
//! readiness contribution. A lobby is ready exactly when it holds at
//! least `capacity` players, and the rule is re-evaluated after every
//! mutation.
//!
//! ```text
//! Waiting ──(players.len() >= capacity)──→ Ready
//! ```
//!
//! The transition is monotonic. Nothing moves a lobby back to
//! `Waiting`; a lobby that should stop existing is removed instead.

use serde::{Deserialize, Serialize};

/// Whether a lobby has gathered enough participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LobbyStatus {
    /// Accepting joins; not enough players yet.
    Waiting,
    /// Enough players have arrived; clients may materialize the session.
    Ready,
}

impl LobbyStatus {
    /// The pure readiness rule: `ready = player_count >= capacity`.
    pub fn evaluate(player_count: usize, capacity: usize) -> Self {
        if player_count >= capacity {
            Self::Ready
        } else {
            Self::Waiting
        }
    }

    /// Re-evaluates the rule without ever leaving `Ready`.
    pub fn advance(self, player_count: usize, capacity: usize) -> Self {
        match self {
            Self::Ready => Self::Ready,
            Self::Waiting => Self::evaluate(player_count, capacity),
        }
    }

    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if transitioning to `target` keeps readiness
    /// monotonic.
    pub fn can_transition_to(self, target: Self) -> bool {
        !(self.is_ready() && !target.is_ready())
    }
}

impl std::fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Ready => write!(f, "ready"),
        }
    }
}
