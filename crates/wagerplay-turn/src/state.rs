//! Engine state machine and the parties a verdict names.

use serde::{Deserialize, Serialize};
use wagerplay_protocol::PlayerId;

// ---------------------------------------------------------------------------
// EngineState
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle.
///
/// ```text
///           ┌──→ Completed          (last question answered or skipped)
///           ├──→ LostForbiddenTerm  (a forbidden term was submitted)
/// Playing ──┼──→ TimeExpired        (countdown or deadline reached zero)
///           └──→ Cancelled          (guesser gave up)
/// ```
///
/// Every state other than `Playing` is terminal: no operation leaves it.
/// A correct answer to the last question is `Completed` with the
/// guesser as winner; see [`TurnEngine::is_won`](crate::TurnEngine::is_won).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Playing,
    Completed,
    LostForbiddenTerm,
    TimeExpired,
    Cancelled,
}

impl EngineState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Playing => "playing",
            Self::Completed => "completed",
            Self::LostForbiddenTerm => "lost_forbidden_term",
            Self::TimeExpired => "time_expired",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Party
// ---------------------------------------------------------------------------

/// One side of a verdict.
///
/// A single-seat session is played against the house, which has no
/// wallet of its own; money owed to it goes to the arbiter address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Player(PlayerId),
    House,
}

impl Party {
    pub fn player(&self) -> Option<&PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            Self::House => None,
        }
    }

    pub fn is_house(&self) -> bool {
        matches!(self, Self::House)
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Player(id) => write!(f, "{id}"),
            Self::House => f.write_str("house"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_playing_is_open() {
        assert!(!EngineState::Playing.is_terminal());
        for state in [
            EngineState::Completed,
            EngineState::LostForbiddenTerm,
            EngineState::TimeExpired,
            EngineState::Cancelled,
        ] {
            assert!(state.is_terminal(), "{state} should be terminal");
        }
    }

    #[test]
    fn test_state_display_matches_serde() {
        let json = serde_json::to_string(&EngineState::LostForbiddenTerm).unwrap();
        assert_eq!(json, format!("\"{}\"", EngineState::LostForbiddenTerm));
    }

    #[test]
    fn test_party_serialization() {
        assert_eq!(serde_json::to_string(&Party::House).unwrap(), "\"house\"");
        assert_eq!(
            serde_json::to_string(&Party::Player("0xa".into())).unwrap(),
            r#"{"player":"0xa"}"#
        );
    }
}
