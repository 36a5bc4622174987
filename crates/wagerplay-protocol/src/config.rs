//! Match configuration snapshot.

use serde::{Deserialize, Serialize};

use crate::{Amount, ProtocolError};

// ---------------------------------------------------------------------------
// QuestionMode
// ---------------------------------------------------------------------------

/// How questions are drawn from the bank when a session is materialized.
///
/// Serialized internally tagged: `{ "type": "random" }` or
/// `{ "type": "specific", "topic": "Music" }`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionMode {
    /// Shuffle the whole bank.
    #[default]
    Random,
    /// Only questions whose topic matches, case-insensitively.
    Specific { topic: String },
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Parameters of one wagered match.
///
/// Copied into the lobby at creation and never mutated afterwards; a
/// "play again" re-draws questions from the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Catalogue identifier of the game.
    pub game_id: String,
    /// Display name, e.g. "Taboo the AI".
    pub game_name: String,
    /// Wall-clock budget for the whole session.
    pub time_limit_seconds: u64,
    /// Number of questions in the session.
    pub question_count: usize,
    /// How questions are selected.
    #[serde(default)]
    pub question_mode: QuestionMode,
    /// Stake each participant puts in.
    pub wager: Amount,
    /// Arcade (arbiter) address that receives forfeited stakes when the
    /// house wins.
    pub arbiter_address: String,
}

impl GameConfig {
    /// Largest accepted stake. Leaves headroom so a pot of up to 16
    /// stakes never overflows.
    pub const MAX_WAGER: Amount = Amount::from_minor(u64::MAX / 16);

    /// Checks that every required field is present and in range.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidConfig`] naming the first field
    /// that fails.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let invalid = |msg: &str| Err(ProtocolError::InvalidConfig(msg.to_string()));

        if self.game_id.trim().is_empty() {
            return invalid("gameId is required");
        }
        if self.time_limit_seconds == 0 {
            return invalid("timeLimitSeconds must be positive");
        }
        if self.question_count == 0 {
            return invalid("questionCount must be at least 1");
        }
        if let QuestionMode::Specific { topic } = &self.question_mode {
            if topic.trim().is_empty() {
                return invalid("topic is required for specific questions");
            }
        }
        if self.wager > Self::MAX_WAGER {
            return invalid("wager exceeds the maximum stake");
        }
        if self.arbiter_address.trim().is_empty() {
            return invalid("arbiterAddress is required");
        }
        Ok(())
    }
}
