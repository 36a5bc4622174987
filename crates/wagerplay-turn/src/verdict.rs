//! Terminal outcomes.

use serde::{Deserialize, Serialize};
use wagerplay_protocol::{Amount, LobbyId, PlayerId};
use wagerplay_session::SimulatedTurn;

use crate::{EngineState, Party, TurnRecord};

/// Who won, who lost, and what moves.
///
/// Produced exactly once, when the engine leaves `playing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub session_id: LobbyId,
    /// Session round within the lobby. Each round settles on its own.
    pub round: u32,
    pub state: EngineState,
    pub winner: Party,
    pub loser: Party,
    /// Paid to the winner when the guesser wins: both stakes.
    pub payout: Amount,
    /// The guesser's stake, lost to the winner.
    pub forfeited: Amount,
    /// Stake each side put in.
    pub wager: Amount,
    /// Where money owed to the house is sent.
    pub arbiter_address: String,
}

impl Verdict {
    /// Amount that changes hands from loser to winner.
    pub fn settlement_amount(&self) -> Amount {
        if self.payout.is_zero() {
            self.forfeited
        } else {
            self.payout
        }
    }

    /// `true` when `player` is the winner.
    pub fn is_winner(&self, player: &PlayerId) -> bool {
        self.winner.player() == Some(player)
    }
}

/// End-of-game report for the guesser's client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: LobbyId,
    pub guesser: PlayerId,
    pub state: EngineState,
    /// Correct answers.
    pub score: usize,
    pub question_count: usize,
    /// `None` while still playing.
    pub verdict: Option<Verdict>,
    /// Distinct forbidden terms the guesser used, first use first.
    pub forbidden_terms_used: Vec<String>,
    pub history: Vec<TurnRecord>,
    /// The simulated opponent's turns over the same questions.
    pub opponent_history: Vec<SimulatedTurn>,
}
