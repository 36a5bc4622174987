//! The materialized game session.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use wagerplay_protocol::{Amount, GameConfig, LobbyId, PlayerId, Question};

use crate::{Selection, SimulatedTurn};

/// Read-only description of one match, handed to every participant.
///
/// Built once by the [`Materializer`](crate::Materializer) and shared
/// behind an `Arc`. There are no setters: "play again" produces a new
/// session value with a higher `round`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    session_id: LobbyId,
    participants: Vec<PlayerId>,
    question_set: Vec<Question>,
    #[serde(rename = "wagerAmount")]
    wager: Amount,
    time_limit_seconds: u64,
    question_count: usize,
    arbiter_address: String,
    selection: Selection,
    /// 1 for the first session of a lobby, incremented by play-again.
    round: u32,
    #[serde(default)]
    opponent_history: Vec<SimulatedTurn>,
    /// When this session was built. Server-side deadlines count from
    /// here, however many engines are started for it.
    #[serde(skip, default = "Instant::now")]
    started_at: Instant,
}

impl GameSession {
    /// Assembles a session from an explicit question set.
    ///
    /// The materializer is the usual source of sessions; this is for
    /// hosts that pick questions themselves.
    pub fn new(
        session_id: LobbyId,
        participants: Vec<PlayerId>,
        question_set: Vec<Question>,
        config: &GameConfig,
    ) -> Self {
        let question_count = question_set.len();
        Self {
            session_id,
            participants,
            question_set,
            wager: config.wager,
            time_limit_seconds: config.time_limit_seconds,
            question_count,
            arbiter_address: config.arbiter_address.clone(),
            selection: Selection::Shuffled,
            round: 1,
            opponent_history: Vec::new(),
            started_at: Instant::now(),
        }
    }

    /// Attaches a simulated opponent run, one turn per question.
    pub fn with_opponent_history(mut self, history: Vec<SimulatedTurn>) -> Self {
        self.opponent_history = history;
        self
    }

    pub(crate) fn drawn(mut self, selection: Selection, round: u32) -> Self {
        self.selection = selection;
        self.round = round;
        self
    }

    /// Same as the lobby id.
    pub fn session_id(&self) -> &LobbyId {
        &self.session_id
    }

    /// Participants in join order; index 0 is the host.
    pub fn participants(&self) -> &[PlayerId] {
        &self.participants
    }

    pub fn host(&self) -> Option<&PlayerId> {
        self.participants.first()
    }

    /// The participant facing `player`: the first other participant, or
    /// `None` in a single-seat session where the house is the opponent.
    pub fn opponent_of(&self, player: &PlayerId) -> Option<&PlayerId> {
        self.participants.iter().find(|p| *p != player)
    }

    pub fn is_participant(&self, player: &PlayerId) -> bool {
        self.participants.contains(player)
    }

    pub fn question_set(&self) -> &[Question] {
        &self.question_set
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.question_set.get(index)
    }

    /// Stake each participant put in.
    pub fn wager(&self) -> Amount {
        self.wager
    }

    pub fn time_limit_seconds(&self) -> u64 {
        self.time_limit_seconds
    }

    /// Number of questions actually drawn. Lower than the configured
    /// count only when the bank was smaller.
    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn arbiter_address(&self) -> &str {
        &self.arbiter_address
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// The house opponent's scripted turns, for display only.
    pub fn opponent_history(&self) -> &[SimulatedTurn] {
        &self.opponent_history
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}
