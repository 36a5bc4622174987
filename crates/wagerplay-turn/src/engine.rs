//! The turn evaluation engine.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use wagerplay_protocol::{Amount, PlayerId, Question};
use wagerplay_session::GameSession;

use crate::record::{Classification, classify};
use crate::{EngineState, Party, SessionSummary, TurnError, TurnOutcome, TurnRecord, Verdict};

/// Plays one session from the guesser's side.
///
/// The engine has a single writer, the guesser's client, so every
/// operation takes `&mut self` and no locking is involved. Operations
/// that need `playing` return [`TurnError::StateConflict`] afterwards
/// and leave the engine untouched.
///
/// With a deadline set (see [`enforce_time_limit`](Self::enforce_time_limit)),
/// a submit or skip that arrives at or after the deadline is recorded
/// as `time_expired` instead of being scored.
#[derive(Debug)]
pub struct TurnEngine {
    session: Arc<GameSession>,
    guesser: PlayerId,
    opponent: Party,
    state: EngineState,
    question_index: usize,
    score: usize,
    history: Vec<TurnRecord>,
    forbidden_used: Vec<String>,
    verdict: Option<Verdict>,
    deadline: Option<Instant>,
}

impl TurnEngine {
    /// Starts playing `session` as `guesser`.
    ///
    /// # Errors
    /// [`TurnError::NotParticipant`] if `guesser` did not join the
    /// lobby. [`TurnError::EmptySession`] if there is nothing to answer.
    pub fn new(session: Arc<GameSession>, guesser: PlayerId) -> Result<Self, TurnError> {
        if !session.is_participant(&guesser) {
            return Err(TurnError::NotParticipant(guesser));
        }
        if session.question_set().is_empty() {
            return Err(TurnError::EmptySession(session.session_id().clone()));
        }

        let opponent = session
            .opponent_of(&guesser)
            .cloned()
            .map_or(Party::House, Party::Player);

        tracing::debug!(
            session_id = %session.session_id(),
            %guesser,
            %opponent,
            questions = session.question_count(),
            "turn engine started"
        );

        Ok(Self {
            session,
            guesser,
            opponent,
            state: EngineState::Playing,
            question_index: 0,
            score: 0,
            history: Vec::new(),
            forbidden_used: Vec::new(),
            verdict: None,
            deadline: None,
        })
    }

    /// Rejects play at `deadline` and later.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline to the session's start plus its time limit.
    ///
    /// Every engine started for the same session shares this deadline.
    pub fn enforce_time_limit(self) -> Self {
        let limit = Duration::from_secs(self.session.time_limit_seconds());
        let deadline = self.session.started_at() + limit;
        self.with_deadline(deadline)
    }

    // -- Operations ------------------------------------------------------

    /// Scores a guess against the current question.
    ///
    /// Forbidden terms are checked before the answer. A correct answer to
    /// the last question completes the session with the guesser as
    /// winner; an incorrect one is recorded and play continues.
    pub fn submit(&mut self, text: &str) -> Result<&TurnRecord, TurnError> {
        self.ensure_playing("submit")?;
        if self.past_deadline() {
            return Ok(self.time_out(text));
        }

        let index = self.question_index;
        let question = self.current()?.clone();

        let record = match classify(&question, text) {
            Classification::ForbiddenTermUsed { violated } => {
                for term in &violated {
                    if !self.forbidden_used.contains(term) {
                        self.forbidden_used.push(term.clone());
                    }
                }
                tracing::info!(
                    session_id = %self.session.session_id(),
                    guesser = %self.guesser,
                    question = index,
                    violated = ?violated,
                    "forbidden term used"
                );
                let mut record = TurnRecord::new(index, text, TurnOutcome::ForbiddenTermUsed);
                record.violated_terms = violated;
                self.history.push(record);
                self.finish(EngineState::LostForbiddenTerm, self.opponent.clone());
                return self.last_record();
            }
            Classification::Correct => {
                self.score += 1;
                TurnRecord::new(index, text, TurnOutcome::Correct)
            }
            Classification::Incorrect => TurnRecord::new(index, text, TurnOutcome::Incorrect),
        };

        let correct = record.outcome == TurnOutcome::Correct;
        self.history.push(record);

        if correct {
            if self.on_last_question() {
                self.finish(EngineState::Completed, Party::Player(self.guesser.clone()));
            } else {
                self.question_index += 1;
            }
        }
        self.last_record()
    }

    /// Gives up on the current question. Skipping the last question
    /// completes the session in the opponent's favour.
    pub fn skip(&mut self) -> Result<&TurnRecord, TurnError> {
        self.ensure_playing("skip")?;
        if self.past_deadline() {
            return Ok(self.time_out(""));
        }

        self.history.push(TurnRecord::new(
            self.question_index,
            "",
            TurnOutcome::Skipped,
        ));

        if self.on_last_question() {
            self.finish(EngineState::Completed, self.opponent.clone());
        } else {
            self.question_index += 1;
        }
        self.last_record()
    }

    /// The countdown reached zero.
    ///
    /// Repeated calls return the same verdict without recording anything
    /// new.
    ///
    /// # Errors
    /// [`TurnError::StateConflict`] if the session ended some other way.
    pub fn expire(&mut self) -> Result<Verdict, TurnError> {
        match self.state {
            EngineState::Playing => {
                self.time_out("");
                self.verdict_or_conflict("expire")
            }
            EngineState::TimeExpired => self.verdict_or_conflict("expire"),
            state => Err(TurnError::StateConflict {
                operation: "expire",
                state,
            }),
        }
    }

    /// The guesser abandons the session and forfeits the wager.
    pub fn cancel(&mut self) -> Result<Verdict, TurnError> {
        self.ensure_playing("cancel")?;
        self.history.push(TurnRecord::new(
            self.question_index,
            "",
            TurnOutcome::Cancelled,
        ));
        self.finish(EngineState::Cancelled, self.opponent.clone());
        self.verdict_or_conflict("cancel")
    }

    // -- Accessors -------------------------------------------------------

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// `true` when the guesser answered every question and won.
    pub fn is_won(&self) -> bool {
        self.state == EngineState::Completed
            && self
                .verdict
                .as_ref()
                .is_some_and(|v| v.is_winner(&self.guesser))
    }

    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    pub fn guesser(&self) -> &PlayerId {
        &self.guesser
    }

    pub fn opponent(&self) -> &Party {
        &self.opponent
    }

    /// The question being played, `None` once the session ended.
    pub fn current_question(&self) -> Option<&Question> {
        if self.state.is_terminal() {
            None
        } else {
            self.session.question(self.question_index)
        }
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn score(&self) -> usize {
        self.score
    }

    /// The audit trail, oldest first.
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    pub fn forbidden_terms_used(&self) -> &[String] {
        &self.forbidden_used
    }

    pub fn verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if one is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session.session_id().clone(),
            guesser: self.guesser.clone(),
            state: self.state,
            score: self.score,
            question_count: self.session.question_count(),
            verdict: self.verdict.clone(),
            forbidden_terms_used: self.forbidden_used.clone(),
            history: self.history.clone(),
            opponent_history: self.session.opponent_history().to_vec(),
        }
    }

    // -- Internals -------------------------------------------------------

    fn ensure_playing(&self, operation: &'static str) -> Result<(), TurnError> {
        if self.state.is_terminal() {
            tracing::debug!(
                session_id = %self.session.session_id(),
                operation,
                state = %self.state,
                "operation rejected after session ended"
            );
            return Err(TurnError::StateConflict {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn past_deadline(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn on_last_question(&self) -> bool {
        self.question_index + 1 >= self.session.question_count()
    }

    fn current(&self) -> Result<&Question, TurnError> {
        self.session
            .question(self.question_index)
            .ok_or_else(|| TurnError::EmptySession(self.session.session_id().clone()))
    }

    fn last_record(&self) -> Result<&TurnRecord, TurnError> {
        self.history
            .last()
            .ok_or_else(|| TurnError::EmptySession(self.session.session_id().clone()))
    }

    fn verdict_or_conflict(&self, operation: &'static str) -> Result<Verdict, TurnError> {
        self.verdict.clone().ok_or(TurnError::StateConflict {
            operation,
            state: self.state,
        })
    }

    /// Records a time-expired turn and ends the session.
    fn time_out(&mut self, text: &str) -> &TurnRecord {
        self.history.push(TurnRecord::new(
            self.question_index,
            text,
            TurnOutcome::TimeExpired,
        ));
        self.finish(EngineState::TimeExpired, self.opponent.clone());
        &self.history[self.history.len() - 1]
    }

    fn finish(&mut self, state: EngineState, winner: Party) {
        let guesser = Party::Player(self.guesser.clone());
        let guesser_won = winner == guesser;
        let loser = if guesser_won {
            self.opponent.clone()
        } else {
            guesser
        };

        let wager = self.session.wager();
        // GameConfig caps the wager far below overflow.
        let pot = wager.checked_mul(2).unwrap_or(wager);
        let (payout, forfeited) = if guesser_won {
            (pot, Amount::ZERO)
        } else {
            (Amount::ZERO, wager)
        };

        let verdict = Verdict {
            session_id: self.session.session_id().clone(),
            round: self.session.round(),
            state,
            winner,
            loser,
            payout,
            forfeited,
            wager,
            arbiter_address: self.session.arbiter_address().to_string(),
        };

        tracing::info!(
            session_id = %verdict.session_id,
            round = verdict.round,
            state = %state,
            winner = %verdict.winner,
            payout = %verdict.payout,
            forfeited = %verdict.forfeited,
            score = self.score,
            "session ended"
        );

        self.state = state;
        self.verdict = Some(verdict);
    }
}
