//! Session materializer: turns a ready lobby into a game session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use wagerplay_lobby::Lobby;
use wagerplay_protocol::LobbyId;

use crate::{GameSession, MaterializeError, QuestionBank, select_questions, simulate_opponent};

/// Builds and caches one [`GameSession`] per lobby.
///
/// Participants poll independently and each one asks for the session
/// when it sees the lobby become ready. The first request draws the
/// questions; every later request for the same lobby gets the cached
/// `Arc`, so all participants play the same set.
///
/// ```text
/// materialize(lobby) ──→ cached? ──yes──→ same Arc
///                            │
///                            no ──→ draw questions ──→ cache ──→ new Arc
///
/// play_again(lobby) ──→ drop cached ──→ draw questions ──→ round + 1
/// ```
///
/// Each draw also rolls the simulated opponent's turns and stamps the
/// session's start time.
pub struct Materializer {
    bank: Arc<QuestionBank>,
    sessions: Mutex<HashMap<LobbyId, Arc<GameSession>>>,
}

impl Materializer {
    pub fn new(bank: QuestionBank) -> Self {
        Self {
            bank: Arc::new(bank),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Returns the session for `lobby`, drawing it on first call.
    ///
    /// # Errors
    /// [`MaterializeError::NotReady`] while the lobby is still waiting.
    /// [`MaterializeError::EmptyBank`] if there is nothing to draw.
    pub fn materialize(&self, lobby: &Lobby) -> Result<Arc<GameSession>, MaterializeError> {
        if !lobby.is_ready() {
            return Err(MaterializeError::NotReady(lobby.id().clone()));
        }

        let mut sessions = self.lock();
        if let Some(existing) = sessions.get(lobby.id()) {
            tracing::debug!(lobby_id = %lobby.id(), round = existing.round(), "session already materialized");
            return Ok(Arc::clone(existing));
        }

        let session = Arc::new(self.draw(lobby, 1)?);
        sessions.insert(lobby.id().clone(), Arc::clone(&session));
        Ok(session)
    }

    /// Replaces the cached session with a freshly drawn one.
    ///
    /// The lobby must still be ready; its participants and config are
    /// reused unchanged.
    pub fn play_again(&self, lobby: &Lobby) -> Result<Arc<GameSession>, MaterializeError> {
        if !lobby.is_ready() {
            return Err(MaterializeError::NotReady(lobby.id().clone()));
        }

        let mut sessions = self.lock();
        let round = sessions
            .get(lobby.id())
            .map_or(1, |previous| previous.round().saturating_add(1));
        let session = Arc::new(self.draw(lobby, round)?);
        sessions.insert(lobby.id().clone(), Arc::clone(&session));
        Ok(session)
    }

    /// The cached session, if one was materialized.
    pub fn get(&self, id: &LobbyId) -> Option<Arc<GameSession>> {
        self.lock().get(id).cloned()
    }

    /// Forgets the session for a cancelled or expired lobby.
    pub fn discard(&self, id: &LobbyId) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            tracing::debug!(lobby_id = %id, "session discarded");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn draw(&self, lobby: &Lobby, round: u32) -> Result<GameSession, MaterializeError> {
        let config = lobby.game_config();
        let mut rng = rand::rng();
        let (questions, selection) = select_questions(
            &self.bank,
            &config.question_mode,
            config.question_count,
            &mut rng,
        )?;
        let opponent = simulate_opponent(&questions, &mut rng);

        let session = GameSession::new(
            lobby.id().clone(),
            lobby.players().to_vec(),
            questions,
            config,
        )
        .with_opponent_history(opponent)
        .drawn(selection, round);

        tracing::info!(
            lobby_id = %lobby.id(),
            round,
            questions = session.question_count(),
            fallback = session.selection().is_fallback(),
            "session materialized"
        );
        Ok(session)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<LobbyId, Arc<GameSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
