//! The lobby record.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use wagerplay_protocol::{GameConfig, LobbyId, PlayerId};

use crate::LobbyStatus;

/// A pending match: who has arrived, how many seats there are, and the
/// configuration the match will be played with.
///
/// Fields are private. A `Lobby` handed out by the registry is a
/// snapshot; only the lobby's own actor mutates the authoritative copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lobby {
    id: LobbyId,
    #[serde(rename = "hostIdentifier")]
    host: Option<PlayerId>,
    players: Vec<PlayerId>,
    capacity: usize,
    game_config: GameConfig,
    status: LobbyStatus,
    /// Unix milliseconds.
    created_at: u64,
    /// Unix milliseconds of the last mutation.
    updated_at: u64,
}

/// What a join did to the lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JoinEffect {
    /// The player was appended.
    Admitted { became_ready: bool },
    /// The player was already seated; nothing changed.
    AlreadyPresent,
}

impl Lobby {
    pub(crate) fn new(
        id: LobbyId,
        host: Option<PlayerId>,
        capacity: usize,
        game_config: GameConfig,
    ) -> Self {
        let now = now_millis();
        let players: Vec<PlayerId> = host.iter().cloned().collect();
        let status = LobbyStatus::evaluate(players.len(), capacity);
        Self {
            id,
            host,
            players,
            capacity,
            game_config,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &LobbyId {
        &self.id
    }

    /// The creator, always `players()[0]` when present.
    pub fn host(&self) -> Option<&PlayerId> {
        self.host.as_ref()
    }

    /// Participants in join order.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn game_config(&self) -> &GameConfig {
        &self.game_config
    }

    pub fn status(&self) -> LobbyStatus {
        self.status
    }

    pub fn is_ready(&self) -> bool {
        self.status.is_ready()
    }

    pub fn contains(&self, player: &PlayerId) -> bool {
        self.players.contains(player)
    }

    /// Joinable: still waiting and with a free seat.
    pub fn is_joinable(&self) -> bool {
        !self.status.is_ready() && self.players.len() < self.capacity
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    /// Milliseconds since the last mutation.
    pub fn idle_for_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.updated_at)
    }

    /// Seats `player` unless already present. The caller enforces
    /// capacity before calling.
    pub(crate) fn admit(&mut self, player: PlayerId) -> JoinEffect {
        if self.contains(&player) {
            return JoinEffect::AlreadyPresent;
        }
        let was_ready = self.status.is_ready();
        self.players.push(player);
        self.status = self.status.advance(self.players.len(), self.capacity);
        self.updated_at = now_millis().max(self.updated_at);
        JoinEffect::Admitted {
            became_ready: !was_ready && self.status.is_ready(),
        }
    }
}

/// Current wall-clock time in Unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
