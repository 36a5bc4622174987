//! Lobby actor: an isolated Tokio task that owns one lobby.
//!
//! Every mutation of a lobby funnels through its actor's command
//! channel, so two joins racing for the last seat are applied one after
//! the other and the second one sees the first one's result. Unrelated
//! lobbies have unrelated actors and never wait on each other.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use wagerplay_protocol::{LobbyId, PlayerId};

use crate::lobby::{JoinEffect, now_millis};
use crate::{Lobby, LobbyError, LobbyStore};

/// Commands sent to a lobby actor through its channel.
///
/// Variants carrying a `oneshot::Sender` are request/reply: the caller
/// waits for the actor's answer on that channel.
pub(crate) enum LobbyCommand {
    /// Write the initial record to the store. Always the first command
    /// an actor receives.
    Persist {
        reply: oneshot::Sender<Result<(), LobbyError>>,
    },

    /// Seat a player.
    Join {
        player: PlayerId,
        reply: oneshot::Sender<Result<Lobby, LobbyError>>,
    },

    /// Read the current record.
    Get { reply: oneshot::Sender<Lobby> },

    /// Delete the lobby and stop the actor, replying with the last state.
    Cancel { reply: oneshot::Sender<Lobby> },

    /// Delete the lobby if it is still waiting and has been idle for at
    /// least `ttl_ms`. Replies `true` if it was removed.
    ExpireIfIdle {
        ttl_ms: u64,
        reply: oneshot::Sender<bool>,
    },
}

/// Handle to a running lobby actor.
///
/// Cheap to clone: it is an `mpsc::Sender` plus the id. A handle whose
/// actor has stopped answers every request with
/// [`LobbyError::NotFound`].
#[derive(Clone)]
pub(crate) struct LobbyHandle {
    id: LobbyId,
    sender: mpsc::Sender<LobbyCommand>,
}

impl LobbyHandle {
    /// `true` when both handles talk to the same actor.
    pub(crate) fn same_actor(&self, other: &LobbyHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Queues the initial persist without awaiting. Must be called on a
    /// fresh handle, before the handle is published.
    pub(crate) fn queue_persist(
        &self,
    ) -> Result<oneshot::Receiver<Result<(), LobbyError>>, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .try_send(LobbyCommand::Persist { reply })
            .map_err(|_| self.gone())?;
        Ok(rx)
    }

    pub(crate) async fn join(&self, player: PlayerId) -> Result<Lobby, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.request(LobbyCommand::Join { player, reply }).await?;
        rx.await.map_err(|_| self.gone())?
    }

    pub(crate) async fn get(&self) -> Result<Lobby, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.request(LobbyCommand::Get { reply }).await?;
        rx.await.map_err(|_| self.gone())
    }

    pub(crate) async fn cancel(&self) -> Result<Lobby, LobbyError> {
        let (reply, rx) = oneshot::channel();
        self.request(LobbyCommand::Cancel { reply }).await?;
        rx.await.map_err(|_| self.gone())
    }

    pub(crate) async fn expire_if_idle(&self, ttl_ms: u64) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .request(LobbyCommand::ExpireIfIdle { ttl_ms, reply })
            .await
            .is_err()
        {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    async fn request(&self, cmd: LobbyCommand) -> Result<(), LobbyError> {
        self.sender.send(cmd).await.map_err(|_| self.gone())
    }

    fn gone(&self) -> LobbyError {
        LobbyError::NotFound(self.id.clone())
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct LobbyActor<S: LobbyStore> {
    lobby: Lobby,
    store: Arc<S>,
    receiver: mpsc::Receiver<LobbyCommand>,
}

impl<S: LobbyStore> LobbyActor<S> {
    /// Processes commands until the lobby is removed or every handle is
    /// dropped.
    async fn run(mut self) {
        let lobby_id = self.lobby.id().clone();
        tracing::debug!(%lobby_id, "lobby actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                LobbyCommand::Persist { reply } => {
                    let result = self.store.save(&self.lobby).await.map_err(LobbyError::from);
                    let failed = result.is_err();
                    let _ = reply.send(result);
                    if failed {
                        break;
                    }
                }
                LobbyCommand::Join { player, reply } => {
                    let result = self.handle_join(player).await;
                    let _ = reply.send(result);
                }
                LobbyCommand::Get { reply } => {
                    let _ = reply.send(self.lobby.clone());
                }
                LobbyCommand::Cancel { reply } => {
                    self.remove_from_store().await;
                    tracing::info!(%lobby_id, players = self.lobby.players().len(), "lobby cancelled");
                    let _ = reply.send(self.lobby.clone());
                    break;
                }
                LobbyCommand::ExpireIfIdle { ttl_ms, reply } => {
                    let idle = self.lobby.idle_for_ms(now_millis());
                    let expire = !self.lobby.is_ready() && idle >= ttl_ms;
                    if expire {
                        self.remove_from_store().await;
                        tracing::info!(%lobby_id, idle_ms = idle, "idle lobby expired");
                    }
                    let _ = reply.send(expire);
                    if expire {
                        break;
                    }
                }
            }
        }

        tracing::debug!(%lobby_id, "lobby actor stopped");
    }

    async fn handle_join(&mut self, player: PlayerId) -> Result<Lobby, LobbyError> {
        if self.lobby.contains(&player) {
            return Ok(self.lobby.clone());
        }
        if self.lobby.players().len() >= self.lobby.capacity() {
            return Err(LobbyError::Full {
                id: self.lobby.id().clone(),
                capacity: self.lobby.capacity(),
            });
        }

        // Apply to a copy, commit only once the store accepted it.
        let mut next = self.lobby.clone();
        let effect = next.admit(player.clone());
        self.store.save(&next).await?;
        self.lobby = next;

        let lobby_id = self.lobby.id();
        tracing::info!(
            %lobby_id,
            %player,
            players = self.lobby.players().len(),
            capacity = self.lobby.capacity(),
            "player joined lobby"
        );
        if let JoinEffect::Admitted { became_ready: true } = effect {
            tracing::info!(%lobby_id, "lobby ready");
        }

        Ok(self.lobby.clone())
    }

    async fn remove_from_store(&self) {
        if let Err(e) = self.store.remove(self.lobby.id()).await {
            // The live lobby is gone regardless; a stale record would
            // only reappear after a restore.
            tracing::warn!(lobby_id = %self.lobby.id(), error = %e, "failed to delete lobby record");
        }
    }
}

/// Spawns a lobby actor and returns a handle to it.
///
/// `channel_size` bounds the command queue; senders wait when it fills.
pub(crate) fn spawn_lobby<S: LobbyStore>(
    lobby: Lobby,
    store: Arc<S>,
    channel_size: usize,
) -> LobbyHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let id = lobby.id().clone();

    let actor = LobbyActor {
        lobby,
        store,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    LobbyHandle { id, sender: tx }
}
