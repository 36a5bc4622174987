//! Client-side readiness polling.
//!
//! A waiting participant learns that its lobby filled up by asking the
//! registry again every few seconds. [`watch_lobby`] runs that loop as
//! a task the caller can stop, and reports how it ended.
//!
//! The loop polls once immediately, then on a [`TickScheduler`] with
//! start-up jitter. It ends on the first poll that sees `ready`, so a
//! watcher never reports `waiting` after it has reported `ready`.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use wagerplay_protocol::LobbyId;
use wagerplay_tick::{TickConfig, TickPolicy, TickScheduler};

use crate::{Lobby, LobbyError, LobbyRegistry, LobbyStore, WatchConfig};

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The lobby reached `ready`.
    Ready(Lobby),
    /// The lobby was seen waiting and then vanished (cancelled or
    /// expired). Not an error: the other side left.
    Abandoned(LobbyId),
    /// The very first poll found no such lobby.
    NotFound(LobbyId),
    /// The caller stopped the loop.
    Stopped,
}

/// Handle to a running poll loop.
///
/// Dropping the handle stops the loop at its next wake-up.
pub struct WatchHandle {
    stop: mpsc::Sender<()>,
    latest: watch::Receiver<Option<Lobby>>,
    task: JoinHandle<WatchOutcome>,
}

impl WatchHandle {
    /// Asks the loop to stop. Idempotent.
    pub fn stop(&self) {
        let _ = self.stop.try_send(());
    }

    /// The most recent snapshot the loop observed, if any.
    pub fn latest(&self) -> Option<Lobby> {
        self.latest.borrow().clone()
    }

    /// A receiver that is notified on every poll.
    pub fn subscribe(&self) -> watch::Receiver<Option<Lobby>> {
        self.latest.clone()
    }

    /// `true` once the loop has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to end.
    pub async fn outcome(self) -> WatchOutcome {
        let Self { stop, latest: _, task } = self;
        let outcome = task.await.unwrap_or(WatchOutcome::Stopped);
        drop(stop);
        outcome
    }
}

/// Starts polling `id` until it becomes ready, disappears, or the
/// returned handle stops it.
pub fn watch_lobby<S: LobbyStore>(
    registry: Arc<LobbyRegistry<S>>,
    id: LobbyId,
    config: WatchConfig,
) -> WatchHandle {
    let (stop_tx, stop_rx) = mpsc::channel(1);
    let (latest_tx, latest_rx) = watch::channel(None);

    let task = tokio::spawn(poll_loop(registry, id, config, latest_tx, stop_rx));

    WatchHandle {
        stop: stop_tx,
        latest: latest_rx,
        task,
    }
}

async fn poll_loop<S: LobbyStore>(
    registry: Arc<LobbyRegistry<S>>,
    id: LobbyId,
    config: WatchConfig,
    latest: watch::Sender<Option<Lobby>>,
    mut stop: mpsc::Receiver<()>,
) -> WatchOutcome {
    let mut scheduler = TickScheduler::new(TickConfig {
        period: config.interval,
        policy: TickPolicy::Skip,
        initial_jitter: config.initial_jitter,
    });
    let mut seen_waiting = false;
    let mut polls = 0u64;

    loop {
        polls += 1;
        match registry.get(&id).await {
            Ok(lobby) if lobby.is_ready() => {
                tracing::info!(lobby_id = %id, polls, "watcher observed ready lobby");
                latest.send_replace(Some(lobby.clone()));
                return WatchOutcome::Ready(lobby);
            }
            Ok(lobby) => {
                tracing::debug!(
                    lobby_id = %id,
                    polls,
                    players = lobby.players().len(),
                    capacity = lobby.capacity(),
                    "lobby still waiting"
                );
                latest.send_replace(Some(lobby));
                seen_waiting = true;
            }
            Err(LobbyError::NotFound(_)) if seen_waiting => {
                tracing::info!(lobby_id = %id, polls, "lobby abandoned while waiting");
                return WatchOutcome::Abandoned(id);
            }
            Err(LobbyError::NotFound(_)) => {
                tracing::debug!(lobby_id = %id, "watched lobby does not exist");
                return WatchOutcome::NotFound(id);
            }
            Err(e) => {
                tracing::warn!(lobby_id = %id, error = %e, "lobby poll failed, retrying");
            }
        }

        tokio::select! {
            _ = stop.recv() => {
                tracing::debug!(lobby_id = %id, polls, "watcher stopped");
                return WatchOutcome::Stopped;
            }
            _ = scheduler.wait_for_tick() => {}
        }
    }
}
