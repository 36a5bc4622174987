//! Lobby registry and readiness protocol for wagerplay.
//!
//! Each lobby runs as an isolated Tokio task (actor model) that owns
//! its record and writes every change through to a pluggable store.
//!
//! # Key types
//!
//! - [`LobbyRegistry`]: creates, fetches, joins, cancels, and expires lobbies
//! - [`Lobby`]: the record handed to callers
//! - [`LobbyStatus`]: the monotonic `waiting → ready` rule
//! - [`LobbyStore`]: storage backend trait, with [`MemoryStore`]
//! - [`watch_lobby`]: the client poll loop, stoppable through [`WatchHandle`]
//! - [`RegistryConfig`], [`WatchConfig`]: settings

mod actor;
mod config;
mod error;
mod lobby;
mod readiness;
mod registry;
mod store;
mod watcher;

pub use config::{RegistryConfig, WatchConfig};
pub use error::LobbyError;
pub use lobby::Lobby;
pub use readiness::LobbyStatus;
pub use registry::LobbyRegistry;
pub use store::{LobbyStore, MemoryStore, StoreError};
pub use watcher::{WatchHandle, WatchOutcome, watch_lobby};
