//! Shared vocabulary for wagerplay.
//!
//! This crate defines the values every other layer agrees on:
//!
//! - **Identity** ([`PlayerId`], [`LobbyId`]): who is playing and where.
//! - **Money** ([`Amount`]): wagers and payouts in integer minor units.
//! - **Match parameters** ([`GameConfig`], [`QuestionMode`], [`Question`]):
//!   the immutable snapshot copied into a lobby at creation.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how request and response
//!   records are turned into bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer is the bottom of the stack. It knows nothing about
//! lobbies, sessions, or turns; it only describes the data they exchange.
//!
//! ```text
//! Lobby / Session / Turn / Settlement  →  Protocol (ids, amounts, config)
//! ```

mod amount;
mod codec;
mod config;
mod error;
mod types;

pub use amount::Amount;
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use config::{GameConfig, QuestionMode};
pub use error::ProtocolError;
pub use types::{LobbyId, PlayerId, Question};
