//! Settlement for wagerplay.
//!
//! When a session reaches a terminal state, its [`Verdict`] says who
//! owes whom. This crate turns that into a [`SettlementRequest`] for an
//! external [`SettlementGateway`] and keeps a ledger so each session
//! round is settled at most once. The ledger also keeps a running
//! [`Balance`] per address.
//!
//! A failed transfer never blocks the end of a game. The record is
//! marked `failed_simulated`, listed by [`Settler::pending`], and only
//! re-driven by an explicit [`Settler::retry`].
//!
//! [`Verdict`]: wagerplay_turn::Verdict

mod error;
mod gateway;
mod ledger;

pub use error::SettlementError;
pub use gateway::{SettlementGateway, SettlementReceipt, SettlementRequest};
pub use ledger::{Balance, SettlementRecord, SettlementStatus, Settler};
