//! Turn evaluation for wagerplay.
//!
//! A materialized session is played on the guesser's client. Each
//! submission is scored against the active question, appended to an
//! audit trail, and may end the session. The terminal state decides a
//! [`Verdict`]: who won, and what is paid or forfeited.
//!
//! # Scoring order
//!
//! 1. Any forbidden term in the text: `forbidden_term_used`, session lost.
//! 2. The main term in the text: `correct`, next question or win.
//! 3. Otherwise: `incorrect`, recorded, play continues.
//!
//! # Timing
//!
//! The countdown lives on the client (`Countdown` from `wagerplay-tick` in
//! the demo) and calls [`TurnEngine::expire`] at zero. An engine can
//! also carry its own deadline so late input is refused even if the
//! client's countdown misbehaves.

mod engine;
mod error;
mod record;
mod state;
mod verdict;

pub use engine::TurnEngine;
pub use error::TurnError;
pub use record::{Classification, TurnOutcome, TurnRecord, classify};
pub use state::{EngineState, Party};
pub use verdict::{SessionSummary, Verdict};
