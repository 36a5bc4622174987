//! Session materialization for wagerplay.
//!
//! Once a lobby is ready, each participant's client asks for the game
//! session. This crate answers that request:
//!
//! 1. **Question bank**: the pool of playable questions ([`QuestionBank`])
//! 2. **Selection**: random or topic-filtered draws with an explicit
//!    fallback branch ([`select_questions`], [`Selection`])
//! 3. **Materialization**: one cached, immutable [`GameSession`] per
//!    lobby, redrawn only by play-again ([`Materializer`])
//! 4. **Simulated opponent**: a scripted run through the same questions,
//!    shown beside the guesser's history ([`simulate_opponent`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Turn Layer (above)  ← scores submissions against the session's questions
//!     ↕
//! Session Layer (this crate)  ← draws the question set once per ready lobby
//!     ↕
//! Lobby Layer (below)  ← proves enough participants have arrived
//! ```

mod bank;
mod error;
mod materializer;
mod opponent;
mod selection;
mod session;

pub use bank::QuestionBank;
pub use error::MaterializeError;
pub use materializer::Materializer;
pub use opponent::{SimulatedOutcome, SimulatedTurn, simulate_opponent};
pub use selection::{Selection, select_questions};
pub use session::GameSession;
