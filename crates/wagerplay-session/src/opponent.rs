//! Simulated opponent turns.
//!
//! Every drawn session carries a scripted run of the house opponent
//! through the same questions. It is rolled once, when the session is
//! materialized, and clients show it beside the guesser's own history.
//! It never affects the verdict.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use wagerplay_protocol::Question;

/// How a simulated turn went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedOutcome {
    Correct,
    ForbiddenTermUsed,
    Skipped,
}

/// One simulated opponent turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedTurn {
    pub question_index: usize,
    pub main_term: String,
    pub submitted_text: String,
    pub outcome: SimulatedOutcome,
    /// The forbidden term the opponent slipped, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violated_terms: Vec<String>,
}

/// Rolls one turn per question: correct 7 times in 10, a forbidden
/// term 2 in 10, skipped otherwise.
pub fn simulate_opponent<R: Rng + ?Sized>(questions: &[Question], rng: &mut R) -> Vec<SimulatedTurn> {
    questions
        .iter()
        .enumerate()
        .map(|(question_index, question)| {
            let roll = rng.random_range(0..10u8);
            let slipped = if (7..9).contains(&roll) {
                question.forbidden_terms.choose(rng).cloned()
            } else {
                None
            };

            let (submitted_text, outcome, violated_terms) = match (roll, slipped) {
                (0..7, _) => (question.main_term.clone(), SimulatedOutcome::Correct, Vec::new()),
                (_, Some(term)) => (
                    format!("hint using {term}"),
                    SimulatedOutcome::ForbiddenTermUsed,
                    vec![term],
                ),
                _ => (String::new(), SimulatedOutcome::Skipped, Vec::new()),
            };

            SimulatedTurn {
                question_index,
                main_term: question.main_term.clone(),
                submitted_text,
                outcome,
                violated_terms,
            }
        })
        .collect()
}
