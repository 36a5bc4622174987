//! Question selection.
//!
//! Every draw reshuffles. Nothing is seeded from the lobby id, so two
//! sessions from the same lobby are not expected to share questions.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use wagerplay_protocol::{Question, QuestionMode};

use crate::{MaterializeError, QuestionBank};

/// Which branch produced a session's question set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    /// Random mode: the whole bank shuffled.
    Shuffled,
    /// Specific mode with enough questions on the topic.
    TopicFiltered { topic: String },
    /// Specific mode, but the topic had fewer questions than requested,
    /// so the set was drawn from the whole bank instead. Clients should
    /// tell the participant.
    FallbackRandom { topic: String, available: usize },
}

impl Selection {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FallbackRandom { .. })
    }
}

/// Draws `count` questions from `bank` according to `mode`.
///
/// Returns fewer than `count` questions only when the bank itself is
/// smaller.
pub fn select_questions<R: Rng + ?Sized>(
    bank: &QuestionBank,
    mode: &QuestionMode,
    count: usize,
    rng: &mut R,
) -> Result<(Vec<Question>, Selection), MaterializeError> {
    if bank.is_empty() {
        return Err(MaterializeError::EmptyBank);
    }

    let (mut pool, selection): (Vec<&Question>, Selection) = match mode {
        QuestionMode::Random => (bank.questions().iter().collect(), Selection::Shuffled),
        QuestionMode::Specific { topic } => {
            let filtered = bank.by_topic(topic);
            if filtered.len() >= count {
                (
                    filtered,
                    Selection::TopicFiltered {
                        topic: topic.clone(),
                    },
                )
            } else {
                tracing::warn!(
                    %topic,
                    available = filtered.len(),
                    requested = count,
                    "not enough questions on topic, falling back to random selection"
                );
                (
                    bank.questions().iter().collect(),
                    Selection::FallbackRandom {
                        topic: topic.clone(),
                        available: filtered.len(),
                    },
                )
            }
        }
    };

    if pool.len() < count {
        tracing::warn!(
            available = pool.len(),
            requested = count,
            "question bank smaller than requested count"
        );
    }

    pool.shuffle(rng);
    let questions = pool.into_iter().take(count).cloned().collect();
    Ok((questions, selection))
}
