//! Turn records and submission classification.

use serde::{Deserialize, Serialize};
use wagerplay_protocol::Question;

/// How a single attempt was scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    Correct,
    ForbiddenTermUsed,
    Incorrect,
    Skipped,
    TimeExpired,
    Cancelled,
}

/// One entry of a session's audit trail. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    pub question_index: usize,
    pub submitted_text: String,
    pub outcome: TurnOutcome,
    /// Forbidden terms found in `submitted_text`, in question order.
    pub violated_terms: Vec<String>,
}

impl TurnRecord {
    pub(crate) fn new(question_index: usize, submitted_text: &str, outcome: TurnOutcome) -> Self {
        Self {
            question_index,
            submitted_text: submitted_text.to_string(),
            outcome,
            violated_terms: Vec::new(),
        }
    }
}

/// Result of scoring a submission against one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// At least one forbidden term appears. Takes priority over a
    /// correct answer.
    ForbiddenTermUsed { violated: Vec<String> },
    Correct,
    Incorrect,
}

/// Scores `text` against `question`, ignoring case.
///
/// Forbidden terms are checked first: a submission containing both the
/// answer and a banned word is a violation.
pub fn classify(question: &Question, text: &str) -> Classification {
    let text = text.to_lowercase();

    let violated: Vec<String> = question
        .forbidden_terms
        .iter()
        .filter(|term| {
            let term = term.trim();
            !term.is_empty() && text.contains(&term.to_lowercase())
        })
        .cloned()
        .collect();
    if !violated.is_empty() {
        return Classification::ForbiddenTermUsed { violated };
    }

    let answer = question.main_term.trim().to_lowercase();
    if !answer.is_empty() && text.contains(&answer) {
        Classification::Correct
    } else {
        Classification::Incorrect
    }
}
