//! The pool of questions sessions are drawn from.

use wagerplay_protocol::Question;

use crate::MaterializeError;

/// An immutable set of questions.
///
/// Topic text is static content supplied by the host application; the
/// bank only checks that each record can actually be played.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Builds a bank, rejecting questions that cannot be scored.
    ///
    /// # Errors
    /// [`MaterializeError::InvalidBank`] if a question has a blank main
    /// term or a blank forbidden term. A blank forbidden term would
    /// match every submission.
    pub fn new(questions: Vec<Question>) -> Result<Self, MaterializeError> {
        for (index, q) in questions.iter().enumerate() {
            if q.main_term.trim().is_empty() {
                return Err(MaterializeError::InvalidBank(format!(
                    "question {index} has no main term"
                )));
            }
            if q.forbidden_terms.iter().any(|t| t.trim().is_empty()) {
                return Err(MaterializeError::InvalidBank(format!(
                    "question {index} ({}) has a blank forbidden term",
                    q.main_term
                )));
            }
        }
        Ok(Self { questions })
    }

    /// Parses a JSON array of questions.
    #[cfg(feature = "json")]
    pub fn from_json(json: &str) -> Result<Self, MaterializeError> {
        let questions: Vec<Question> = serde_json::from_str(json)
            .map_err(|e| MaterializeError::InvalidBank(e.to_string()))?;
        Self::new(questions)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions whose topic equals `topic`, ignoring case.
    pub fn by_topic(&self, topic: &str) -> Vec<&Question> {
        let wanted = topic.trim().to_lowercase();
        self.questions
            .iter()
            .filter(|q| q.topic.trim().to_lowercase() == wanted)
            .collect()
    }

    /// Distinct topics in first-seen order.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = Vec::new();
        for q in &self.questions {
            if !topics.iter().any(|t| t.eq_ignore_ascii_case(&q.topic)) {
                topics.push(&q.topic);
            }
        }
        topics
    }
}
