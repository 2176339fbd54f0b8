use serde::{Deserialize, Serialize};

/// Number of options on an A/L multiple choice question.
pub const OPTIONS_PER_QUESTION: usize = 5;

/// A verified multiple choice question. Instances are only produced by the
/// question validator and are immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    pub explanation: String,
}

impl Question {
    pub fn is_correct_choice(&self, option_index: usize) -> bool {
        option_index == self.correct_answer_index
    }
}
