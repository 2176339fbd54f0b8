use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub mod account;
pub mod question;
pub mod session;
pub mod timer;

pub use account::{AccountContext, PlanTier, UsageCounters};
pub use question::Question;
pub use session::{ExamSession, TickOutcome, UsageDelta, ViewState};

/// Practice mode, determining question style and count scaling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExamMode {
    Quick,
    Topic,
    Past,
    Model,
}

impl ExamMode {
    pub fn as_str(&self) -> &str {
        match self {
            ExamMode::Quick => "quick",
            ExamMode::Topic => "topic",
            ExamMode::Past => "past",
            ExamMode::Model => "model",
        }
    }

    /// Past and model sessions request a full-paper question count.
    pub fn is_full_paper_mode(&self) -> bool {
        matches!(self, ExamMode::Past | ExamMode::Model)
    }
}

/// Language the questions and explanations are generated in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Sinhala,
    English,
    Tamil,
}

impl Medium {
    pub fn as_str(&self) -> &str {
        match self {
            Medium::Sinhala => "Sinhala",
            Medium::English => "English",
            Medium::Tamil => "Tamil",
        }
    }
}

/// Body of POST /api/v1/sessions. The account context comes from the
/// caller's record; the engine never looks it up itself.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 200, message = "Subject must not be empty"))]
    pub subject: String,

    #[validate(length(max = 200, message = "Topic is too long"))]
    pub topic: Option<String>,

    pub medium: Medium,
    pub mode: ExamMode,

    #[serde(default)]
    pub timed: bool,

    pub account: AccountContext,
}

/// Body of POST /api/v1/sessions/{id}/answers. Applies to the currently
/// displayed question only; an out-of-range index is ignored by the engine.
#[derive(Debug, Deserialize)]
pub struct RecordAnswerRequest {
    pub option_index: usize,
}

/// The current question as shown while Testing: no answer key, no
/// explanation.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub question: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            question: q.question.clone(),
            options: q.options.clone(),
        }
    }
}

/// Per-question review data, exposed once the session enters Review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewItem {
    pub index: u32,
    pub question: String,
    pub options: Vec<String>,
    pub chosen: Option<usize>,
    pub correct_answer_index: usize,
    pub explanation: String,
    pub correct: bool,
}

/// Read-only state of a session, shaped for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub mode: ExamMode,
    pub medium: Medium,
    pub timed: bool,
    pub view: ViewState,
    pub question_count: u32,
    pub current_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<QuestionView>,
    pub answers: BTreeMap<usize, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u32>,
    pub is_timeout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    pub usage: UsageCounters,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<Vec<ReviewItem>>,
}
