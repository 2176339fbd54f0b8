use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    AccountContext, ExamMode, Medium, Question, QuestionView, ReviewItem, SessionSnapshot,
};

/// Practice attempt lifecycle: Testing -> Summary -> Review. Exit is allowed
/// from any state and simply discards the session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Testing,
    Summary,
    Review,
}

/// Consumption recorded when a session settles, handed to the usage
/// accountant exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageDelta {
    pub question_count: u32,
    pub is_full_paper: bool,
}

/// Outcome of one countdown tick.
#[derive(Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Budget decremented, remaining seconds returned.
    Ticked(u32),
    /// Budget hit zero on this tick; the session auto-submitted.
    Expired(UsageDelta),
    /// The session is no longer ticking (left Testing, untimed, or already
    /// at zero).
    Stopped,
}

/// One practice attempt. The question sequence is fixed at construction and
/// never changes length or order; answers are only writable while Testing;
/// the score is computed exactly once on the transition out of Testing.
#[derive(Debug)]
pub struct ExamSession {
    pub id: String,
    pub subject: String,
    pub topic: Option<String>,
    pub mode: ExamMode,
    pub medium: Medium,
    pub timed: bool,
    pub account: AccountContext,
    pub started_at: DateTime<Utc>,
    questions: Vec<Question>,
    current_index: usize,
    answers: BTreeMap<usize, usize>,
    view: ViewState,
    score: Option<u32>,
    is_timeout: bool,
    budget_seconds: Option<u32>,
    remaining_seconds: Option<u32>,
    full_paper_threshold: u32,
}

impl ExamSession {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        subject: String,
        topic: Option<String>,
        mode: ExamMode,
        medium: Medium,
        timed: bool,
        account: AccountContext,
        questions: Vec<Question>,
        seconds_per_question: u32,
        full_paper_threshold: u32,
    ) -> Self {
        let budget = timed.then(|| questions.len() as u32 * seconds_per_question);
        Self {
            id,
            subject,
            topic,
            mode,
            medium,
            timed,
            account,
            started_at: Utc::now(),
            questions,
            current_index: 0,
            answers: BTreeMap::new(),
            view: ViewState::Testing,
            score: None,
            is_timeout: false,
            budget_seconds: budget,
            remaining_seconds: budget,
            full_paper_threshold,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    pub fn is_timeout(&self) -> bool {
        self.is_timeout
    }

    pub fn remaining_seconds(&self) -> Option<u32> {
        self.remaining_seconds
    }

    pub fn budget_seconds(&self) -> Option<u32> {
        self.budget_seconds
    }

    /// Records (or overwrites) the answer for the currently displayed
    /// question. No-op outside Testing or for an option index outside the
    /// option range.
    pub fn record_answer(&mut self, option_index: usize) {
        if self.view != ViewState::Testing {
            return;
        }
        let Some(question) = self.questions.get(self.current_index) else {
            return;
        };
        if option_index >= question.options.len() {
            return;
        }
        self.answers.insert(self.current_index, option_index);
    }

    /// Moves the cursor forward; at the last question this submits instead.
    pub fn advance(&mut self) -> Option<UsageDelta> {
        if self.view != ViewState::Testing {
            return None;
        }
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            None
        } else {
            self.submit()
        }
    }

    /// Moves the display cursor back. Never touches answers or view state.
    pub fn previous(&mut self) {
        if self.view == ViewState::Testing && self.current_index > 0 {
            self.current_index -= 1;
        }
    }

    /// Scores the attempt and transitions to Summary. Idempotent: a second
    /// call (manual resubmit or a racing timer tick) is a no-op, so the
    /// score is settled by whichever path gets here first.
    pub fn submit(&mut self) -> Option<UsageDelta> {
        if self.view != ViewState::Testing {
            return None;
        }
        let score = self
            .answers
            .iter()
            .filter(|(index, answer)| {
                self.questions
                    .get(**index)
                    .is_some_and(|q| q.is_correct_choice(**answer))
            })
            .count() as u32;
        self.score = Some(score);
        self.view = ViewState::Summary;
        Some(UsageDelta {
            question_count: self.questions.len() as u32,
            is_full_paper: self.questions.len() as u32 >= self.full_paper_threshold,
        })
    }

    /// Flags the attempt as timed out, then submits through the normal path.
    pub fn expire(&mut self) -> Option<UsageDelta> {
        if self.view != ViewState::Testing {
            return None;
        }
        self.is_timeout = true;
        self.submit()
    }

    /// Decrements the countdown by one second while Testing.
    pub fn tick(&mut self) -> TickOutcome {
        if self.view != ViewState::Testing {
            return TickOutcome::Stopped;
        }
        let Some(remaining) = self.remaining_seconds.as_mut() else {
            return TickOutcome::Stopped;
        };
        if *remaining == 0 {
            return TickOutcome::Stopped;
        }
        *remaining -= 1;
        if *remaining == 0 {
            match self.expire() {
                Some(delta) => TickOutcome::Expired(delta),
                None => TickOutcome::Stopped,
            }
        } else {
            TickOutcome::Ticked(*remaining)
        }
    }

    /// Summary -> Review. No-op from any other state.
    pub fn open_review(&mut self) {
        if self.view == ViewState::Summary {
            self.view = ViewState::Review;
        }
    }

    fn review_items(&self) -> Vec<ReviewItem> {
        self.questions
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let chosen = self.answers.get(&index).copied();
                ReviewItem {
                    index: index as u32,
                    question: question.question.clone(),
                    options: question.options.clone(),
                    chosen,
                    correct_answer_index: question.correct_answer_index,
                    explanation: question.explanation.clone(),
                    correct: chosen.is_some_and(|c| question.is_correct_choice(c)),
                }
            })
            .collect()
    }

    /// Read-only state for rendering. While Testing the current question is
    /// exposed without its answer key; review data appears only in Review.
    pub fn snapshot(&self) -> SessionSnapshot {
        let current_question = (self.view == ViewState::Testing)
            .then(|| self.questions.get(self.current_index).map(QuestionView::from))
            .flatten();
        SessionSnapshot {
            session_id: self.id.clone(),
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            mode: self.mode,
            medium: self.medium,
            timed: self.timed,
            view: self.view,
            question_count: self.questions.len() as u32,
            current_index: self.current_index as u32,
            current_question,
            answers: self.answers.clone(),
            remaining_seconds: self.remaining_seconds,
            is_timeout: self.is_timeout,
            score: self.score,
            usage: self.account.usage.clone(),
            review: (self.view == ViewState::Review).then(|| self.review_items()),
        }
    }
}
