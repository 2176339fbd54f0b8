use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ExamMode;
use crate::utils::period::starts_new_period;

/// Subscription tier gating feature access and monthly quotas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Plus,
}

impl PlanTier {
    pub fn as_str(&self) -> &str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Plus => "plus",
        }
    }

    /// Question count for quick/topic sessions.
    pub fn short_session_count(self) -> u32 {
        match self {
            PlanTier::Free => 10,
            PlanTier::Pro => 15,
            PlanTier::Plus => 20,
        }
    }

    /// Question count ceiling for past/model (full paper) sessions.
    pub fn paper_session_count(self) -> u32 {
        match self {
            PlanTier::Free => 25,
            PlanTier::Pro => 40,
            PlanTier::Plus => 50,
        }
    }

    /// Monthly question allowance. None = unlimited.
    pub fn monthly_question_quota(self) -> Option<u32> {
        match self {
            PlanTier::Free => Some(20),
            PlanTier::Pro | PlanTier::Plus => None,
        }
    }

    /// Monthly full-paper allowance. None = unlimited.
    pub fn monthly_paper_quota(self) -> Option<u32> {
        match self {
            PlanTier::Pro => Some(10),
            PlanTier::Free | PlanTier::Plus => None,
        }
    }

    /// Topic, past and model sessions are reserved for paying tiers.
    pub fn allows_mode(self, mode: ExamMode) -> bool {
        mode == ExamMode::Quick || self != PlanTier::Free
    }

    pub fn allows_timed(self) -> bool {
        self != PlanTier::Free
    }
}

/// Per-period consumption counters owned by the caller's account record.
/// Only the usage accountant mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageCounters {
    #[serde(default)]
    pub questions_answered_this_period: u32,
    #[serde(default)]
    pub papers_answered_this_period: u32,
    #[serde(default = "Utc::now")]
    pub period_started_at: DateTime<Utc>,
}

impl Default for UsageCounters {
    fn default() -> Self {
        Self {
            questions_answered_this_period: 0,
            papers_answered_this_period: 0,
            period_started_at: Utc::now(),
        }
    }
}

impl UsageCounters {
    /// Resets the counters when `now` falls in a later calendar month than
    /// the period marker. Called before any read or write of the counters.
    pub fn roll_over_if_new_period(&mut self, now: DateTime<Utc>) {
        if starts_new_period(self.period_started_at, now) {
            tracing::info!(
                period_started_at = %self.period_started_at,
                "Resetting usage counters for new period"
            );
            self.questions_answered_this_period = 0;
            self.papers_answered_this_period = 0;
            self.period_started_at = now;
        }
    }
}

/// Plan tier and usage counters supplied by the caller at session creation.
/// Returned updated once the session settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountContext {
    pub plan: PlanTier,
    #[serde(default)]
    pub usage: UsageCounters,
}
