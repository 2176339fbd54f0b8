use chrono::{DateTime, Utc};

use crate::models::{UsageCounters, UsageDelta};

/// Records consumption on session settlement. Questions count
/// unconditionally; a paper counts only when the attempt met the full-paper
/// threshold. No quota enforcement here: what a plan may *request* was
/// decided at generation time.
pub fn apply_usage(usage: &mut UsageCounters, delta: UsageDelta, now: DateTime<Utc>) {
    usage.roll_over_if_new_period(now);
    usage.questions_answered_this_period += delta.question_count;
    if delta.is_full_paper {
        usage.papers_answered_this_period += 1;
    }
    tracing::info!(
        questions = usage.questions_answered_this_period,
        papers = usage.papers_answered_this_period,
        "Usage counters updated"
    );
}
