use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::metrics::{
    GENERATION_DURATION_SECONDS, GENERATION_REQUESTS_TOTAL, QUESTIONS_GENERATED_TOTAL,
};
use crate::models::{AccountContext, CreateSessionRequest, ExamMode, Medium, Question};
use crate::services::question_source::{GenerationRequest, QuestionSource};
use crate::services::{question_validator, response_extractor};

/// Typed failure surfaced from session creation. Nothing after a successful
/// creation can fail; every in-session operation is total.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// Collaborator unreachable or unconfigured. Fatal until configuration
    /// is fixed.
    #[error("generation backend is not configured: {0}")]
    Configuration(String),

    /// Transport or service failure, collaborator message preserved. Safe to
    /// retry.
    #[error("generation request failed: {0}")]
    Network(String),

    /// The collaborator returned no usable text (e.g. safety filtering).
    /// Safe to retry, possibly with adjusted parameters.
    #[error("generation backend returned no text")]
    EmptyResponse,

    /// No question array could be recovered from the response. The original
    /// text is kept for diagnostics (logs only, never the wire).
    #[error("could not recover a question array from the response")]
    Parse { raw: String },

    /// The payload parsed but zero records survived schema validation.
    #[error("no well-formed questions produced")]
    Validation,

    /// The account's plan does not permit the requested session.
    #[error("plan does not permit this request: {0}")]
    PlanRestricted(String),
}

impl GenerationError {
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            GenerationError::Configuration(_) | GenerationError::PlanRestricted(_)
        )
    }

    pub fn metric_label(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "configuration",
            GenerationError::Network(_) => "network",
            GenerationError::EmptyResponse => "empty",
            GenerationError::Parse { .. } => "parse",
            GenerationError::Validation => "validation",
            GenerationError::PlanRestricted(_) => "plan_restricted",
        }
    }
}

/// Builds generation requests from session parameters and plan entitlements,
/// invokes the collaborator once, and composes extraction + validation.
pub struct GenerationService {
    source: Arc<dyn QuestionSource>,
}

impl GenerationService {
    pub fn new(source: Arc<dyn QuestionSource>) -> Self {
        Self { source }
    }

    pub async fn request_questions(
        &self,
        request: &CreateSessionRequest,
        account: &AccountContext,
    ) -> Result<Vec<Question>, GenerationError> {
        let result = self.request_questions_inner(request, account).await;
        match &result {
            Ok(questions) => {
                GENERATION_REQUESTS_TOTAL.with_label_values(&["ok"]).inc();
                QUESTIONS_GENERATED_TOTAL.inc_by(questions.len() as u64);
            }
            Err(err) => {
                GENERATION_REQUESTS_TOTAL
                    .with_label_values(&[err.metric_label()])
                    .inc();
            }
        }
        result
    }

    async fn request_questions_inner(
        &self,
        request: &CreateSessionRequest,
        account: &AccountContext,
    ) -> Result<Vec<Question>, GenerationError> {
        check_entitlements(request, account)?;
        let count = target_count(request.mode, account)?;

        let generation_request = build_generation_request(
            &request.subject,
            request.topic.as_deref(),
            request.medium,
            request.mode,
            count,
        );

        // One collaborator invocation per call; retry policy belongs to the
        // caller, keyed off GenerationError::is_retryable.
        let started = Instant::now();
        let outcome = self.source.generate(&generation_request).await;
        let label = match &outcome {
            Ok(_) => "ok",
            Err(err) => err.metric_label(),
        };
        GENERATION_DURATION_SECONDS
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());
        let raw_text = outcome?;

        let records = response_extractor::extract_records(&raw_text)?;
        let questions = question_validator::filter_valid(records);
        if questions.is_empty() {
            // An empty set is a retry signal, never a degraded success.
            tracing::warn!(
                subject = %request.subject,
                mode = request.mode.as_str(),
                "All generated records failed validation"
            );
            return Err(GenerationError::Validation);
        }

        tracing::info!(
            subject = %request.subject,
            mode = request.mode.as_str(),
            requested = count,
            produced = questions.len(),
            "Question set generated"
        );
        Ok(questions)
    }
}

/// Plan gate: mode and timed-flag permissions plus the paper quota for
/// full-paper modes. Consumption accounting happens later, on settlement.
fn check_entitlements(
    request: &CreateSessionRequest,
    account: &AccountContext,
) -> Result<(), GenerationError> {
    let plan = account.plan;
    if !plan.allows_mode(request.mode) {
        return Err(GenerationError::PlanRestricted(format!(
            "{} sessions require a Pro or Plus plan",
            request.mode.as_str()
        )));
    }
    if request.timed && !plan.allows_timed() {
        return Err(GenerationError::PlanRestricted(
            "timed sessions require a Pro or Plus plan".to_string(),
        ));
    }
    if request.mode.is_full_paper_mode() {
        if let Some(paper_quota) = plan.monthly_paper_quota() {
            if account.usage.papers_answered_this_period >= paper_quota {
                return Err(GenerationError::PlanRestricted(format!(
                    "monthly paper allowance of {} exhausted",
                    paper_quota
                )));
            }
        }
    }
    Ok(())
}

/// Target question count for the session, capped so the account cannot
/// exceed its remaining monthly question allowance.
fn target_count(mode: ExamMode, account: &AccountContext) -> Result<u32, GenerationError> {
    let plan = account.plan;
    let nominal = if mode.is_full_paper_mode() {
        plan.paper_session_count()
    } else {
        plan.short_session_count()
    };

    let Some(question_quota) = plan.monthly_question_quota() else {
        return Ok(nominal);
    };
    let remaining =
        question_quota.saturating_sub(account.usage.questions_answered_this_period);
    if remaining == 0 {
        return Err(GenerationError::PlanRestricted(format!(
            "monthly question allowance of {} exhausted",
            question_quota
        )));
    }
    Ok(nominal.min(remaining))
}

fn build_generation_request(
    subject: &str,
    topic: Option<&str>,
    medium: Medium,
    mode: ExamMode,
    count: u32,
) -> GenerationRequest {
    GenerationRequest {
        system_directive: system_directive(subject, medium, &style_directive(mode, topic)),
        prompt: format!(
            "Generate {} MCQ questions for SL A/L {} in {} language. Return only valid JSON.",
            count,
            subject,
            medium.as_str()
        ),
        count,
    }
}

fn style_directive(mode: ExamMode, topic: Option<&str>) -> String {
    match mode {
        ExamMode::Past => "The questions should mimic the style, difficulty, and structure of \
            real Sri Lankan A/L past papers from previous years (2010-2023). Focus on common \
            repeating patterns."
            .to_string(),
        ExamMode::Model => "Generate challenging 'Model Paper' style questions that test deep \
            application of theories, similar to those found in elite school model papers or \
            high-difficulty trial exams."
            .to_string(),
        ExamMode::Topic => format!(
            "Focus EXCLUSIVELY on the topic: \"{}\". Do not include questions from other units.",
            topic.unwrap_or("general")
        ),
        ExamMode::Quick => String::new(),
    }
}

fn system_directive(subject: &str, medium: Medium, specialization: &str) -> String {
    format!(
        "You are an expert Sri Lankan Advanced Level (A/L) examiner. \
         Generate high-quality multiple choice questions (MCQs) for the subject: {subject}. \
         The questions must be strictly based on the Sri Lankan Ministry of Education teacher \
         guides and syllabus. \
         Language: {medium}. \
         {specialization} \
         For each question, provide 5 options (common for SL A/L), the index of the correct \
         answer, and a detailed explanation. \
         Ensure the tone and technical terms are accurate for the {medium} medium SL A/L \
         curriculum.",
        subject = subject,
        medium = medium.as_str(),
        specialization = specialization,
    )
}
