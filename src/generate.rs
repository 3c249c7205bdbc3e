//! Top-level quiz generation entry points.
//!
//! The pipeline is strictly sequential — each stage consumes the previous
//! stage's output:
//!
//! 1. extract text from the document ([`crate::pipeline::extract`])
//! 2. stage 1: prompt the model for the quiz, retry/timeout per config
//! 3. validate the reply into records ([`crate::pipeline::parse`])
//! 4. stage 2: prompt the model for a review of the quiz
//!
//! Stage 1 short-circuits the whole request on failure; stage 2 degrades to
//! a quiz without a review, recording a [`QuizWarning::ReviewFailed`]. No
//! state is shared across invocations, so dropping the returned future
//! cancels an in-flight run cleanly.

use crate::config::QuizConfig;
use crate::error::{McqGenError, QuizWarning};
use crate::output::{McqRecord, QuizOutput, UsageStats};
use crate::pipeline::llm::{
    chat_with_retry, estimate_cost_usd, CallFailure, ChatModel, ProviderModel,
};
use crate::pipeline::{extract, parse};
use crate::prompts;
use crate::schema::SchemaHint;
use edgequake_llm::ProviderFactory;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Parameters of one quiz-generation request.
///
/// Immutable once constructed; [`QuizRequest::new`] rejects values that
/// violate the pipeline contract.
#[derive(Debug, Clone)]
pub struct QuizRequest {
    text: String,
    count: usize,
    subject: String,
    tone: String,
}

impl QuizRequest {
    /// Build a request, validating the contract: non-empty source text,
    /// `count > 0`, non-empty subject.
    pub fn new(
        text: impl Into<String>,
        count: usize,
        subject: impl Into<String>,
        tone: impl Into<String>,
    ) -> Result<Self, McqGenError> {
        let text = text.into();
        let subject = subject.into();
        let tone = tone.into();

        if text.trim().is_empty() {
            return Err(McqGenError::InvalidRequest(
                "source text must not be empty".into(),
            ));
        }
        if count == 0 {
            return Err(McqGenError::InvalidRequest(
                "question count must be at least 1".into(),
            ));
        }
        if subject.trim().is_empty() {
            return Err(McqGenError::InvalidRequest(
                "subject must not be empty".into(),
            ));
        }

        Ok(Self {
            text,
            count,
            subject,
            tone,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn tone(&self) -> &str {
        &self.tone
    }
}

/// Generate a quiz from already-extracted text.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(QuizOutput)` on success, possibly degraded (check `output.warnings`
/// for a failed review pass or schema-hint fallback).
///
/// # Errors
/// Returns `Err(McqGenError)` only for fatal errors: no model configured,
/// the generation call failed or timed out, or the reply did not validate
/// as a quiz.
pub async fn generate(
    request: &QuizRequest,
    config: &QuizConfig,
) -> Result<QuizOutput, McqGenError> {
    let model = resolve_model(config)?;
    info!(
        "Generating {} MCQs on '{}' ({} tone) with {}",
        request.count,
        request.subject,
        request.tone,
        model.model_id()
    );

    let mut warnings: Vec<QuizWarning> = Vec::new();
    let schema = match &config.schema_hint {
        Some(hint) => hint.clone(),
        None => {
            warnings.push(QuizWarning::SchemaHintMissing {
                detail: "no schema hint configured".into(),
            });
            SchemaHint::default()
        }
    };

    // ── Stage 1: generate ────────────────────────────────────────────────
    let system_prompt = config
        .quiz_prompt_override
        .as_deref()
        .unwrap_or(prompts::QUIZ_SYSTEM_PROMPT);
    let user_prompt = prompts::quiz_user_prompt(request, schema.as_json());

    let generation = chat_with_retry(&model, "generation", system_prompt, &user_prompt, config)
        .await
        .map_err(|failure| match failure {
            CallFailure::TimedOut { secs } => McqGenError::ApiTimeout {
                stage: "generation",
                secs,
            },
            CallFailure::Api { retries, detail } => {
                McqGenError::GenerationFailed { retries, detail }
            }
        })?;

    let mut stats = UsageStats {
        prompt_tokens: generation.prompt_tokens,
        completion_tokens: generation.completion_tokens,
        calls: 1,
        estimated_cost_usd: 0.0,
    };

    let quiz = parse::parse_quiz(&generation.content)?;
    if quiz.len() != request.count {
        warn!(
            "Model returned {} questions, requested {}",
            quiz.len(),
            request.count
        );
        warnings.push(QuizWarning::CountMismatch {
            requested: request.count,
            got: quiz.len(),
        });
    }

    // ── Stage 2: review (degrades on failure) ────────────────────────────
    let review = if config.review {
        let review_prompt = prompts::review_user_prompt(
            &request.subject,
            &quiz_json(&quiz),
            config.review_word_budget,
        );
        match chat_with_retry(
            &model,
            "review",
            prompts::REVIEW_SYSTEM_PROMPT,
            &review_prompt,
            config,
        )
        .await
        {
            Ok(reply) => {
                stats.prompt_tokens += reply.prompt_tokens;
                stats.completion_tokens += reply.completion_tokens;
                stats.calls += 1;
                let text = reply.content.trim().to_string();
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            Err(failure) => {
                warn!("Review pass failed, returning quiz without review");
                warnings.push(QuizWarning::ReviewFailed {
                    detail: failure.detail(),
                });
                None
            }
        }
    } else {
        None
    };

    stats.estimated_cost_usd = estimate_cost_usd(
        model.model_id(),
        stats.prompt_tokens,
        stats.completion_tokens,
    );

    if let Some(counters) = &config.counters {
        counters.record_run(quiz.len() as u64);
    }
    info!(
        "Quiz complete: {} questions, {} tokens, ~${:.4}",
        quiz.len(),
        stats.total_tokens(),
        stats.estimated_cost_usd
    );

    Ok(QuizOutput {
        quiz,
        review,
        warnings,
        stats,
    })
}

/// Generate a quiz from an in-memory document (extraction + [`generate`]).
pub async fn generate_from_document(
    document: &extract::SourceDocument,
    count: usize,
    subject: &str,
    tone: &str,
    config: &QuizConfig,
) -> Result<QuizOutput, McqGenError> {
    let text = extract::extract(document)?;
    let request = QuizRequest::new(text, count, subject, tone)?;
    generate(&request, config).await
}

/// Generate a quiz from a document on disk.
///
/// The format is inferred from the file extension and magic bytes.
pub async fn generate_from_path(
    path: impl AsRef<Path>,
    count: usize,
    subject: &str,
    tone: &str,
    config: &QuizConfig,
) -> Result<QuizOutput, McqGenError> {
    let document = extract::SourceDocument::from_path(path)?;
    generate_from_document(&document, count, subject, tone, config).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    request: &QuizRequest,
    config: &QuizConfig,
) -> Result<QuizOutput, McqGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| McqGenError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(generate(request, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Serialise validated records back into the index-keyed JSON shape for the
/// review prompt, so the reviewer sees exactly the structure the quiz
/// contract defines rather than the model's raw (possibly fenced) reply.
fn quiz_json(quiz: &[McqRecord]) -> String {
    let mut map = serde_json::Map::new();
    for (i, record) in quiz.iter().enumerate() {
        map.insert(
            (i + 1).to_string(),
            serde_json::json!({
                "mcq": record.question,
                "options": record.options,
                "correct": record.correct,
            }),
        );
    }
    serde_json::Value::Object(map).to_string()
}

/// Resolve the chat model, from most-specific to least-specific.
///
/// The fallback chain lets library users and CLI users each set exactly as
/// much or as little as they need:
///
/// 1. **Pre-built model** (`config.chat_model`) — the caller constructed it
///    entirely; used as-is. This is also the mock injection point in tests.
///
/// 2. **Named provider + model** (`config.provider_name`) — reads the
///    corresponding API key (`OPENAI_API_KEY`, etc.) from the environment.
///
/// 3. **Environment pair** (`MCQGEN_LLM_PROVIDER` + `MCQGEN_MODEL`) — a
///    provider/model choice made at the execution-environment level.
///
/// 4. **OpenAI key present** — defaults to OpenAI so users with multiple
///    provider keys get a predictable choice.
///
/// 5. **Full auto-detection** (`ProviderFactory::from_env`) — scans all
///    known API-key variables and picks the first available provider.
fn resolve_model(config: &QuizConfig) -> Result<Arc<dyn ChatModel>, McqGenError> {
    if let Some(model) = &config.chat_model {
        return Ok(Arc::clone(model));
    }

    let model_id = config.model.as_deref().unwrap_or("gpt-4.1-nano");

    if let Some(name) = &config.provider_name {
        return create_provider_model(name, model_id);
    }

    if let (Ok(provider), Ok(model)) = (
        std::env::var("MCQGEN_LLM_PROVIDER"),
        std::env::var("MCQGEN_MODEL"),
    ) {
        if !provider.is_empty() && !model.is_empty() {
            return create_provider_model(&provider, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider_model("openai", model_id);
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| McqGenError::ModelNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                 Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                 Error: {e}"
            ),
        })?;

    Ok(Arc::new(ProviderModel::new(provider, model_id)))
}

/// Instantiate a named provider with the given model behind the seam trait.
fn create_provider_model(
    provider_name: &str,
    model_id: &str,
) -> Result<Arc<dyn ChatModel>, McqGenError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model_id).map_err(|e| {
        McqGenError::ModelNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderModel::new(provider, model_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_rejects_zero_count() {
        let err = QuizRequest::new("text", 0, "Biology", "Simple").unwrap_err();
        assert!(matches!(err, McqGenError::InvalidRequest(_)));
    }

    #[test]
    fn request_rejects_blank_subject() {
        let err = QuizRequest::new("text", 5, "  ", "Simple").unwrap_err();
        assert!(matches!(err, McqGenError::InvalidRequest(_)));
    }

    #[test]
    fn request_rejects_empty_text() {
        let err = QuizRequest::new("", 5, "Biology", "Simple").unwrap_err();
        assert!(matches!(err, McqGenError::InvalidRequest(_)));
    }

    #[test]
    fn quiz_json_round_trips_through_parser() {
        let quiz = crate::pipeline::parse::parse_quiz(
            r#"{"1": {"mcq": "Q?", "options": {"a": "x", "b": "y"}, "correct": "a"}}"#,
        )
        .unwrap();
        let rendered = quiz_json(&quiz);
        let reparsed = crate::pipeline::parse::parse_quiz(&rendered).unwrap();
        assert_eq!(quiz, reparsed);
    }
}
