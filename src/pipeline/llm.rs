//! LLM interaction: the chat-model seam, retry/backoff, and cost estimation.
//!
//! The pipeline never talks to a provider SDK directly; it talks to the
//! [`ChatModel`] trait. Production code adapts an
//! [`edgequake_llm::LLMProvider`] behind it, tests substitute a mock. All
//! prompt engineering lives in [`crate::prompts`] so it can be changed
//! without touching the retry or error-handling logic here.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient and frequent.
//! Exponential backoff (`retry_backoff_ms * 2^(attempt-1)`) avoids hammering a
//! recovering endpoint: with a 500 ms base and 3 retries the wait sequence
//! is 500 ms → 1 s → 2 s, totalling < 4 s of back-off per call. Each
//! attempt additionally runs under a `tokio::time::timeout` so a hung
//! connection cannot stall the request forever.

use crate::config::QuizConfig;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use thiserror::Error;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Sampling options for a single chat call.
#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
    pub max_tokens: usize,
}

/// A completed chat call: the reply text plus token accounting.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Error from a single chat attempt. Carries only the provider's message;
/// classification (retry, abort, degrade) happens in the caller.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// The seam between the pipeline and any chat-completion backend.
///
/// One system turn, one user turn, one reply — both pipeline stages fit this
/// shape, so the trait stays minimal. `Send + Sync` because a host
/// application may share one model across concurrent requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system+user exchange and return the reply.
    async fn chat(
        &self,
        system: &str,
        user: &str,
        options: &ChatOptions,
    ) -> Result<ChatReply, ModelError>;

    /// Model identifier used for logging and cost estimation.
    fn model_id(&self) -> &str;
}

/// [`ChatModel`] implementation backed by an `edgequake_llm` provider.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    model_id: String,
}

impl ProviderModel {
    pub fn new(provider: Arc<dyn LLMProvider>, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl ChatModel for ProviderModel {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        options: &ChatOptions,
    ) -> Result<ChatReply, ModelError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let completion_options = CompletionOptions {
            temperature: Some(options.temperature),
            max_tokens: Some(options.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&completion_options))
            .await
            .map_err(|e| ModelError(e.to_string()))?;

        Ok(ChatReply {
            content: response.content,
            prompt_tokens: response.prompt_tokens as u64,
            completion_tokens: response.completion_tokens as u64,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Drive one chat exchange with per-attempt timeout and exponential backoff.
///
/// Returns the reply of the first successful attempt, or the last failure
/// once `max_retries` extra attempts are exhausted. A timed-out attempt is
/// retried like any other transient failure; [`CallFailure::TimedOut`] is
/// reported only when the final attempt also times out, so callers can map
/// it to their stage-appropriate error.
pub async fn chat_with_retry(
    model: &Arc<dyn ChatModel>,
    stage: &'static str,
    system: &str,
    user: &str,
    config: &QuizConfig,
) -> Result<ChatReply, CallFailure> {
    let options = ChatOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };
    let per_call = Duration::from_secs(config.api_timeout_secs);
    let mut last_failure = CallFailure::Api {
        retries: config.max_retries,
        detail: "no attempt made".to_string(),
    };

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "{}: retry {}/{} after {}ms",
                stage, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match timeout(per_call, model.chat(system, user, &options)).await {
            Ok(Ok(reply)) => {
                debug!(
                    "{}: {} prompt tokens, {} completion tokens",
                    stage, reply.prompt_tokens, reply.completion_tokens
                );
                return Ok(reply);
            }
            Ok(Err(e)) => {
                warn!("{}: attempt {} failed — {}", stage, attempt + 1, e);
                last_failure = CallFailure::Api {
                    retries: config.max_retries,
                    detail: e.to_string(),
                };
            }
            Err(_) => {
                warn!(
                    "{}: attempt {} timed out after {}s",
                    stage,
                    attempt + 1,
                    config.api_timeout_secs
                );
                last_failure = CallFailure::TimedOut {
                    secs: config.api_timeout_secs,
                };
            }
        }
    }

    Err(last_failure)
}

/// Terminal outcome of an exhausted [`chat_with_retry`].
#[derive(Debug, Clone)]
pub enum CallFailure {
    /// The provider kept erroring; `detail` is the last message.
    Api { retries: u32, detail: String },
    /// The final attempt exceeded the per-call timeout.
    TimedOut { secs: u64 },
}

impl CallFailure {
    /// Human-readable summary, used when the failure is downgraded to a
    /// warning (review stage).
    pub fn detail(&self) -> String {
        match self {
            CallFailure::Api { detail, .. } => detail.clone(),
            CallFailure::TimedOut { secs } => format!("timed out after {secs}s"),
        }
    }
}

// ── Cost estimation ──────────────────────────────────────────────────────

/// USD per 1M input/output tokens for the models this tool is commonly run
/// with. Unknown models estimate to zero — the figure is display-only.
const MODEL_PRICES: &[(&str, f64, f64)] = &[
    ("gpt-4.1-nano", 0.10, 0.40),
    ("gpt-4.1-mini", 0.40, 1.60),
    ("gpt-4.1", 2.00, 8.00),
    ("gpt-4o", 2.50, 10.00),
    ("claude-sonnet-4-20250514", 3.00, 15.00),
    ("claude-haiku-4-20250514", 0.80, 4.00),
    ("gemini-2.0-flash", 0.10, 0.40),
    ("gemini-2.5-pro", 1.25, 10.00),
];

/// Estimate the combined cost of a run in USD.
///
/// Longest matching prefix wins so dated model IDs (e.g.
/// "gpt-4.1-mini-2025-04-14") still price correctly; "gpt-4.1" must not
/// swallow "gpt-4.1-nano".
pub fn estimate_cost_usd(model_id: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
    let price = MODEL_PRICES
        .iter()
        .filter(|(prefix, _, _)| model_id.starts_with(prefix))
        .max_by_key(|(prefix, _, _)| prefix.len());

    match price {
        Some((_, input, output)) => {
            (prompt_tokens as f64 * input + completion_tokens as f64 * output) / 1_000_000.0
        }
        None => 0.0,
    }
}
