//! Configuration types for quiz generation.
//!
//! All pipeline behaviour is controlled through [`QuizConfig`], built via its
//! [`QuizConfigBuilder`]. Callers set only what they care about and rely on
//! the documented defaults for the rest.

use crate::error::McqGenError;
use crate::pipeline::llm::ChatModel;
use crate::schema::SchemaHint;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Configuration for a quiz-generation run.
///
/// Built via [`QuizConfig::builder()`] or using [`QuizConfig::default()`].
///
/// # Example
/// ```rust
/// use mcqgen::QuizConfig;
///
/// let config = QuizConfig::builder()
///     .model("gpt-4.1-nano")
///     .temperature(0.5)
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct QuizConfig {
    /// LLM model identifier, e.g. "gpt-4.1-nano", "claude-sonnet-4-20250514".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `chat_model`, the provider is auto-detected from
    /// the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed chat model. Takes precedence over `provider_name`.
    /// This is the injection point for mock models in tests.
    pub chat_model: Option<Arc<dyn ChatModel>>,

    /// Sampling temperature for both LLM calls. Default: 0.3.
    ///
    /// Low-but-nonzero: the quiz should stay faithful to the source text,
    /// yet identical distractors across runs help nobody.
    pub temperature: f32,

    /// Maximum tokens the model may generate per call. Default: 4096.
    ///
    /// A 50-question quiz with four options each runs well past 2 000 output
    /// tokens; setting this too low silently truncates the JSON mid-object
    /// and surfaces as a malformed-response error.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent errors (bad API
    /// key, 400) still burn the retries but surface with the provider's own
    /// message attached.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Per-LLM-call timeout in seconds. Default: 60.
    ///
    /// Applies independently to the generation and review calls. A timeout
    /// in stage 1 is fatal; in stage 2 it degrades to a missing review.
    pub api_timeout_secs: u64,

    /// Run the review pass (stage 2). Default: true.
    pub review: bool,

    /// Word budget the review prompt imposes on the model. Default: 50.
    pub review_word_budget: usize,

    /// Response-schema hint spliced into the generation prompt.
    /// If None, the built-in default shape is used and a
    /// [`crate::QuizWarning::SchemaHintMissing`] is recorded.
    pub schema_hint: Option<SchemaHint>,

    /// Custom generation system prompt. If None, uses the built-in default.
    pub quiz_prompt_override: Option<String>,

    /// Caller-supplied usage counters, bumped after each successful run.
    /// Purely cosmetic; the pipeline itself is stateless.
    pub counters: Option<Arc<RunCounters>>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            chat_model: None,
            temperature: 0.3,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            review: true,
            review_word_budget: 50,
            schema_hint: None,
            quiz_prompt_override: None,
            counters: None,
        }
    }
}

impl fmt::Debug for QuizConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("chat_model", &self.chat_model.as_ref().map(|_| "<dyn ChatModel>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("review", &self.review)
            .field("review_word_budget", &self.review_word_budget)
            .finish()
    }
}

impl QuizConfig {
    /// Create a new builder for `QuizConfig`.
    pub fn builder() -> QuizConfigBuilder {
        QuizConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`QuizConfig`].
#[derive(Debug)]
pub struct QuizConfigBuilder {
    config: QuizConfig,
}

impl QuizConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn chat_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.config.chat_model = Some(model);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn review(mut self, v: bool) -> Self {
        self.config.review = v;
        self
    }

    pub fn review_word_budget(mut self, words: usize) -> Self {
        self.config.review_word_budget = words;
        self
    }

    pub fn schema_hint(mut self, hint: SchemaHint) -> Self {
        self.config.schema_hint = Some(hint);
        self
    }

    pub fn quiz_prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.config.quiz_prompt_override = Some(prompt.into());
        self
    }

    pub fn counters(mut self, counters: Arc<RunCounters>) -> Self {
        self.config.counters = Some(counters);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<QuizConfig, McqGenError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(McqGenError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.review_word_budget == 0 {
            return Err(McqGenError::InvalidConfig(
                "review_word_budget must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Caller-owned usage counters, bumped by the pipeline after each
/// successful run.
///
/// These replace the mutable session totals a front end would otherwise keep
/// itself: the caller owns the `Arc`, the pipeline only increments. Atomics
/// because a host application may run generations concurrently.
#[derive(Debug, Default)]
pub struct RunCounters {
    mcqs_generated: AtomicU64,
    documents_processed: AtomicU64,
}

impl RunCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn record_run(&self, mcqs: u64) {
        self.mcqs_generated.fetch_add(mcqs, Ordering::Relaxed);
        self.documents_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Total MCQs generated across all runs observed by this counter.
    pub fn mcqs_generated(&self) -> u64 {
        self.mcqs_generated.load(Ordering::Relaxed)
    }

    /// Total documents processed across all runs observed by this counter.
    pub fn documents_processed(&self) -> u64 {
        self.documents_processed.load(Ordering::Relaxed)
    }
}
