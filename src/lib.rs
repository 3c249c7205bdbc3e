//! # mcqgen
//!
//! Generate multiple-choice quizzes from PDF and text documents using LLMs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Extract   PDF or plain text → one UTF-8 string
//!  ├─ 2. Generate  LLM call: N questions, subject, tone, JSON schema hint
//!  ├─ 3. Validate  untrusted reply → ordered McqRecord list
//!  ├─ 4. Review    second LLM call critiques level-appropriateness
//!  └─ 5. Export    tabular rows + CSV (MCQ, Choices, Correct)
//! ```
//!
//! Stage 2 failures are fatal; stage 4 degrades to a quiz without a review
//! (see [`QuizWarning`]). Token usage and an estimated dollar cost for both
//! calls are reported on [`QuizOutput::stats`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcqgen::{generate_from_path, QuizConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = QuizConfig::default();
//!     let output = generate_from_path("notes.pdf", 10, "Biology", "Medium", &config).await?;
//!     output.write_csv_to_file("quiz.csv")?;
//!     if let Some(review) = &output.review {
//!         eprintln!("review: {review}");
//!     }
//!     eprintln!(
//!         "tokens: {}  cost: ~${:.4}",
//!         output.stats.total_tokens(),
//!         output.stats.estimated_cost_usd
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mcqgen` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mcqgen = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod schema;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{QuizConfig, QuizConfigBuilder, RunCounters};
pub use error::{ExtractError, McqGenError, QuizWarning};
pub use generate::{
    generate, generate_from_document, generate_from_path, generate_sync, QuizRequest,
};
pub use output::{McqRecord, QuizOutput, TabularRow, UsageStats};
pub use pipeline::extract::{extract, DocumentFormat, SourceDocument};
pub use pipeline::llm::{ChatModel, ChatOptions, ChatReply, ModelError};
pub use pipeline::parse::parse_quiz;
pub use schema::SchemaHint;
