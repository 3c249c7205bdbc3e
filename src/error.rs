//! Error types for the mcqgen library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`McqGenError`] — **Fatal**: the request cannot produce a quiz at all
//!   (unreadable input, no model configured, stage-1 generation failed,
//!   malformed quiz payload). Returned as `Err(McqGenError)` from the
//!   top-level `generate*` functions.
//!
//! * [`QuizWarning`] — **Non-fatal**: something degraded but the quiz is
//!   still usable (review pass failed, schema hint missing, question count
//!   drifted). Stored inside [`crate::output::QuizOutput`] so callers can
//!   inspect degraded results rather than losing a whole quiz to a failed
//!   review pass.
//!
//! The separation mirrors the two-stage contract: stage 1 (generate) is
//! load-bearing and short-circuits; stage 2 (review) degrades.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mcqgen library.
///
/// Review-stage and configuration degradations use [`QuizWarning`] and are
/// stored in [`crate::output::QuizOutput`] rather than propagated here.
#[derive(Debug, Error)]
pub enum McqGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Text extraction from the document failed.
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// Request parameters violate the pipeline contract.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No chat model could be resolved (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ModelNotConfigured { provider: String, hint: String },

    /// The generation call failed after all retries.
    #[error("Quiz generation failed after {retries} retries: {detail}")]
    GenerationFailed { retries: u32, detail: String },

    /// An LLM call exceeded the per-call timeout.
    #[error("LLM call timed out after {secs}s during {stage}")]
    ApiTimeout { stage: &'static str, secs: u64 },

    /// The model replied, but the reply does not validate as a quiz.
    #[error("Malformed quiz response: {detail}")]
    MalformedQuizResponse { detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the CSV export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialisation failed.
    #[error("CSV export failed: {0}")]
    CsvExport(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from the text-extraction stage.
///
/// Kept separate from [`McqGenError`] so the extractor can be used on its
/// own; the pipeline wraps it via `McqGenError::Extraction`.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The declared document format is not one of the supported kinds.
    #[error("Unsupported document format: '{format}' (supported: pdf, text)")]
    UnsupportedFormat { format: String },

    /// A `text` document whose bytes are not valid UTF-8.
    #[error("Document is not valid UTF-8 text: {detail}")]
    DecodeError { detail: String },

    /// The PDF could not be parsed at all.
    #[error("PDF text extraction failed: {detail}")]
    PdfParse { detail: String },

    /// The document decoded cleanly but contains no extractable characters.
    #[error("Document contains no extractable text")]
    EmptyDocument,
}

/// A non-fatal degradation recorded on [`crate::output::QuizOutput`].
///
/// The quiz itself is intact when any of these are present.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum QuizWarning {
    /// The review pass (stage 2) failed; the quiz is returned without a review.
    #[error("Review pass failed: {detail}")]
    ReviewFailed { detail: String },

    /// No response-schema hint was available; the built-in default shape was used.
    #[error("Schema hint unavailable ({detail}); using built-in default")]
    SchemaHintMissing { detail: String },

    /// The model returned a different number of questions than requested.
    #[error("Model returned {got} questions, expected {requested}")]
    CountMismatch { requested: usize, got: usize },
}
