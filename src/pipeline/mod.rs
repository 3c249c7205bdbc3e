//! Pipeline stages for document-to-quiz generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different extraction backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ llm (generate) ──▶ parse ──▶ llm (review)
//! (pdf/text)  (stage 1, fatal)  (validate) (stage 2, degrades)
//! ```
//!
//! 1. [`extract`] — decode PDF or plain-text bytes into a single UTF-8 string
//! 2. [`llm`]     — the chat-model seam with retry/backoff and per-call
//!    timeouts; the only stage with network I/O
//! 3. [`parse`]   — validate the generation reply into MCQ records; the
//!    strictness boundary for untrusted model output

pub mod extract;
pub mod llm;
pub mod parse;
