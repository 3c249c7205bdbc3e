//! Quiz response parsing: validate the model's JSON reply into records.
//!
//! LLM replies are untrusted input. Even a well-prompted model occasionally
//! wraps its JSON in code fences, drops a field, or marks a correct label
//! that is not among the options. This module is the strictness boundary:
//! everything downstream ([`crate::output`]) may assume
//! [`crate::output::McqRecord`] invariants hold, because nothing gets past
//! here without them.
//!
//! Validation fails fast at the first malformed field, naming the question
//! index and field in the error, rather than accumulating a report — a
//! malformed quiz is regenerated wholesale, so a full error list buys
//! nothing.

use crate::error::McqGenError;
use crate::output::McqRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Per-question payload as the model emits it.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    mcq: String,
    options: BTreeMap<String, String>,
    correct: String,
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n(.*)\n```\s*$").unwrap());

/// Strip a wrapping ```json fence, if present.
///
/// Models routinely disobey "reply with only JSON" and fence their output;
/// the content inside is usually fine, so unwrap rather than reject.
fn strip_json_fences(input: &str) -> &str {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps.get(1).map_or(input, |m| m.as_str()),
        None => input.trim(),
    }
}

/// Parse and validate a generation reply into ordered MCQ records.
///
/// The top level must be a JSON object keyed by question index; records are
/// returned in ascending index order (generation order, meaningful for
/// numbering). Every violation of the record invariants —
/// missing/empty question text, fewer than two options, a correct label not
/// among the option keys — is a fatal
/// [`McqGenError::MalformedQuizResponse`]. No partial quiz is ever returned.
pub fn parse_quiz(raw: &str) -> Result<Vec<McqRecord>, McqGenError> {
    let body = strip_json_fences(raw);

    let questions: BTreeMap<String, RawQuestion> =
        serde_json::from_str(body).map_err(|e| McqGenError::MalformedQuizResponse {
            detail: format!("reply is not a JSON object of questions: {e}"),
        })?;

    // BTreeMap orders keys lexicographically ("10" < "2"); re-key numerically.
    let mut indexed: Vec<(u64, RawQuestion)> = Vec::with_capacity(questions.len());
    for (key, question) in questions {
        let index: u64 = key
            .trim()
            .parse()
            .map_err(|_| McqGenError::MalformedQuizResponse {
                detail: format!("question key '{key}' is not a numeric index"),
            })?;
        indexed.push((index, question));
    }
    indexed.sort_by_key(|(index, _)| *index);

    indexed
        .into_iter()
        .map(|(index, raw)| validate_question(index, raw))
        .collect()
}

fn validate_question(index: u64, raw: RawQuestion) -> Result<McqRecord, McqGenError> {
    if raw.mcq.trim().is_empty() {
        return Err(McqGenError::MalformedQuizResponse {
            detail: format!("question {index}: 'mcq' text is empty"),
        });
    }
    if raw.options.len() < 2 {
        return Err(McqGenError::MalformedQuizResponse {
            detail: format!(
                "question {index}: needs at least 2 options, got {}",
                raw.options.len()
            ),
        });
    }

    let correct = raw.correct.trim().to_string();
    if !raw.options.contains_key(&correct) {
        return Err(McqGenError::MalformedQuizResponse {
            detail: format!(
                "question {index}: correct label '{correct}' is not among the options ({})",
                raw.options.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        });
    }

    Ok(McqRecord {
        question: raw.mcq.trim().to_string(),
        options: raw.options,
        correct,
    })
}
