//! Response-schema hint: the JSON shape the model is asked to reproduce.
//!
//! The generation prompt embeds an example JSON object so the model knows
//! exactly how to key its reply (question index → question object). The
//! example can be customised by loading a JSON file at startup; when the
//! file is missing or unparseable the pipeline falls back to the built-in
//! default shape and records a [`QuizWarning::SchemaHintMissing`] rather
//! than failing the run — a cosmetic config problem must not block quiz
//! generation.

use crate::error::QuizWarning;
use std::path::Path;

/// Built-in default reply shape, used when no hint file is configured.
///
/// Mirrors the per-question contract enforced by the parser: `mcq` text,
/// an `options` map keyed by label, and a `correct` label.
const DEFAULT_SCHEMA_HINT: &str = r#"{
  "1": {
    "mcq": "multiple choice question",
    "options": {
      "a": "choice here",
      "b": "choice here",
      "c": "choice here",
      "d": "choice here"
    },
    "correct": "a"
  },
  "2": {
    "mcq": "multiple choice question",
    "options": {
      "a": "choice here",
      "b": "choice here",
      "c": "choice here",
      "d": "choice here"
    },
    "correct": "b"
  }
}"#;

/// A validated JSON snippet describing the expected per-question reply shape.
#[derive(Debug, Clone)]
pub struct SchemaHint {
    json: String,
}

impl Default for SchemaHint {
    fn default() -> Self {
        Self {
            json: DEFAULT_SCHEMA_HINT.to_string(),
        }
    }
}

impl SchemaHint {
    /// Build a hint from a JSON string, validating that it parses.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let _: serde_json::Value = serde_json::from_str(json)?;
        Ok(Self {
            json: json.to_string(),
        })
    }

    /// Load a hint file, degrading to the default shape on any failure.
    ///
    /// Returns the hint plus an optional warning describing why the default
    /// was used. Intended to be called once at startup.
    pub fn load(path: impl AsRef<Path>) -> (Self, Option<QuizWarning>) {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(hint) => (hint, None),
                Err(e) => (
                    Self::default(),
                    Some(QuizWarning::SchemaHintMissing {
                        detail: format!("'{}' is not valid JSON: {}", path.display(), e),
                    }),
                ),
            },
            Err(e) => (
                Self::default(),
                Some(QuizWarning::SchemaHintMissing {
                    detail: format!("cannot read '{}': {}", path.display(), e),
                }),
            ),
        }
    }

    /// The hint as a JSON string, ready to splice into the prompt.
    pub fn as_json(&self) -> &str {
        &self.json
    }
}
