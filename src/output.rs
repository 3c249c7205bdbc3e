//! Output types: validated quiz records, tabular reshaping, and CSV export.
//!
//! Everything in this module is downstream of the parser's strictness
//! boundary: an [`McqRecord`] here always satisfies its invariants (≥ 2
//! options, correct label present among them), so the reshaping into
//! [`TabularRow`] is a pure, total function. Rows are display/export
//! artefacts only — they are never read back into records.

use crate::error::{McqGenError, QuizWarning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// A single validated multiple-choice question.
///
/// Invariants (enforced by [`crate::pipeline::parse::parse_quiz`]):
/// `options` has at least 2 entries and `correct` equals one of its keys.
/// A `BTreeMap` keeps option labels in stable a→d order for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqRecord {
    /// Question text.
    pub question: String,
    /// Option label → option text.
    pub options: BTreeMap<String, String>,
    /// Label of the correct option; always a key of `options`.
    pub correct: String,
}

/// One display/export row derived from an [`McqRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabularRow {
    /// 1-based sequence position within the quiz.
    pub index: usize,
    /// Question text.
    pub mcq: String,
    /// Options formatted as `label: text` pairs joined with `" | "`.
    pub choices: String,
    /// Correct option label.
    pub correct: String,
}

impl TabularRow {
    /// Derive a row from a record. Total for any valid record.
    pub fn from_record(index: usize, record: &McqRecord) -> Self {
        let choices = record
            .options
            .iter()
            .map(|(label, text)| format!("{label}: {text}"))
            .collect::<Vec<_>>()
            .join(" | ");

        Self {
            index,
            mcq: record.question.clone(),
            choices,
            correct: record.correct.clone(),
        }
    }
}

/// Token usage and estimated cost of all LLM calls in one run.
///
/// Display-only; not part of the quiz data model. Cost is estimated from a
/// built-in price table and reads 0.0 for unknown models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageStats {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    /// Number of LLM calls made (1 without review, 2 with).
    pub calls: u32,
    pub estimated_cost_usd: f64,
}

impl UsageStats {
    /// Total tokens across both directions.
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// The result of a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOutput {
    /// Validated questions in generation order.
    pub quiz: Vec<McqRecord>,
    /// Free-form critique from the review pass; `None` when the review was
    /// disabled or failed (see `warnings`).
    pub review: Option<String>,
    /// Non-fatal degradations recorded during the run.
    pub warnings: Vec<QuizWarning>,
    /// Token/cost accounting for both LLM calls.
    pub stats: UsageStats,
}

impl QuizOutput {
    /// Reshape the quiz into 1-indexed display rows.
    pub fn rows(&self) -> Vec<TabularRow> {
        self.quiz
            .iter()
            .enumerate()
            .map(|(i, record)| TabularRow::from_record(i + 1, record))
            .collect()
    }

    /// Write the quiz as CSV: header `MCQ,Choices,Correct`, one line per
    /// question, no index column. Quoting/escaping per standard CSV rules.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), McqGenError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer
            .write_record(["MCQ", "Choices", "Correct"])
            .map_err(|e| McqGenError::CsvExport(e.to_string()))?;

        for row in self.rows() {
            csv_writer
                .write_record([&row.mcq, &row.choices, &row.correct])
                .map_err(|e| McqGenError::CsvExport(e.to_string()))?;
        }
        csv_writer
            .flush()
            .map_err(|e| McqGenError::CsvExport(e.to_string()))?;
        Ok(())
    }

    /// The CSV export as an in-memory string.
    pub fn csv_string(&self) -> Result<String, McqGenError> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| McqGenError::Internal(e.to_string()))
    }

    /// Write the CSV export to a file.
    ///
    /// Uses atomic write (temp file + rename) to prevent partial files.
    pub fn write_csv_to_file(&self, path: impl AsRef<Path>) -> Result<(), McqGenError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| McqGenError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let tmp_path = path.with_extension("csv.tmp");
        let contents = self.csv_string()?;
        std::fs::write(&tmp_path, contents).map_err(|e| McqGenError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, path).map_err(|e| McqGenError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(question: &str) -> McqRecord {
        let mut options = BTreeMap::new();
        options.insert("a".to_string(), "alpha".to_string());
        options.insert("b".to_string(), "beta".to_string());
        options.insert("c".to_string(), "gamma".to_string());
        McqRecord {
            question: question.to_string(),
            options,
            correct: "c".to_string(),
        }
    }

    fn output(n: usize) -> QuizOutput {
        QuizOutput {
            quiz: (1..=n).map(|i| record(&format!("Question {i}?"))).collect(),
            review: None,
            warnings: vec![],
            stats: UsageStats::default(),
        }
    }

    #[test]
    fn rows_are_one_indexed_in_order() {
        let rows = output(3).rows();
        assert_eq!(rows[0].index, 1);
        assert_eq!(rows[2].index, 3);
        assert_eq!(rows[1].mcq, "Question 2?");
    }

    #[test]
    fn choices_format_pairs_labels_with_text() {
        let rows = output(1).rows();
        assert_eq!(rows[0].choices, "a: alpha | b: beta | c: gamma");
    }

    #[test]
    fn row_correct_always_among_source_options() {
        let out = output(5);
        for row in out.rows() {
            let source = &out.quiz[row.index - 1];
            assert!(source.options.contains_key(&row.correct));
        }
    }

    #[test]
    fn csv_has_header_plus_one_line_per_row() {
        let csv = output(4).csv_string().unwrap();
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "MCQ,Choices,Correct");
    }

    #[test]
    fn csv_column_count_is_stable() {
        let csv = output(3).csv_string().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        for result in reader.records() {
            assert_eq!(result.unwrap().len(), 3);
        }
    }

    #[test]
    fn csv_quotes_embedded_commas_and_newlines() {
        let mut out = output(1);
        out.quiz[0].question = "Which is larger, the Sun\nor the Moon?".to_string();
        let csv = out.csv_string().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let first = reader.records().next().unwrap().unwrap();
        assert_eq!(&first[0], "Which is larger, the Sun\nor the Moon?");
    }

    #[test]
    fn csv_file_write_is_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.csv");
        output(2).write_csv_to_file(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("MCQ,Choices,Correct"));
        assert!(!path.with_extension("csv.tmp").exists());
    }
}
