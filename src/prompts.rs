//! Prompt templates for the two LLM passes.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the generation rules or the
//!    review word budget requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the rendered prompts directly
//!    without spinning up a real model, making prompt regressions easy to
//!    catch.
//!
//! Callers can override the generation system prompt via
//! [`crate::config::QuizConfig::quiz_prompt_override`]; the constants here
//! are used only when no override is provided.

use crate::generate::QuizRequest;

/// Default system prompt for the generation pass (stage 1).
///
/// Used when `QuizConfig::quiz_prompt_override` is `None`.
pub const QUIZ_SYSTEM_PROMPT: &str = r#"You are an expert multiple-choice question maker.

Follow these rules precisely:

1. QUESTIONS
   - Every question must be answerable from the provided text alone
   - Do not repeat questions and do not trivially rephrase one question as another
   - Each question has exactly one correct option

2. OPTIONS
   - Label options with lowercase letters: a, b, c, d
   - Distractors must be plausible but clearly wrong given the text
   - The "correct" field must contain the label of the correct option, nothing else

3. OUTPUT FORMAT
   - Reply with ONLY a JSON object, no prose before or after
   - Do NOT wrap the JSON in ``` fences
   - Key the object by question number ("1", "2", ...) exactly like the
     RESPONSE_JSON example in the user message"#;

/// System prompt for the review pass (stage 2).
pub const REVIEW_SYSTEM_PROMPT: &str = "You are an expert teacher and writer who evaluates \
whether quiz questions match the cognitive level of their intended students. Reply with plain \
prose only.";

/// Build the user message for the generation pass.
///
/// Embeds the source text, the requested count/subject/tone, and the
/// response-schema hint the model must imitate.
pub fn quiz_user_prompt(request: &QuizRequest, schema_json: &str) -> String {
    format!(
        "Text:\n{text}\n\n\
         Given the text above, create a quiz of {count} multiple choice questions \
         for {subject} students in a {tone} tone. \
         Check that every question conforms to the text and that none are repeated. \
         Format your response exactly like the RESPONSE_JSON below and use it as a guide. \
         Ensure you create exactly {count} questions.\n\n\
         ### RESPONSE_JSON\n{schema}",
        text = request.text(),
        count = request.count(),
        subject = request.subject(),
        tone = request.tone(),
        schema = schema_json,
    )
}

/// Build the user message for the review pass.
///
/// The stage-1 quiz JSON is quoted verbatim; the model is asked for a short
/// complexity analysis capped at `word_budget` words.
pub fn review_user_prompt(subject: &str, quiz_json: &str, word_budget: usize) -> String {
    format!(
        "Below is a multiple choice quiz generated for {subject} students. \
         Evaluate whether the complexity of the questions matches the cognitive and \
         analytical abilities of those students, and give a complete analysis of the quiz. \
         Use at most {word_budget} words. If any question is not at par with the students' \
         level, say which and how its tone should change.\n\n\
         Quiz_MCQs:\n{quiz}",
        subject = subject,
        word_budget = word_budget,
        quiz = quiz_json,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QuizRequest {
        QuizRequest::new("The sun is a star.", 3, "Astronomy", "Simple").unwrap()
    }

    #[test]
    fn quiz_prompt_embeds_all_parameters() {
        let p = quiz_user_prompt(&request(), r#"{"1": {}}"#);
        assert!(p.contains("The sun is a star."));
        assert!(p.contains("3 multiple choice questions"));
        assert!(p.contains("Astronomy students"));
        assert!(p.contains("Simple tone"));
        assert!(p.contains("### RESPONSE_JSON"));
    }

    #[test]
    fn review_prompt_caps_word_budget() {
        let p = review_user_prompt("Biology", "{}", 50);
        assert!(p.contains("at most 50 words"));
        assert!(p.contains("Biology students"));
    }
}
