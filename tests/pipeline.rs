//! Integration tests for the full document-to-quiz pipeline.
//!
//! Every test drives the real pipeline against a scripted mock
//! [`ChatModel`] — no live API calls, no API keys. The mock replays a
//! queue of scripted outcomes (reply, failure, or hang) so each test
//! controls exactly what "the model" does on each call.

use async_trait::async_trait;
use mcqgen::{
    generate, generate_from_path, ChatModel, ChatOptions, ChatReply, McqGenError, ModelError,
    QuizConfig, QuizRequest, QuizWarning, RunCounters, SchemaHint,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Mock model ───────────────────────────────────────────────────────────────

/// One scripted outcome for a single chat call.
enum Scripted {
    Reply(String),
    Fail(String),
    /// Never returns; used to exercise the per-call timeout.
    Hang,
}

struct MockModel {
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockModel {
    fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn recorded_prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for MockModel {
    async fn chat(
        &self,
        system: &str,
        user: &str,
        _options: &ChatOptions,
    ) -> Result<ChatReply, ModelError> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(content)) => Ok(ChatReply {
                content,
                prompt_tokens: 1000,
                completion_tokens: 500,
            }),
            Some(Scripted::Fail(detail)) => Err(ModelError(detail)),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                unreachable!("hung call should be cut off by the timeout")
            }
            None => Err(ModelError("mock script exhausted".into())),
        }
    }

    fn model_id(&self) -> &str {
        "gpt-4.1-nano"
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn quiz_reply(n: usize) -> String {
    let mut obj = serde_json::Map::new();
    for i in 1..=n {
        obj.insert(
            i.to_string(),
            serde_json::json!({
                "mcq": format!("What does statement {i} describe?"),
                "options": {
                    "a": "a planet",
                    "b": "a star",
                    "c": "a comet",
                    "d": "a moon"
                },
                "correct": "b"
            }),
        );
    }
    serde_json::Value::Object(obj).to_string()
}

fn astronomy_request(count: usize) -> QuizRequest {
    QuizRequest::new(
        "The sun is a star. It provides light and heat.",
        count,
        "Astronomy",
        "Simple",
    )
    .unwrap()
}

fn config_with(model: Arc<MockModel>) -> QuizConfig {
    QuizConfig::builder()
        .chat_model(model)
        .schema_hint(SchemaHint::default())
        .max_retries(0)
        .retry_backoff_ms(1)
        .build()
        .unwrap()
}

// ── End-to-end scenarios ─────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_three_questions_with_review() {
    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(3)),
        Scripted::Reply("Complexity fits Simple-tone Astronomy learners well.".into()),
    ]);
    let config = config_with(model.clone());

    let output = generate(&astronomy_request(3), &config).await.unwrap();

    assert_eq!(output.quiz.len(), 3);
    for record in &output.quiz {
        assert!(record.options.len() >= 2);
        assert!(record.options.contains_key(&record.correct));
    }
    assert_eq!(
        output.review.as_deref(),
        Some("Complexity fits Simple-tone Astronomy learners well.")
    );
    assert!(output.warnings.is_empty());

    // CSV: header + 3 rows = 4 lines
    let csv = output.csv_string().unwrap();
    assert_eq!(csv.trim_end().lines().count(), 4);
}

#[tokio::test]
async fn generation_prompt_carries_text_schema_and_parameters() {
    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(3)),
        Scripted::Reply("ok".into()),
    ]);
    let config = config_with(model.clone());

    generate(&astronomy_request(3), &config).await.unwrap();

    let prompts = model.recorded_prompts();
    assert_eq!(prompts.len(), 2, "one generation call, one review call");

    let (_, generation_user) = &prompts[0];
    assert!(generation_user.contains("The sun is a star."));
    assert!(generation_user.contains("3 multiple choice questions"));
    assert!(generation_user.contains("Astronomy students"));
    assert!(generation_user.contains("### RESPONSE_JSON"));

    let (_, review_user) = &prompts[1];
    assert!(review_user.contains("Astronomy students"));
    assert!(review_user.contains("at most 50 words"));
    assert!(review_user.contains("What does statement 1 describe?"));
}

#[tokio::test]
async fn desired_count_is_honoured_when_model_complies() {
    for n in [1, 5, 12] {
        let model = MockModel::new(vec![
            Scripted::Reply(quiz_reply(n)),
            Scripted::Reply("fine".into()),
        ]);
        let config = config_with(model);
        let output = generate(&astronomy_request(n), &config).await.unwrap();
        assert_eq!(output.quiz.len(), n);
        assert!(output.warnings.is_empty());
    }
}

#[tokio::test]
async fn count_drift_is_a_warning_not_an_error() {
    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(2)),
        Scripted::Reply("short quiz".into()),
    ]);
    let config = config_with(model);

    let output = generate(&astronomy_request(5), &config).await.unwrap();
    assert_eq!(output.quiz.len(), 2);
    assert!(matches!(
        output.warnings.as_slice(),
        [QuizWarning::CountMismatch {
            requested: 5,
            got: 2
        }]
    ));
}

// ── Degradation and failure paths ────────────────────────────────────────────

#[tokio::test]
async fn review_failure_degrades_to_quiz_without_review() {
    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(3)),
        Scripted::Fail("HTTP 503 from provider".into()),
    ]);
    let config = config_with(model);

    let output = generate(&astronomy_request(3), &config).await.unwrap();

    assert_eq!(output.quiz.len(), 3, "quiz must survive a failed review");
    assert!(output.review.is_none());
    assert!(matches!(
        output.warnings.as_slice(),
        [QuizWarning::ReviewFailed { .. }]
    ));
}

#[tokio::test]
async fn review_timeout_degrades_to_quiz_without_review() {
    let model = MockModel::new(vec![Scripted::Reply(quiz_reply(3)), Scripted::Hang]);
    let config = QuizConfig::builder()
        .chat_model(model)
        .schema_hint(SchemaHint::default())
        .max_retries(0)
        .api_timeout_secs(1)
        .build()
        .unwrap();

    let output = generate(&astronomy_request(3), &config).await.unwrap();

    assert_eq!(output.quiz.len(), 3);
    assert!(output.review.is_none());
    match output.warnings.as_slice() {
        [QuizWarning::ReviewFailed { detail }] => {
            assert!(detail.contains("timed out"), "got: {detail}")
        }
        other => panic!("expected ReviewFailed warning, got {other:?}"),
    }
}

#[tokio::test]
async fn generation_failure_is_fatal() {
    let model = MockModel::new(vec![Scripted::Fail("invalid api key".into())]);
    let config = config_with(model);

    let err = generate(&astronomy_request(3), &config).await.unwrap_err();
    match err {
        McqGenError::GenerationFailed { detail, .. } => {
            assert!(detail.contains("invalid api key"))
        }
        other => panic!("expected GenerationFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn generation_timeout_is_fatal() {
    let model = MockModel::new(vec![Scripted::Hang]);
    let config = QuizConfig::builder()
        .chat_model(model)
        .schema_hint(SchemaHint::default())
        .max_retries(0)
        .api_timeout_secs(1)
        .build()
        .unwrap();

    let err = generate(&astronomy_request(3), &config).await.unwrap_err();
    assert!(matches!(
        err,
        McqGenError::ApiTimeout {
            stage: "generation",
            ..
        }
    ));
}

#[tokio::test]
async fn transient_generation_failure_is_retried() {
    let model = MockModel::new(vec![
        Scripted::Fail("HTTP 429".into()),
        Scripted::Reply(quiz_reply(3)),
        Scripted::Reply("good".into()),
    ]);
    let config = QuizConfig::builder()
        .chat_model(model)
        .schema_hint(SchemaHint::default())
        .max_retries(1)
        .retry_backoff_ms(1)
        .build()
        .unwrap();

    let output = generate(&astronomy_request(3), &config).await.unwrap();
    assert_eq!(output.quiz.len(), 3);
}

#[tokio::test]
async fn malformed_reply_single_option_is_fatal_with_no_partial_rows() {
    let malformed = r#"{
        "1": {"mcq": "Only one option?", "options": {"a": "lonely"}, "correct": "a"}
    }"#;
    let model = MockModel::new(vec![Scripted::Reply(malformed.into())]);
    let config = config_with(model.clone());

    let err = generate(&astronomy_request(1), &config).await.unwrap_err();
    assert!(matches!(err, McqGenError::MalformedQuizResponse { .. }));

    // Stage 2 must never run on a malformed quiz.
    assert_eq!(model.recorded_prompts().len(), 1);
}

#[tokio::test]
async fn fenced_reply_is_accepted() {
    let fenced = format!("```json\n{}\n```", quiz_reply(2));
    let model = MockModel::new(vec![
        Scripted::Reply(fenced),
        Scripted::Reply("fine".into()),
    ]);
    let config = config_with(model);

    let output = generate(&astronomy_request(2), &config).await.unwrap();
    assert_eq!(output.quiz.len(), 2);
}

// ── Ambient behaviour ────────────────────────────────────────────────────────

#[tokio::test]
async fn usage_stats_aggregate_both_calls() {
    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(3)),
        Scripted::Reply("fine".into()),
    ]);
    let config = config_with(model);

    let output = generate(&astronomy_request(3), &config).await.unwrap();
    assert_eq!(output.stats.calls, 2);
    assert_eq!(output.stats.prompt_tokens, 2000);
    assert_eq!(output.stats.completion_tokens, 1000);
    assert_eq!(output.stats.total_tokens(), 3000);
    // 2000 * $0.10/1M + 1000 * $0.40/1M for gpt-4.1-nano
    assert!((output.stats.estimated_cost_usd - 0.0006).abs() < 1e-9);
}

#[tokio::test]
async fn missing_schema_hint_is_a_config_warning() {
    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(2)),
        Scripted::Reply("fine".into()),
    ]);
    // No schema_hint set on the config at all.
    let config = QuizConfig::builder()
        .chat_model(model.clone())
        .max_retries(0)
        .build()
        .unwrap();

    let output = generate(&astronomy_request(2), &config).await.unwrap();
    assert!(matches!(
        output.warnings.as_slice(),
        [QuizWarning::SchemaHintMissing { .. }]
    ));
    // The built-in default shape must still reach the prompt.
    let (_, user) = &model.recorded_prompts()[0];
    assert!(user.contains("### RESPONSE_JSON"));
    assert!(user.contains("\"mcq\""));
}

#[tokio::test]
async fn counters_record_successful_runs_only() {
    let counters = RunCounters::new();

    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(3)),
        Scripted::Reply("fine".into()),
    ]);
    let ok_config = QuizConfig::builder()
        .chat_model(model)
        .schema_hint(SchemaHint::default())
        .counters(counters.clone())
        .build()
        .unwrap();
    generate(&astronomy_request(3), &ok_config).await.unwrap();

    let failing = MockModel::new(vec![Scripted::Fail("boom".into())]);
    let bad_config = QuizConfig::builder()
        .chat_model(failing)
        .schema_hint(SchemaHint::default())
        .max_retries(0)
        .counters(counters.clone())
        .build()
        .unwrap();
    generate(&astronomy_request(3), &bad_config).await.unwrap_err();

    assert_eq!(counters.mcqs_generated(), 3);
    assert_eq!(counters.documents_processed(), 1);
}

#[tokio::test]
async fn no_review_config_makes_a_single_call() {
    let model = MockModel::new(vec![Scripted::Reply(quiz_reply(2))]);
    let config = QuizConfig::builder()
        .chat_model(model.clone())
        .schema_hint(SchemaHint::default())
        .review(false)
        .build()
        .unwrap();

    let output = generate(&astronomy_request(2), &config).await.unwrap();
    assert!(output.review.is_none());
    assert!(output.warnings.is_empty());
    assert_eq!(output.stats.calls, 1);
    assert_eq!(model.recorded_prompts().len(), 1);
}

// ── File ingestion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn generate_from_text_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "The sun is a star. It provides light and heat.").unwrap();

    let model = MockModel::new(vec![
        Scripted::Reply(quiz_reply(3)),
        Scripted::Reply("fine".into()),
    ]);
    let config = config_with(model.clone());

    let output = generate_from_path(&path, 3, "Astronomy", "Simple", &config)
        .await
        .unwrap();
    assert_eq!(output.quiz.len(), 3);

    // The file's text must have reached the generation prompt.
    let (_, user) = &model.recorded_prompts()[0];
    assert!(user.contains("It provides light and heat."));
}

#[tokio::test]
async fn empty_file_is_fatal_before_any_model_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    std::fs::write(&path, "   \n").unwrap();

    let model = MockModel::new(vec![]);
    let config = config_with(model.clone());

    let err = generate_from_path(&path, 3, "Astronomy", "Simple", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, McqGenError::Extraction(_)));
    assert!(model.recorded_prompts().is_empty());
}

#[tokio::test]
async fn missing_file_is_file_not_found() {
    let config = config_with(MockModel::new(vec![]));
    let err = generate_from_path("/nonexistent/notes.txt", 3, "Astronomy", "Simple", &config)
        .await
        .unwrap_err();
    assert!(matches!(err, McqGenError::FileNotFound { .. }));
}
