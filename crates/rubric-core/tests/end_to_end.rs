//! End-to-end evaluation flow with a scripted chat client
//!
//! Exercises the full loop without touching the network: the stub client
//! replies with a canned generation then a canned judge response, and the
//! in-memory tracker records the run for round-trip checks.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rubric_core::config::{load_config_from_yaml, EvalConfig, ModelSettings};
use rubric_core::llm::{ChatClient, ChatMessage, ChatResponse, MessageRole, TokenUsage};
use rubric_core::runner::{EvalRunner, PairOutcome};
use rubric_core::tracking::{InMemoryTracker, Metric, RunStatus, RunTracker};
use rubric_core::{RubricError, RubricResult};

/// Chat client returning pre-scripted responses in order
struct ScriptedClient {
    responses: Mutex<VecDeque<ChatResponse>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    fn new(responses: Vec<ChatResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        _settings: &ModelSettings,
    ) -> RubricResult<ChatResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted client ran out of responses"))
    }
}

/// Tracker that opens runs normally but fails every metrics write,
/// delegating everything else to an in-memory tracker
struct FailingMetricsTracker {
    inner: InMemoryTracker,
}

#[async_trait]
impl RunTracker for FailingMetricsTracker {
    async fn start_run(&self, run_name: &str) -> RubricResult<String> {
        self.inner.start_run(run_name).await
    }

    async fn log_param(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()> {
        self.inner.log_param(run_id, key, value).await
    }

    async fn log_metrics(&self, _run_id: &str, _metrics: &[Metric]) -> RubricResult<()> {
        Err(RubricError::logging("tracking server unavailable"))
    }

    async fn set_tag(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()> {
        self.inner.set_tag(run_id, key, value).await
    }

    async fn end_run(&self, run_id: &str, status: RunStatus) -> RubricResult<()> {
        self.inner.end_run(run_id, status).await
    }
}

const JUDGE_JSON: &str = r#"{
    "conciseness": {"score": 5, "explanation": "one sentence"},
    "clarity": {"score": 4, "explanation": "plain"},
    "practicality": {"score": 3, "explanation": "adequate"}
}"#;

fn test_config() -> EvalConfig {
    load_config_from_yaml(
        r#"
variants:
  - id: summarize-v1
    template: "Summarize: {text}"
    system_prompt: concise
"#,
        r#"
system_prompts:
  - id: concise
    text: "You answer in one short sentence."
"#,
        r#"
criteria:
  - name: conciseness
    description: "Short and to the point"
  - name: clarity
    description: "Easy to understand"
  - name: practicality
    description: "Actually useful"
"#,
        r#"
cases:
  - id: greeting
    variables:
      text: "Hello world"
    expected: "A greeting."
"#,
    )
    .unwrap()
}

#[tokio::test]
async fn test_full_pair_evaluation() {
    let client = Arc::new(ScriptedClient::new(vec![
        ChatResponse::new("A greeting.").with_usage(TokenUsage {
            prompt_tokens: 12,
            completion_tokens: 3,
            total_tokens: 15,
        }),
        ChatResponse::new(JUDGE_JSON),
    ]));
    let tracker = Arc::new(InMemoryTracker::new());
    let runner = EvalRunner::new(test_config(), client.clone(), tracker.clone());

    let report = runner.run().await;
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.succeeded(), 1);

    let result = match &report.outcomes[0] {
        PairOutcome::Success { result } => result,
        other => panic!("expected success, got {:?}", other),
    };

    // The renderer substituted the test-case variable
    assert_eq!(result.rendered_prompt, "Summarize: Hello world");
    assert_eq!(result.generated, "A greeting.");
    // One score per configured criterion
    assert_eq!(result.scores.len(), 3);
    assert_eq!(result.aggregate_score, 4.0);

    // Generation call carried the system prompt then the rendered prompt
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0][0].role, MessageRole::System);
    assert_eq!(requests[0][0].content, "You answer in one short sentence.");
    assert_eq!(requests[0][1].content, "Summarize: Hello world");
    // Judge call saw the generated text and the expected hint
    assert!(requests[1][1].content.contains("A greeting."));
}

#[tokio::test]
async fn test_tracked_run_round_trips() {
    let client = Arc::new(ScriptedClient::new(vec![
        ChatResponse::new("A greeting."),
        ChatResponse::new(JUDGE_JSON),
    ]));
    let tracker = Arc::new(InMemoryTracker::new());
    let runner = EvalRunner::new(test_config(), client, tracker.clone());

    let report = runner.run().await;
    let result = match &report.outcomes[0] {
        PairOutcome::Success { result } => result,
        other => panic!("expected success, got {:?}", other),
    };

    let run_id = result.tracking_run_id.as_deref().unwrap();
    let run = tracker.get_run(run_id).unwrap();

    // Re-reading the logged run yields the same ids and scores
    assert_eq!(run.params["variant_id"], "summarize-v1");
    assert_eq!(run.params["case_id"], "greeting");
    assert_eq!(run.metrics["conciseness"], 5.0);
    assert_eq!(run.metrics["clarity"], 4.0);
    assert_eq!(run.metrics["practicality"], 3.0);
    assert_eq!(run.metrics["aggregate_score"], result.aggregate_score);
    assert_eq!(run.tags["generated_text"], "A greeting.");
}

#[tokio::test]
async fn test_malformed_judge_response_records_failure() {
    let client = Arc::new(ScriptedClient::new(vec![
        ChatResponse::new("A greeting."),
        ChatResponse::new("I would rate this quite highly overall."),
    ]));
    let tracker = Arc::new(InMemoryTracker::new());
    let runner = EvalRunner::new(test_config(), client, tracker.clone());

    let report = runner.run().await;
    assert_eq!(report.failed(), 1);
    match &report.outcomes[0] {
        PairOutcome::Failed {
            error_code, result, ..
        } => {
            assert_eq!(error_code, "judge_parse");
            assert!(result.is_none());
        }
        other => panic!("expected failure, got {:?}", other),
    }
    // Nothing was logged for the failed pair
    assert!(tracker.runs().is_empty());
}

#[tokio::test]
async fn test_tracking_failure_keeps_result_and_closes_run() {
    let client = Arc::new(ScriptedClient::new(vec![
        ChatResponse::new("A greeting."),
        ChatResponse::new(JUDGE_JSON),
    ]));
    let tracker = Arc::new(FailingMetricsTracker {
        inner: InMemoryTracker::new(),
    });
    let runner = EvalRunner::new(test_config(), client, tracker.clone());

    let report = runner.run().await;
    assert_eq!(report.failed(), 1);

    // The judged result survives in the report even though logging failed
    match &report.outcomes[0] {
        PairOutcome::Failed {
            error_code, result, ..
        } => {
            assert_eq!(error_code, "logging");
            let result = result.as_ref().expect("computed result must be kept");
            assert_eq!(result.generated, "A greeting.");
            assert_eq!(result.scores.len(), 3);
            assert_eq!(result.aggregate_score, 4.0);
            assert!(result.tracking_run_id.is_none());
        }
        other => panic!("expected failure, got {:?}", other),
    }

    // The opened run was closed as failed, not left running
    let runs = tracker.inner.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, Some(RunStatus::Failed));
}

#[tokio::test]
async fn test_failed_pair_does_not_stop_later_pairs() {
    let mut config = test_config();
    // Second variant references a variable the case does not define
    config.variants.push(rubric_core::config::PromptVariant {
        id: "broken-v2".to_string(),
        template: "Translate: {missing}".to_string(),
        system_prompt: None,
        description: None,
    });

    let client = Arc::new(ScriptedClient::new(vec![
        ChatResponse::new("A greeting."),
        ChatResponse::new(JUDGE_JSON),
    ]));
    let tracker = Arc::new(InMemoryTracker::new());
    let runner = EvalRunner::new(config, client, tracker);

    let report = runner.run().await;
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let failed = report
        .outcomes
        .iter()
        .find(|o| !o.is_success())
        .unwrap();
    assert_eq!(failed.variant_id(), "broken-v2");
    match failed {
        PairOutcome::Failed { error_code, .. } => assert_eq!(error_code, "render"),
        _ => unreachable!(),
    }
}
