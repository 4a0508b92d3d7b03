//! Evaluation runner
//!
//! Drives the main loop: for every prompt variant crossed with every test
//! case, render the template, call the generation model, call the judge,
//! aggregate the scores, and record the pair as a tracked run. Pairs are
//! processed strictly one at a time; a failed pair is recorded and the
//! loop moves on.

mod result;

pub use result::{aggregate_score, PairOutcome, RunReport, RunResult};

use std::sync::Arc;

use chrono::Utc;

use crate::config::{EvalConfig, PromptVariant, TestCase};
use crate::error::{RubricError, RubricResult};
use crate::judge::judge_output;
use crate::llm::{ChatClient, ChatMessage, TokenUsage};
use crate::template;
use crate::tracking::{Metric, RunStatus, RunTracker};

/// How much of the rendered prompt is logged as a run parameter
const PROMPT_PREVIEW_CHARS: usize = 100;

/// Runs the full variant × case evaluation
pub struct EvalRunner {
    config: EvalConfig,
    client: Arc<dyn ChatClient>,
    tracker: Arc<dyn RunTracker>,
}

impl EvalRunner {
    /// Create a runner over a validated config
    pub fn new(
        config: EvalConfig,
        client: Arc<dyn ChatClient>,
        tracker: Arc<dyn RunTracker>,
    ) -> Self {
        Self {
            config,
            client,
            tracker,
        }
    }

    /// Evaluate every (variant, case) pair sequentially
    pub async fn run(&self) -> RunReport {
        let started_at = Utc::now();
        let total = self.config.variants.len() * self.config.cases.len();
        let mut outcomes = Vec::with_capacity(total);

        tracing::info!(
            variants = self.config.variants.len(),
            cases = self.config.cases.len(),
            "starting evaluation of {} pairs",
            total
        );

        for variant in &self.config.variants {
            for case in &self.config.cases {
                let outcome = match self.run_pair(variant, case).await {
                    Ok(result) => {
                        tracing::info!(
                            variant = %variant.id,
                            case = %case.id,
                            aggregate = result.aggregate_score,
                            "pair evaluated"
                        );
                        PairOutcome::Success { result }
                    }
                    Err((err, partial)) => {
                        tracing::error!(
                            variant = %variant.id,
                            case = %case.id,
                            "pair failed: {}",
                            err
                        );
                        PairOutcome::Failed {
                            variant_id: variant.id.clone(),
                            case_id: case.id.clone(),
                            error_code: err.code().to_string(),
                            error: err.to_string(),
                            result: partial,
                        }
                    }
                };
                outcomes.push(outcome);
            }
        }

        RunReport {
            outcomes,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Process one pair end to end: render, generate, judge, track.
    ///
    /// On failure returns the error together with the result computed so
    /// far, so a tracking failure does not discard the judged scores.
    async fn run_pair(
        &self,
        variant: &PromptVariant,
        case: &TestCase,
    ) -> Result<RunResult, (RubricError, Option<RunResult>)> {
        let started_at = Utc::now();

        let rendered = template::render(&variant.template, &case.variables)
            .map_err(|e| (e, None))?;

        let system_prompt = self
            .config
            .system_prompt_for(variant)
            .map_err(|e| (e, None))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(text) = system_prompt {
            messages.push(ChatMessage::system(text));
        }
        messages.push(ChatMessage::user(rendered.clone()));

        let generation = self
            .client
            .chat(&messages, &self.config.settings.generation)
            .await
            .map_err(|e| (e, None))?;

        let (scores, judge_usage) = judge_output(
            self.client.as_ref(),
            &self.config.settings,
            &rendered,
            &generation.content,
            case.expected.as_deref(),
        )
        .await
        .map_err(|e| (e, None))?;

        let aggregate = aggregate_score(&scores, &self.config.settings.criteria);
        let usage = combine_usage(generation.usage, judge_usage);

        let mut result = RunResult {
            variant_id: variant.id.clone(),
            case_id: case.id.clone(),
            rendered_prompt: rendered,
            generated: generation.content,
            scores,
            aggregate_score: aggregate,
            usage,
            tracking_run_id: None,
            started_at,
            finished_at: Utc::now(),
        };

        match self.track(&result).await {
            Ok(run_id) => {
                result.tracking_run_id = Some(run_id);
                result.finished_at = Utc::now();
                Ok(result)
            }
            Err(e) => Err((e, Some(result))),
        }
    }

    /// Record one result as a tracked run, returning the run id.
    ///
    /// A run opened on the server must never be left without a terminal
    /// status: if any logging call fails after `start_run`, the run is
    /// closed as failed before the error is returned.
    async fn track(&self, result: &RunResult) -> RubricResult<String> {
        let run_name = format!("{}_{}", result.variant_id, result.case_id);
        let run_id = self.tracker.start_run(&run_name).await?;

        match self.log_run(&run_id, result).await {
            Ok(()) => Ok(run_id),
            Err(err) => {
                if let Err(close_err) =
                    self.tracker.end_run(&run_id, RunStatus::Failed).await
                {
                    tracing::warn!(
                        run_id = %run_id,
                        "failed to close run after logging error: {}",
                        close_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Log params, metrics and tags on an open run and close it
    async fn log_run(&self, run_id: &str, result: &RunResult) -> RubricResult<()> {
        let settings = &self.config.settings;

        self.tracker
            .log_param(run_id, "variant_id", &result.variant_id)
            .await?;
        self.tracker
            .log_param(run_id, "case_id", &result.case_id)
            .await?;
        self.tracker
            .log_param(run_id, "model", &settings.generation.model)
            .await?;
        self.tracker
            .log_param(
                run_id,
                "temperature",
                &settings.generation.temperature.to_string(),
            )
            .await?;
        self.tracker
            .log_param(run_id, "judge_model", &settings.judge.model)
            .await?;
        self.tracker
            .log_param(
                run_id,
                "prompt_preview",
                &preview(&result.rendered_prompt),
            )
            .await?;

        let mut metrics: Vec<Metric> = result
            .scores
            .iter()
            .map(|s| Metric::new(s.criterion.clone(), s.score))
            .collect();
        metrics.push(Metric::new("aggregate_score", result.aggregate_score));
        metrics.push(Metric::new(
            "prompt_tokens",
            result.usage.prompt_tokens as f64,
        ));
        metrics.push(Metric::new(
            "completion_tokens",
            result.usage.completion_tokens as f64,
        ));
        self.tracker.log_metrics(run_id, &metrics).await?;

        self.tracker
            .set_tag(run_id, "generated_text", &result.generated)
            .await?;
        let explanations = serde_json::to_string(&result.scores)?;
        self.tracker
            .set_tag(run_id, "judge_scores", &explanations)
            .await?;

        self.tracker.end_run(run_id, RunStatus::Finished).await?;
        Ok(())
    }
}

/// Sum generation and judge usage into one tally
fn combine_usage(generation: Option<TokenUsage>, judge: Option<TokenUsage>) -> TokenUsage {
    let g = generation.unwrap_or_default();
    let j = judge.unwrap_or_default();
    TokenUsage {
        prompt_tokens: g.prompt_tokens + j.prompt_tokens,
        completion_tokens: g.completion_tokens + j.completion_tokens,
        total_tokens: g.total_tokens + j.total_tokens,
    }
}

/// Truncate a prompt for logging as a parameter
fn preview(prompt: &str) -> String {
    if prompt.chars().count() <= PROMPT_PREVIEW_CHARS {
        return prompt.to_string();
    }
    let truncated: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_usage() {
        let g = TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        let j = TokenUsage {
            prompt_tokens: 20,
            completion_tokens: 2,
            total_tokens: 22,
        };
        let combined = combine_usage(Some(g), Some(j));
        assert_eq!(combined.prompt_tokens, 30);
        assert_eq!(combined.completion_tokens, 7);
        assert_eq!(combined.total_tokens, 37);
    }

    #[test]
    fn test_combine_usage_missing_sides() {
        let combined = combine_usage(None, None);
        assert_eq!(combined.total_tokens, 0);
    }

    #[test]
    fn test_preview_truncates_long_prompts() {
        let long = "x".repeat(300);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PROMPT_PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn test_preview_keeps_short_prompts() {
        assert_eq!(preview("short"), "short");
    }
}
