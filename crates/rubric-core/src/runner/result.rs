//! Evaluation result types and score aggregation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::EvaluationCriterion;
use crate::judge::CriterionScore;
use crate::llm::TokenUsage;

/// Result of one fully evaluated (variant, case) pair.
///
/// Created once, written once to the tracker, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Prompt variant that was evaluated
    pub variant_id: String,
    /// Test case the variant was rendered against
    pub case_id: String,
    /// The fully rendered prompt sent to the generation model
    pub rendered_prompt: String,
    /// Text the generation model produced
    pub generated: String,
    /// Per-criterion judge scores
    pub scores: Vec<CriterionScore>,
    /// Weighted mean of the criterion scores
    pub aggregate_score: f64,
    /// Combined token usage of the generation and judge calls
    pub usage: TokenUsage,
    /// Tracking run id, when the run was logged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_run_id: Option<String>,
    /// When processing of the pair started
    pub started_at: DateTime<Utc>,
    /// When processing of the pair finished
    pub finished_at: DateTime<Utc>,
}

/// Outcome of one (variant, case) pair: success or an error record.
///
/// A failed pair never aborts the loop; it is recorded and skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PairOutcome {
    Success {
        #[serde(flatten)]
        result: RunResult,
    },
    Failed {
        variant_id: String,
        case_id: String,
        /// Stable error kind (config, render, generation, judge_parse, logging)
        error_code: String,
        error: String,
        /// Result computed before the failure, if any (e.g. tracking failed
        /// after judging succeeded)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<RunResult>,
    },
}

impl PairOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PairOutcome::Success { .. })
    }

    pub fn variant_id(&self) -> &str {
        match self {
            PairOutcome::Success { result } => &result.variant_id,
            PairOutcome::Failed { variant_id, .. } => variant_id,
        }
    }

    pub fn case_id(&self) -> &str {
        match self {
            PairOutcome::Success { result } => &result.case_id,
            PairOutcome::Failed { case_id, .. } => case_id,
        }
    }
}

/// Everything one evaluation produced: all pair outcomes plus timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub outcomes: Vec<PairOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Number of fully successful pairs
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failed pairs
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Mean aggregate score per variant, over successful pairs
    pub fn mean_aggregate_by_variant(&self) -> HashMap<String, f64> {
        let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
        for outcome in &self.outcomes {
            if let PairOutcome::Success { result } = outcome {
                let entry = sums.entry(result.variant_id.clone()).or_insert((0.0, 0));
                entry.0 += result.aggregate_score;
                entry.1 += 1;
            }
        }
        sums.into_iter()
            .map(|(id, (sum, n))| (id, sum / n as f64))
            .collect()
    }
}

/// Combine per-criterion scores into one headline number.
///
/// Weight-normalized arithmetic mean: `sum(w_i * s_i) / sum(w_i)`. With
/// default weights this degrades to the plain mean, and the result always
/// stays inside the score scale.
pub fn aggregate_score(scores: &[CriterionScore], criteria: &[EvaluationCriterion]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for score in scores {
        let weight = criteria
            .iter()
            .find(|c| c.name == score.criterion)
            .map(|c| c.weight)
            .unwrap_or(1.0);
        weighted_sum += weight * score.score;
        weight_sum += weight;
    }
    if weight_sum == 0.0 {
        return 0.0;
    }
    weighted_sum / weight_sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(name: &str, value: f64) -> CriterionScore {
        CriterionScore {
            criterion: name.to_string(),
            score: value,
            explanation: String::new(),
        }
    }

    fn criterion(name: &str, weight: f64) -> EvaluationCriterion {
        EvaluationCriterion {
            name: name.to_string(),
            description: String::new(),
            weight,
        }
    }

    #[test]
    fn test_aggregate_plain_mean_with_default_weights() {
        let scores = vec![score("a", 2.0), score("b", 4.0)];
        let criteria = vec![criterion("a", 1.0), criterion("b", 1.0)];
        assert_eq!(aggregate_score(&scores, &criteria), 3.0);
    }

    #[test]
    fn test_aggregate_respects_weights() {
        let scores = vec![score("a", 2.0), score("b", 5.0)];
        let criteria = vec![criterion("a", 3.0), criterion("b", 1.0)];
        // (3*2 + 1*5) / 4
        assert_eq!(aggregate_score(&scores, &criteria), 2.75);
    }

    #[test]
    fn test_aggregate_empty_is_zero() {
        assert_eq!(aggregate_score(&[], &[]), 0.0);
    }

    #[test]
    fn test_mean_aggregate_by_variant() {
        let result = |variant: &str, agg: f64| RunResult {
            variant_id: variant.to_string(),
            case_id: "c".to_string(),
            rendered_prompt: String::new(),
            generated: String::new(),
            scores: Vec::new(),
            aggregate_score: agg,
            usage: TokenUsage::default(),
            tracking_run_id: None,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };
        let report = RunReport {
            outcomes: vec![
                PairOutcome::Success {
                    result: result("v1", 3.0),
                },
                PairOutcome::Success {
                    result: result("v1", 5.0),
                },
                PairOutcome::Failed {
                    variant_id: "v2".to_string(),
                    case_id: "c".to_string(),
                    error_code: "render".to_string(),
                    error: "boom".to_string(),
                    result: None,
                },
            ],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        let means = report.mean_aggregate_by_variant();
        assert_eq!(means["v1"], 4.0);
        assert!(!means.contains_key("v2"));
    }
}
