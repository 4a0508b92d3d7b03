//! Judge response parsing
//!
//! The judge's reply comes from a non-deterministic model, so the shape is
//! never assumed: the JSON object is extracted leniently (models like to
//! wrap output in code fences or preamble), then validated strictly
//! against the configured criteria and score scale. A response missing a
//! criterion or scoring outside the scale is rejected whole; partial score
//! sets are never returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{EvaluationCriterion, ScoreScale};
use crate::error::{RubricError, RubricResult};

/// One criterion's score as judged
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionScore {
    /// Criterion name from the configuration
    pub criterion: String,
    /// Numeric score within the configured scale
    pub score: f64,
    /// The judge's explanation for the score
    pub explanation: String,
}

/// Parse and validate a judge reply against the configured criteria.
///
/// Scores are returned in configuration order. Extra keys the judge
/// invents are ignored.
pub fn parse_judge_response(
    raw: &str,
    criteria: &[EvaluationCriterion],
    scale: &ScoreScale,
) -> RubricResult<Vec<CriterionScore>> {
    let json_text = extract_json_object(raw).ok_or_else(|| {
        RubricError::judge_parse_with_raw("no JSON object found in judge response", raw)
    })?;

    let value: Value = serde_json::from_str(json_text).map_err(|e| {
        RubricError::judge_parse_with_raw(format!("invalid JSON in judge response: {}", e), raw)
    })?;

    let object = value.as_object().ok_or_else(|| {
        RubricError::judge_parse_with_raw("judge response is not a JSON object", raw)
    })?;

    let mut scores = Vec::with_capacity(criteria.len());
    for criterion in criteria {
        let entry = object.get(&criterion.name).ok_or_else(|| {
            RubricError::judge_parse_with_raw(
                format!("judge response missing criterion '{}'", criterion.name),
                raw,
            )
        })?;

        let score = entry
            .get("score")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                RubricError::judge_parse_with_raw(
                    format!("criterion '{}' has no numeric score", criterion.name),
                    raw,
                )
            })?;

        if !scale.contains(score) {
            return Err(RubricError::judge_parse_with_raw(
                format!(
                    "criterion '{}' score {} outside scale {}..={}",
                    criterion.name, score, scale.min, scale.max
                ),
                raw,
            ));
        }

        let explanation = entry
            .get("explanation")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        scores.push(CriterionScore {
            criterion: criterion.name.clone(),
            score,
            explanation,
        });
    }

    Ok(scores)
}

/// Find the outermost JSON object in possibly noisy model output.
///
/// Handles code fences and prose around the object by slicing from the
/// first `{` to the last `}`.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}
