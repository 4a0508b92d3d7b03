//! Typed configuration model
//!
//! Mirrors the four YAML documents the harness is driven by: prompt
//! variants, system prompts, evaluation settings, and test data. All of
//! these are loaded once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{RubricError, RubricResult};

/// A named prompt template to be filled with test-case variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptVariant {
    /// Unique identifier for the variant
    pub id: String,
    /// Template string with `{name}` placeholders
    pub template: String,
    /// Optional reference to a system prompt by id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Free-form description of what this variant is trying
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A fixed instruction string paired with prompt variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// Unique identifier, referenced from `PromptVariant::system_prompt`
    pub id: String,
    /// The instruction text sent as the system message
    pub text: String,
}

/// A single test input: variable values for one rendering of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique identifier for the case
    pub id: String,
    /// Template variable name → value
    #[serde(default)]
    pub variables: HashMap<String, String>,
    /// Optional hint at what a good output looks like, shown to the judge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

/// One axis the judge scores on (e.g. conciseness)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationCriterion {
    /// Criterion name, used as the score key in judge responses
    pub name: String,
    /// Rubric text describing what the criterion measures
    pub description: String,
    /// Relative weight in the aggregate score
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Inclusive bounds for judge scores
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreScale {
    pub min: f64,
    pub max: f64,
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self { min: 1.0, max: 5.0 }
    }
}

impl ScoreScale {
    /// Check whether a score falls inside the scale
    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }
}

/// Model parameters for one chat-completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model name sent in the request body
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: f64,
    /// Optional completion length cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: 0.0,
            max_tokens: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Where and under what experiment name runs are recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingSettings {
    /// Base URL of the MLflow-compatible tracking server
    #[serde(default = "default_tracking_uri")]
    pub tracking_uri: String,
    /// Experiment name runs are grouped under
    #[serde(default = "default_experiment_name")]
    pub experiment_name: String,
}

fn default_tracking_uri() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_experiment_name() -> String {
    "rubric".to_string()
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            tracking_uri: default_tracking_uri(),
            experiment_name: default_experiment_name(),
        }
    }
}

/// Contents of `evaluation.yaml`: criteria plus model and tracking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Criteria the judge scores on
    pub criteria: Vec<EvaluationCriterion>,
    /// Valid score range
    #[serde(default)]
    pub scale: ScoreScale,
    /// Settings for the generation call
    #[serde(default)]
    pub generation: ModelSettings,
    /// Settings for the judge call
    #[serde(default)]
    pub judge: ModelSettings,
    /// Experiment tracking settings
    #[serde(default)]
    pub tracking: TrackingSettings,
    /// Directory the local results report is written into
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_output_dir() -> String {
    "results".to_string()
}

/// The full loaded configuration: all four documents, validated
#[derive(Debug, Clone)]
pub struct EvalConfig {
    pub variants: Vec<PromptVariant>,
    pub system_prompts: Vec<SystemPrompt>,
    pub cases: Vec<TestCase>,
    pub settings: EvaluationSettings,
}

impl EvalConfig {
    /// Look up a system prompt by id
    pub fn system_prompt(&self, id: &str) -> Option<&SystemPrompt> {
        self.system_prompts.iter().find(|s| s.id == id)
    }

    /// Resolve the system prompt text for a variant, if it references one
    pub fn system_prompt_for(&self, variant: &PromptVariant) -> RubricResult<Option<&str>> {
        match &variant.system_prompt {
            None => Ok(None),
            Some(id) => self
                .system_prompt(id)
                .map(|s| Some(s.text.as_str()))
                .ok_or_else(|| {
                    RubricError::config(format!(
                        "variant '{}' references unknown system prompt '{}'",
                        variant.id, id
                    ))
                }),
        }
    }

    /// Validate cross-references and basic sanity of the loaded config
    pub fn validate(&self) -> RubricResult<()> {
        if self.variants.is_empty() {
            return Err(RubricError::config("no prompt variants configured"));
        }
        if self.cases.is_empty() {
            return Err(RubricError::config("no test cases configured"));
        }
        if self.settings.criteria.is_empty() {
            return Err(RubricError::config("no evaluation criteria configured"));
        }

        let mut seen = std::collections::HashSet::new();
        for variant in &self.variants {
            if variant.template.trim().is_empty() {
                return Err(RubricError::config(format!(
                    "variant '{}' has an empty template",
                    variant.id
                )));
            }
            if !seen.insert(variant.id.as_str()) {
                return Err(RubricError::config(format!(
                    "duplicate variant id '{}'",
                    variant.id
                )));
            }
            // Broken placeholder syntax is a config error, not a per-pair
            // render failure at run time
            if let Err(err) = crate::template::placeholders(&variant.template) {
                return Err(RubricError::config(format!(
                    "variant '{}' has an invalid template: {}",
                    variant.id, err
                )));
            }
            // Resolves or errors on a dangling reference
            self.system_prompt_for(variant)?;
        }

        let mut seen_cases = std::collections::HashSet::new();
        for case in &self.cases {
            if !seen_cases.insert(case.id.as_str()) {
                return Err(RubricError::config(format!(
                    "duplicate test case id '{}'",
                    case.id
                )));
            }
        }

        let scale = &self.settings.scale;
        if scale.min >= scale.max {
            return Err(RubricError::config(format!(
                "score scale min {} must be below max {}",
                scale.min, scale.max
            )));
        }
        let mut seen_criteria = std::collections::HashSet::new();
        for criterion in &self.settings.criteria {
            if !seen_criteria.insert(criterion.name.as_str()) {
                return Err(RubricError::config(format!(
                    "duplicate criterion name '{}'",
                    criterion.name
                )));
            }
            if criterion.weight <= 0.0 {
                return Err(RubricError::config(format!(
                    "criterion '{}' has non-positive weight {}",
                    criterion.name, criterion.weight
                )));
            }
        }

        Ok(())
    }
}
