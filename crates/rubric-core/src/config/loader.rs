//! Loading the four YAML configuration documents
//!
//! The harness is driven entirely by a config directory holding
//! `prompts.yaml`, `system_prompts.yaml`, `evaluation.yaml` and
//! `test_data.yaml`. Loading is strict: a missing file, malformed YAML or
//! a dangling reference fails with a config error before any API call is
//! made.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::model::{EvalConfig, EvaluationSettings, PromptVariant, SystemPrompt, TestCase};
use crate::error::{RubricError, RubricResult};

/// File name of the prompt variants document
pub const PROMPTS_FILE: &str = "prompts.yaml";
/// File name of the system prompts document
pub const SYSTEM_PROMPTS_FILE: &str = "system_prompts.yaml";
/// File name of the evaluation settings document
pub const EVALUATION_FILE: &str = "evaluation.yaml";
/// File name of the test data document
pub const TEST_DATA_FILE: &str = "test_data.yaml";

#[derive(Debug, Deserialize)]
struct PromptsDoc {
    variants: Vec<PromptVariant>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemPromptsDoc {
    #[serde(default)]
    system_prompts: Vec<SystemPrompt>,
}

#[derive(Debug, Deserialize)]
struct TestDataDoc {
    cases: Vec<TestCase>,
}

/// Loader for a config directory
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at the given config directory
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Load and validate all four documents
    pub fn load(&self) -> RubricResult<EvalConfig> {
        if !self.config_dir.is_dir() {
            return Err(RubricError::config_at(
                "config directory not found",
                self.config_dir.display().to_string(),
            ));
        }

        let prompts: PromptsDoc = self.load_file(PROMPTS_FILE)?;
        let system_prompts: SystemPromptsDoc = self.load_file(SYSTEM_PROMPTS_FILE)?;
        let settings: EvaluationSettings = self.load_file(EVALUATION_FILE)?;
        let test_data: TestDataDoc = self.load_file(TEST_DATA_FILE)?;

        let config = EvalConfig {
            variants: prompts.variants,
            system_prompts: system_prompts.system_prompts,
            cases: test_data.cases,
            settings,
        };
        config.validate()?;

        tracing::debug!(
            variants = config.variants.len(),
            cases = config.cases.len(),
            criteria = config.settings.criteria.len(),
            "loaded configuration from {}",
            self.config_dir.display()
        );

        Ok(config)
    }

    fn load_file<T: DeserializeOwned>(&self, name: &str) -> RubricResult<T> {
        let path = self.config_dir.join(name);
        let content = std::fs::read_to_string(&path).map_err(|e| {
            RubricError::config_at(
                format!("failed to read {}: {}", name, e),
                path.display().to_string(),
            )
        })?;
        serde_yaml::from_str(&content).map_err(|e| {
            RubricError::config_at(
                format!("failed to parse {}: {}", name, e),
                path.display().to_string(),
            )
        })
    }
}

/// Parse a config from in-memory YAML strings (useful for testing)
pub fn load_config_from_yaml(
    prompts: &str,
    system_prompts: &str,
    evaluation: &str,
    test_data: &str,
) -> RubricResult<EvalConfig> {
    let prompts: PromptsDoc = serde_yaml::from_str(prompts)
        .map_err(|e| RubricError::config(format!("failed to parse prompts: {}", e)))?;
    let system_prompts: SystemPromptsDoc = serde_yaml::from_str(system_prompts)
        .map_err(|e| RubricError::config(format!("failed to parse system prompts: {}", e)))?;
    let settings: EvaluationSettings = serde_yaml::from_str(evaluation)
        .map_err(|e| RubricError::config(format!("failed to parse evaluation settings: {}", e)))?;
    let test_data: TestDataDoc = serde_yaml::from_str(test_data)
        .map_err(|e| RubricError::config(format!("failed to parse test data: {}", e)))?;

    let config = EvalConfig {
        variants: prompts.variants,
        system_prompts: system_prompts.system_prompts,
        cases: test_data.cases,
        settings,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPTS: &str = r#"
variants:
  - id: summarize-v1
    template: "Summarize: {text}"
    system_prompt: concise
"#;

    const SYSTEM_PROMPTS: &str = r#"
system_prompts:
  - id: concise
    text: "You answer in one short sentence."
"#;

    const EVALUATION: &str = r#"
criteria:
  - name: conciseness
    description: "Short and to the point"
  - name: clarity
    description: "Easy to understand"
    weight: 2.0
scale:
  min: 1
  max: 5
"#;

    const TEST_DATA: &str = r#"
cases:
  - id: greeting
    variables:
      text: "Hello world"
    expected: "A greeting."
"#;

    #[test]
    fn test_load_from_yaml_strings() {
        let config =
            load_config_from_yaml(PROMPTS, SYSTEM_PROMPTS, EVALUATION, TEST_DATA).unwrap();
        assert_eq!(config.variants.len(), 1);
        assert_eq!(config.cases.len(), 1);
        assert_eq!(config.settings.criteria.len(), 2);
        assert_eq!(config.settings.criteria[0].weight, 1.0);
        assert_eq!(config.settings.criteria[1].weight, 2.0);
        assert_eq!(
            config
                .system_prompt_for(&config.variants[0])
                .unwrap()
                .unwrap(),
            "You answer in one short sentence."
        );
    }

    #[test]
    fn test_defaults_for_model_settings() {
        let config =
            load_config_from_yaml(PROMPTS, SYSTEM_PROMPTS, EVALUATION, TEST_DATA).unwrap();
        assert_eq!(config.settings.generation.model, "gpt-4o-mini");
        assert_eq!(config.settings.generation.temperature, 0.0);
        assert_eq!(config.settings.tracking.experiment_name, "rubric");
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROMPTS_FILE), PROMPTS).unwrap();
        std::fs::write(dir.path().join(SYSTEM_PROMPTS_FILE), SYSTEM_PROMPTS).unwrap();
        std::fs::write(dir.path().join(EVALUATION_FILE), EVALUATION).unwrap();
        std::fs::write(dir.path().join(TEST_DATA_FILE), TEST_DATA).unwrap();

        let config = ConfigLoader::new(dir.path()).load().unwrap();
        assert_eq!(config.variants[0].id, "summarize-v1");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PROMPTS_FILE), PROMPTS).unwrap();

        let err = ConfigLoader::new(dir.path()).load().unwrap_err();
        match err {
            RubricError::Config { path, .. } => {
                assert!(path.unwrap().contains(SYSTEM_PROMPTS_FILE));
            }
            _ => panic!("expected config error"),
        }
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = load_config_from_yaml("variants: [::", SYSTEM_PROMPTS, EVALUATION, TEST_DATA)
            .unwrap_err();
        assert_eq!(err.code(), "config");
    }
}
