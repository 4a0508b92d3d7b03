//! Configuration model and loading

mod loader;
mod model;

pub use loader::{
    load_config_from_yaml, ConfigLoader, EVALUATION_FILE, PROMPTS_FILE, SYSTEM_PROMPTS_FILE,
    TEST_DATA_FILE,
};
pub use model::{
    EvalConfig, EvaluationCriterion, EvaluationSettings, ModelSettings, PromptVariant, ScoreScale,
    SystemPrompt, TestCase, TrackingSettings,
};
