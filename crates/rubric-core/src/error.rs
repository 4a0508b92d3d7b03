//! Error types for the rubric harness
//!
//! A single unified error enum covers every failure the harness can hit:
//! malformed config, template rendering, generation calls, judge-response
//! parsing, and tracking-service calls. Each variant carries a message and
//! optional context about where the error occurred.

use thiserror::Error;

/// Result type alias for rubric operations
pub type RubricResult<T> = Result<T, RubricError>;

/// Main error type for the rubric harness
#[derive(Error, Debug, Clone)]
pub enum RubricError {
    /// Configuration related errors (missing file, malformed YAML, bad field)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
    },

    /// Template rendering errors (unresolved placeholder)
    #[error("Render error: {message}")]
    Render {
        message: String,
        variable: Option<String>,
    },

    /// Generation call errors (network or API failure)
    #[error("Generation error: {message}")]
    Generation {
        message: String,
        model: Option<String>,
    },

    /// Judge response parsing errors
    #[error("Judge parse error: {message}")]
    JudgeParse {
        message: String,
        raw_response: Option<String>,
    },

    /// Experiment tracking errors
    #[error("Logging error: {message}")]
    Logging {
        message: String,
        run_id: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },
}

impl RubricError {
    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    /// Create a configuration error tied to a file path
    pub fn config_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new render error
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            variable: None,
        }
    }

    /// Create a render error naming the missing variable
    pub fn render_missing(variable: impl Into<String>) -> Self {
        let variable = variable.into();
        Self::Render {
            message: format!("no value for template variable '{}'", variable),
            variable: Some(variable),
        }
    }

    /// Create a new generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            model: None,
        }
    }

    /// Create a generation error with the model name
    pub fn generation_with_model(message: impl Into<String>, model: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            model: Some(model.into()),
        }
    }

    /// Create a new judge parse error
    pub fn judge_parse(message: impl Into<String>) -> Self {
        Self::JudgeParse {
            message: message.into(),
            raw_response: None,
        }
    }

    /// Create a judge parse error keeping the raw model output
    pub fn judge_parse_with_raw(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::JudgeParse {
            message: message.into(),
            raw_response: Some(raw.into()),
        }
    }

    /// Create a new logging error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
            run_id: None,
        }
    }

    /// Create a logging error tied to a tracking run
    pub fn logging_for_run(message: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
            run_id: Some(run_id.into()),
        }
    }

    /// Create an IO error tied to a path
    pub fn io_at(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Short stable code for each error kind, used in error records
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Render { .. } => "render",
            Self::Generation { .. } => "generation",
            Self::JudgeParse { .. } => "judge_parse",
            Self::Logging { .. } => "logging",
            Self::Io { .. } => "io",
            Self::Json { .. } => "json",
        }
    }
}

impl From<serde_json::Error> for RubricError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            message: err.to_string(),
        }
    }
}
