//! Experiment run tracking
//!
//! Every (variant, case) evaluation is recorded as one run in an
//! MLflow-compatible tracking service: parameters at start, metrics once
//! computed, and a terminal status. `RunTracker` is the seam; the real
//! REST client and the in-memory test double both implement it.

mod memory;
mod mlflow;

pub use memory::{InMemoryTracker, LoggedRun};
pub use mlflow::{MlflowTracker, TRACKING_URI_VAR};

use async_trait::async_trait;

use crate::error::RubricResult;

/// Terminal status of a tracked run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Finished,
    Failed,
}

impl RunStatus {
    /// Wire value used by the MLflow REST API
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Finished => "FINISHED",
            RunStatus::Failed => "FAILED",
        }
    }
}

/// One metric point logged to a run
#[derive(Debug, Clone)]
pub struct Metric {
    pub key: String,
    pub value: f64,
}

impl Metric {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Sink for evaluation runs
#[async_trait]
pub trait RunTracker: Send + Sync {
    /// Open a new run and return its id
    async fn start_run(&self, run_name: &str) -> RubricResult<String>;

    /// Log one immutable parameter on a run
    async fn log_param(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()>;

    /// Log a batch of metrics on a run
    async fn log_metrics(&self, run_id: &str, metrics: &[Metric]) -> RubricResult<()>;

    /// Set a tag on a run (used for free-form payloads like generated text)
    async fn set_tag(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()>;

    /// Close a run with a terminal status
    async fn end_run(&self, run_id: &str, status: RunStatus) -> RubricResult<()>;
}
