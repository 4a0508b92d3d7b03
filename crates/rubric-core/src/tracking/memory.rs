//! In-memory tracking double for tests
//!
//! Stores runs exactly as they were logged so tests can assert round-trip
//! fidelity of params and metrics without a tracking server.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use super::{Metric, RunStatus, RunTracker};
use crate::error::{RubricError, RubricResult};

/// A run as the in-memory tracker recorded it
#[derive(Debug, Clone)]
pub struct LoggedRun {
    pub run_id: String,
    pub run_name: String,
    pub params: HashMap<String, String>,
    pub metrics: HashMap<String, f64>,
    pub tags: HashMap<String, String>,
    pub status: Option<RunStatus>,
}

/// Tracker that keeps every logged run in memory
#[derive(Default)]
pub struct InMemoryTracker {
    runs: Mutex<Vec<LoggedRun>>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-read a logged run by id
    pub fn get_run(&self, run_id: &str) -> Option<LoggedRun> {
        self.runs
            .lock()
            .expect("tracker lock poisoned")
            .iter()
            .find(|r| r.run_id == run_id)
            .cloned()
    }

    /// All logged runs in creation order
    pub fn runs(&self) -> Vec<LoggedRun> {
        self.runs.lock().expect("tracker lock poisoned").clone()
    }

    fn with_run<R>(
        &self,
        run_id: &str,
        f: impl FnOnce(&mut LoggedRun) -> R,
    ) -> RubricResult<R> {
        let mut runs = self.runs.lock().expect("tracker lock poisoned");
        let run = runs
            .iter_mut()
            .find(|r| r.run_id == run_id)
            .ok_or_else(|| RubricError::logging_for_run("unknown run", run_id))?;
        Ok(f(run))
    }
}

#[async_trait]
impl RunTracker for InMemoryTracker {
    async fn start_run(&self, run_name: &str) -> RubricResult<String> {
        let run_id = Uuid::new_v4().to_string();
        self.runs
            .lock()
            .expect("tracker lock poisoned")
            .push(LoggedRun {
                run_id: run_id.clone(),
                run_name: run_name.to_string(),
                params: HashMap::new(),
                metrics: HashMap::new(),
                tags: HashMap::new(),
                status: None,
            });
        Ok(run_id)
    }

    async fn log_param(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()> {
        self.with_run(run_id, |run| {
            run.params.insert(key.to_string(), value.to_string());
        })
    }

    async fn log_metrics(&self, run_id: &str, metrics: &[Metric]) -> RubricResult<()> {
        self.with_run(run_id, |run| {
            for metric in metrics {
                run.metrics.insert(metric.key.clone(), metric.value);
            }
        })
    }

    async fn set_tag(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()> {
        self.with_run(run_id, |run| {
            run.tags.insert(key.to_string(), value.to_string());
        })
    }

    async fn end_run(&self, run_id: &str, status: RunStatus) -> RubricResult<()> {
        self.with_run(run_id, |run| {
            run.status = Some(status);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_params_and_metrics() {
        let tracker = InMemoryTracker::new();
        let run_id = tracker.start_run("v1/c1").await.unwrap();

        tracker.log_param(&run_id, "variant_id", "v1").await.unwrap();
        tracker.log_param(&run_id, "case_id", "c1").await.unwrap();
        tracker
            .log_metrics(
                &run_id,
                &[Metric::new("clarity", 4.0), Metric::new("aggregate_score", 4.5)],
            )
            .await
            .unwrap();
        tracker.end_run(&run_id, RunStatus::Finished).await.unwrap();

        let run = tracker.get_run(&run_id).unwrap();
        assert_eq!(run.run_name, "v1/c1");
        assert_eq!(run.params["variant_id"], "v1");
        assert_eq!(run.params["case_id"], "c1");
        assert_eq!(run.metrics["clarity"], 4.0);
        assert_eq!(run.metrics["aggregate_score"], 4.5);
        assert_eq!(run.status, Some(RunStatus::Finished));
    }

    #[tokio::test]
    async fn test_unknown_run_is_logging_error() {
        let tracker = InMemoryTracker::new();
        let err = tracker.log_param("nope", "k", "v").await.unwrap_err();
        assert_eq!(err.code(), "logging");
    }
}
