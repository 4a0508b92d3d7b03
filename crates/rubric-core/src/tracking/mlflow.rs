//! MLflow REST tracking client
//!
//! Speaks the MLflow REST API 2.0: experiments are resolved by name (and
//! created on first use), runs are created under the experiment, then
//! params/metrics/tags are logged and the run is closed. Any failure
//! surfaces as a logging error; the computed result itself is unaffected.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};

use super::{Metric, RunStatus, RunTracker};
use crate::config::TrackingSettings;
use crate::error::{RubricError, RubricResult};

/// Environment variable overriding the configured tracking server URL
pub const TRACKING_URI_VAR: &str = "MLFLOW_TRACKING_URI";

/// Client for an MLflow-compatible tracking server
pub struct MlflowTracker {
    base_url: String,
    experiment_id: String,
    http_client: Client,
}

impl MlflowTracker {
    /// Connect to the tracking server and resolve the experiment id,
    /// creating the experiment if it does not exist yet.
    pub async fn connect(settings: &TrackingSettings) -> RubricResult<Self> {
        let base_url = std::env::var(TRACKING_URI_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| settings.tracking_uri.clone());
        let base_url = base_url.trim_end_matches('/').to_string();
        let http_client = Client::new();

        let experiment_id =
            resolve_experiment(&http_client, &base_url, &settings.experiment_name).await?;

        tracing::debug!(
            experiment = %settings.experiment_name,
            experiment_id = %experiment_id,
            "connected to tracking server {}",
            base_url
        );

        Ok(Self {
            base_url,
            experiment_id,
            http_client,
        })
    }

    async fn post(&self, endpoint: &str, body: Value) -> RubricResult<Value> {
        post_json(&self.http_client, &self.base_url, endpoint, body).await
    }
}

/// POST a JSON body to an MLflow endpoint and parse the JSON reply
async fn post_json(
    client: &Client,
    base_url: &str,
    endpoint: &str,
    body: Value,
) -> RubricResult<Value> {
    let url = format!("{}/api/2.0/mlflow/{}", base_url, endpoint);
    let response = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| RubricError::logging(format!("{} request failed: {}", endpoint, e)))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(RubricError::logging(format!(
            "{} failed (status {}): {}",
            endpoint, status, error_text
        )));
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let text = response
        .text()
        .await
        .map_err(|e| RubricError::logging(format!("{} response read failed: {}", endpoint, e)))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text)
        .map_err(|e| RubricError::logging(format!("{} returned invalid JSON: {}", endpoint, e)))
}

/// Look up an experiment by name, creating it when absent
async fn resolve_experiment(
    client: &Client,
    base_url: &str,
    name: &str,
) -> RubricResult<String> {
    let url = format!("{}/api/2.0/mlflow/experiments/get-by-name", base_url);
    let response = client
        .get(&url)
        .query(&[("experiment_name", name)])
        .send()
        .await
        .map_err(|e| RubricError::logging(format!("experiment lookup failed: {}", e)))?;

    if response.status().is_success() {
        let body: Value = response
            .json()
            .await
            .map_err(|e| RubricError::logging(format!("experiment lookup parse failed: {}", e)))?;
        if let Some(id) = body["experiment"]["experiment_id"].as_str() {
            return Ok(id.to_string());
        }
    }

    let created = post_json(client, base_url, "experiments/create", json!({ "name": name }))
        .await?;
    created["experiment_id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| RubricError::logging("experiment create returned no experiment_id"))
}

#[async_trait]
impl RunTracker for MlflowTracker {
    async fn start_run(&self, run_name: &str) -> RubricResult<String> {
        let body = json!({
            "experiment_id": self.experiment_id,
            "run_name": run_name,
            "start_time": Utc::now().timestamp_millis(),
        });
        let response = self.post("runs/create", body).await?;
        response["run"]["info"]["run_id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| RubricError::logging("runs/create returned no run_id"))
    }

    async fn log_param(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()> {
        let body = json!({ "run_id": run_id, "key": key, "value": value });
        self.post("runs/log-parameter", body)
            .await
            .map_err(|e| with_run_id(e, run_id))?;
        Ok(())
    }

    async fn log_metrics(&self, run_id: &str, metrics: &[Metric]) -> RubricResult<()> {
        let timestamp = Utc::now().timestamp_millis();
        let entries: Vec<Value> = metrics
            .iter()
            .map(|m| json!({ "key": m.key, "value": m.value, "timestamp": timestamp, "step": 0 }))
            .collect();
        let body = json!({ "run_id": run_id, "metrics": entries });
        self.post("runs/log-batch", body)
            .await
            .map_err(|e| with_run_id(e, run_id))?;
        Ok(())
    }

    async fn set_tag(&self, run_id: &str, key: &str, value: &str) -> RubricResult<()> {
        let body = json!({ "run_id": run_id, "key": key, "value": value });
        self.post("runs/set-tag", body)
            .await
            .map_err(|e| with_run_id(e, run_id))?;
        Ok(())
    }

    async fn end_run(&self, run_id: &str, status: RunStatus) -> RubricResult<()> {
        let body = json!({
            "run_id": run_id,
            "status": status.as_str(),
            "end_time": Utc::now().timestamp_millis(),
        });
        self.post("runs/update", body)
            .await
            .map_err(|e| with_run_id(e, run_id))?;
        Ok(())
    }
}

fn with_run_id(err: RubricError, run_id: &str) -> RubricError {
    match err {
        RubricError::Logging { message, .. } => RubricError::logging_for_run(message, run_id),
        other => other,
    }
}
