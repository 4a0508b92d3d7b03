//! Result report output
//!
//! After the loop, every pair outcome plus a per-variant summary is
//! written as one YAML document so results survive locally even when the
//! tracking server is the system of record.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RubricError, RubricResult};
use crate::runner::RunReport;

/// File name the report is written under
pub const REPORT_FILE: &str = "results.yaml";

/// Summary block at the top of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_pairs: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Mean aggregate score per variant over successful pairs, sorted by id
    pub mean_aggregate_by_variant: BTreeMap<String, f64>,
}

/// The serialized report document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDoc {
    pub summary: ReportSummary,
    #[serde(flatten)]
    pub report: RunReport,
}

/// Build the report document for a finished evaluation
pub fn build_report(report: &RunReport) -> ReportDoc {
    ReportDoc {
        summary: ReportSummary {
            total_pairs: report.outcomes.len(),
            succeeded: report.succeeded(),
            failed: report.failed(),
            mean_aggregate_by_variant: report
                .mean_aggregate_by_variant()
                .into_iter()
                .collect(),
        },
        report: report.clone(),
    }
}

/// Serialize the report to YAML
pub fn to_yaml(report: &RunReport) -> RubricResult<String> {
    serde_yaml::to_string(&build_report(report))
        .map_err(|e| RubricError::Json {
            message: format!("failed to serialize report: {}", e),
        })
}

/// Write `results.yaml` into the given output directory
pub fn write_report(report: &RunReport, output_dir: impl AsRef<Path>) -> RubricResult<()> {
    let output_dir = output_dir.as_ref();
    std::fs::create_dir_all(output_dir).map_err(|e| {
        RubricError::io_at(
            format!("failed to create output directory: {}", e),
            output_dir.display().to_string(),
        )
    })?;
    let path = output_dir.join(REPORT_FILE);
    let yaml = to_yaml(report)?;
    std::fs::write(&path, yaml).map_err(|e| {
        RubricError::io_at(
            format!("failed to write report: {}", e),
            path.display().to_string(),
        )
    })?;
    tracing::info!("wrote report to {}", path.display());
    Ok(())
}
