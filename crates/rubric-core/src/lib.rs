//! Core library for the rubric prompt evaluation harness
//!
//! The harness loads four YAML documents (prompt variants, system prompts,
//! evaluation settings, test data), renders each variant against each test
//! case, sends the rendered prompt to a chat-completion API, scores the
//! output with an LLM judge, and records every pair as a run in an
//! MLflow-compatible experiment tracker.
//!
//! Modules, in dependency order:
//! - [`config`]: typed config model and YAML loading
//! - [`template`]: `{name}` placeholder rendering
//! - [`llm`]: chat-completion client behind the [`llm::ChatClient`] seam
//! - [`judge`]: rubric prompt building and structured score parsing
//! - [`tracking`]: experiment run tracking behind [`tracking::RunTracker`]
//! - [`runner`]: the sequential variant × case evaluation loop
//! - [`report`]: local YAML result report

pub mod config;
pub mod error;
pub mod judge;
pub mod llm;
pub mod report;
pub mod runner;
pub mod secrets;
pub mod template;
pub mod tracking;

pub use error::{RubricError, RubricResult};
