//! Command-line arguments
//!
//! The argument surface is deliberately minimal: everything behavioral
//! lives in the YAML config files. The only argument is where to find
//! them.

use std::path::PathBuf;

use clap::Parser;

/// YAML-configured prompt evaluation with an LLM judge
#[derive(Debug, Parser)]
#[command(name = "rubric", version, about)]
pub struct Cli {
    /// Directory holding prompts.yaml, system_prompts.yaml,
    /// evaluation.yaml and test_data.yaml
    #[arg(default_value = "config")]
    pub config_dir: PathBuf,
}
