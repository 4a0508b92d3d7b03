//! LLM-as-judge scoring
//!
//! A second model call scores generated output against the configured
//! criteria. The judge builds a rubric prompt, sends it through the same
//! `ChatClient` seam the generator uses, and parses the structured reply.

mod response;
mod rubric;

pub use response::{parse_judge_response, CriterionScore};
pub use rubric::{build_judge_prompt, JSON_ONLY_SYSTEM};

use crate::config::EvaluationSettings;
use crate::error::RubricResult;
use crate::llm::{ChatClient, ChatMessage, TokenUsage};

/// Judge one generated output against the configured criteria.
///
/// Returns the per-criterion scores and the judge call's token usage.
pub async fn judge_output(
    client: &dyn ChatClient,
    settings: &EvaluationSettings,
    rendered_prompt: &str,
    generated: &str,
    expected: Option<&str>,
) -> RubricResult<(Vec<CriterionScore>, Option<TokenUsage>)> {
    let prompt = build_judge_prompt(
        &settings.criteria,
        &settings.scale,
        rendered_prompt,
        generated,
        expected,
    );
    let messages = [
        ChatMessage::system(JSON_ONLY_SYSTEM),
        ChatMessage::user(prompt),
    ];

    let response = client.chat(&messages, &settings.judge).await?;
    let scores = parse_judge_response(&response.content, &settings.criteria, &settings.scale)?;

    Ok((scores, response.usage))
}
