//! Judge prompt construction
//!
//! Builds the rubric prompt the judge model receives: the configured
//! criteria, the score scale, the original prompt, the generated output,
//! and an instruction to reply with JSON only.

use crate::config::{EvaluationCriterion, ScoreScale};

/// System instruction forcing structured output from the judge model
pub const JSON_ONLY_SYSTEM: &str = "You are a strict evaluation judge. \
    You MUST respond with a single valid JSON object and nothing else. \
    Do NOT use markdown code fences. \
    Do NOT include any text outside the JSON object.";

/// Build the judge's user prompt for one generated output
pub fn build_judge_prompt(
    criteria: &[EvaluationCriterion],
    scale: &ScoreScale,
    rendered_prompt: &str,
    generated: &str,
    expected: Option<&str>,
) -> String {
    let mut prompt = String::new();

    prompt.push_str("Evaluate the assistant output below against each criterion.\n\n");
    prompt.push_str("Criteria:\n");
    for criterion in criteria {
        prompt.push_str(&format!("- {}: {}\n", criterion.name, criterion.description));
    }

    prompt.push_str(&format!(
        "\nScore each criterion from {} (worst) to {} (best).\n",
        scale.min, scale.max
    ));

    prompt.push_str("\nRespond with exactly this JSON shape, one key per criterion:\n{\n");
    for (i, criterion) in criteria.iter().enumerate() {
        prompt.push_str(&format!(
            "  \"{}\": {{\"score\": <number>, \"explanation\": \"<one sentence>\"}}{}\n",
            criterion.name,
            if i + 1 < criteria.len() { "," } else { "" }
        ));
    }
    prompt.push_str("}\n");

    prompt.push_str(&format!("\nOriginal prompt:\n{}\n", rendered_prompt));
    if let Some(expected) = expected {
        prompt.push_str(&format!("\nReference for a good answer:\n{}\n", expected));
    }
    prompt.push_str(&format!("\nAssistant output to evaluate:\n{}\n", generated));

    prompt
}
