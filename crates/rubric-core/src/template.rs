//! Prompt template rendering
//!
//! Templates use `{name}` placeholders with `{{` and `}}` escaping to
//! literal braces, matching the substitution style the prompt files were
//! written for. Rendering is a pure function: a missing variable fails
//! with a render error and no partial output.

use std::collections::HashMap;

use crate::error::{RubricError, RubricResult};

/// Substitute every `{name}` placeholder in `template` from `variables`.
///
/// Returns an error when a placeholder has no matching variable or the
/// template has unbalanced braces. Unused variables are fine.
pub fn render(template: &str, variables: &HashMap<String, String>) -> RubricResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(RubricError::render(format!(
                                "unterminated placeholder '{{{}' in template",
                                name
                            )));
                        }
                    }
                }
                let value = variables
                    .get(name.trim())
                    .ok_or_else(|| RubricError::render_missing(name.trim()))?;
                out.push_str(value);
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(RubricError::render("unmatched '}' in template"));
                }
            }
            _ => out.push(ch),
        }
    }

    Ok(out)
}

/// List the placeholder names a template references, in order of appearance
pub fn placeholders(template: &str) -> RubricResult<Vec<String>> {
    let mut names = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(RubricError::render(format!(
                                "unterminated placeholder '{{{}' in template",
                                name
                            )));
                        }
                    }
                }
                let name = name.trim().to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                } else {
                    return Err(RubricError::render("unmatched '}' in template"));
                }
            }
            _ => {}
        }
    }

    Ok(names)
}
