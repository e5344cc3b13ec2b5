// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt template rendering (spec §4.1 step 2).
//!
//! Literal `{{key}}` substitution only — no conditionals or loops, that's
//! out of scope (spec §9 Open Questions: rendered prompt content itself is
//! opaque to the core). The only thing this module guarantees is the
//! replacement rule and the unresolved-variable rejection.

use af_core::Role;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt template has an unresolved variable")]
    UnresolvedVariable,
}

/// Minimal built-in templates so the crate is self-contained; overridable
/// via `prompt_dir` at the daemon layer (SPEC_FULL §5).
pub fn builtin_template(role: Role) -> &'static str {
    match role {
        Role::Worker => "You are an autonomous worker agent. Complete task {{task_id}}.",
        Role::Planner => "You are a planning agent. Break task {{task_id}} into subtasks.",
        Role::Spawn => "{{task_id}}",
    }
}

/// Render `template`, substituting every `{{key}}` found in `vars`. Any
/// `{{` remaining in the output — whether because a variable was unknown
/// or because the substituted value itself introduced one — is rejected
/// (spec §4.1 step 2).
pub fn render(template: &str, vars: &HashMap<&str, &str>) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        match after_open.find("}}") {
            Some(end) => {
                let key = after_open[..end].trim();
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => return Err(PromptError::UnresolvedVariable),
                }
                rest = &after_open[end + 2..];
            }
            None => return Err(PromptError::UnresolvedVariable),
        }
    }
    out.push_str(rest);

    if out.contains("{{") {
        return Err(PromptError::UnresolvedVariable);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
